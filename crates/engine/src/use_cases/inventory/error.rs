//! Inventory operation errors.

use emberhall_domain::{DomainError, EquipmentSlot};

use crate::infrastructure::ports::RepoError;

/// Errors that can occur during inventory operations.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Cannot use {quantity} at once")]
    QuantityTooLarge { quantity: i64 },
    #[error("Not enough {item_id}: have {held}, need {requested}")]
    NotEnoughItems {
        item_id: String,
        held: i64,
        requested: i64,
    },
    #[error("{item_name} goes in the {expected} slot, not {requested}")]
    WrongSlot {
        item_name: String,
        expected: EquipmentSlot,
        requested: EquipmentSlot,
    },
    #[error("Nothing is equipped in the {0} slot")]
    SlotEmpty(EquipmentSlot),
    #[error("{0}")]
    Validation(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
