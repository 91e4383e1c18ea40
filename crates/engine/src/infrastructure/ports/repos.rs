//! Repository port traits for database access.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use emberhall_domain::{
    ChatTurn, EquipmentSlot, EventTrigger, InventoryEntry, PlayerLocation, PlayerStats, Session,
    UserAccount,
};

use super::error::RepoError;

// =============================================================================
// Accounts
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `ConstraintViolation` if the username is taken.
    async fn create(&self, account: &UserAccount) -> Result<(), RepoError>;
    async fn get(&self, username: &str) -> Result<Option<UserAccount>, RepoError>;
    async fn record_login(&self, username: &str, at: DateTime<Utc>) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn save(&self, session: &Session) -> Result<(), RepoError>;
    async fn get(&self, token: &str) -> Result<Option<Session>, RepoError>;
    async fn delete(&self, token: &str) -> Result<(), RepoError>;
}

// =============================================================================
// Narrator chat
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatHistoryRepo: Send + Sync {
    /// The newest `limit` turns, oldest first.
    async fn recent(
        &self,
        username: &str,
        persona: &str,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, RepoError>;
    async fn append(&self, username: &str, persona: &str, turn: &ChatTurn)
        -> Result<(), RepoError>;
    /// Delete the newest turn if it is an assistant reply. Returns whether one was removed.
    async fn delete_last_assistant(&self, username: &str, persona: &str)
        -> Result<bool, RepoError>;
    async fn clear(&self, username: &str, persona: &str) -> Result<(), RepoError>;
}

// =============================================================================
// Player state
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerRepo: Send + Sync {
    /// Create stats and location rows if absent; existing rows are untouched.
    async fn init_player(
        &self,
        username: &str,
        stats: &PlayerStats,
        location: &PlayerLocation,
    ) -> Result<(), RepoError>;

    async fn get_stats(&self, username: &str) -> Result<Option<PlayerStats>, RepoError>;
    async fn save_stats(&self, username: &str, stats: &PlayerStats) -> Result<(), RepoError>;

    async fn get_inventory(&self, username: &str) -> Result<Vec<InventoryEntry>, RepoError>;
    async fn item_quantity(&self, username: &str, item_id: &str) -> Result<i64, RepoError>;
    async fn add_item(&self, username: &str, item_id: &str, quantity: i64)
        -> Result<(), RepoError>;
    /// Fails with `ConstraintViolation` if fewer than `quantity` are held.
    async fn remove_item(
        &self,
        username: &str,
        item_id: &str,
        quantity: i64,
    ) -> Result<(), RepoError>;

    async fn get_equipment(
        &self,
        username: &str,
    ) -> Result<BTreeMap<EquipmentSlot, String>, RepoError>;
    /// Move one unit of `item_id` from the bag into `slot`, returning any
    /// previously equipped item to the bag. Returns the previous item id.
    async fn equip(
        &self,
        username: &str,
        slot: EquipmentSlot,
        item_id: &str,
    ) -> Result<Option<String>, RepoError>;
    /// Empty `slot` and return its item to the bag. Returns the removed item id.
    async fn unequip(&self, username: &str, slot: EquipmentSlot)
        -> Result<Option<String>, RepoError>;

    async fn get_location(&self, username: &str) -> Result<Option<PlayerLocation>, RepoError>;
    async fn set_location(&self, username: &str, location: &PlayerLocation)
        -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventHistoryRepo: Send + Sync {
    async fn record(&self, username: &str, trigger: &EventTrigger) -> Result<(), RepoError>;
    /// The newest `limit` triggers, newest first.
    async fn recent(&self, username: &str, limit: usize) -> Result<Vec<EventTrigger>, RepoError>;
}

// =============================================================================
// Shops
// =============================================================================

/// Result of an attempted purchase. Only `Completed` changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Completed { gold_remaining: i64 },
    OutOfStock,
    InsufficientGold { gold: i64, price: i64 },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShopRepo: Send + Sync {
    /// Insert the initial stock unless a row already exists.
    async fn seed_stock(&self, shop_id: &str, item_id: &str, stock: i64) -> Result<(), RepoError>;
    async fn stock_for_shop(&self, shop_id: &str) -> Result<HashMap<String, i64>, RepoError>;
    /// Deduct gold, decrement limited stock and add one unit to the bag, atomically.
    async fn purchase(
        &self,
        username: &str,
        shop_id: &str,
        item_id: &str,
        price: i64,
    ) -> Result<PurchaseOutcome, RepoError>;
}
