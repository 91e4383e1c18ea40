//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area of the game.
//! Use cases orchestrate repositories, the room store and the LLM.

pub mod account;
pub mod bestiary;
pub mod chat;
pub mod inventory;
pub mod location_events;
pub mod map;
pub mod profile;
pub mod rooms;
pub mod shop;

// Re-export main types
pub use account::{AccountError, AccountUseCases};
pub use bestiary::{BestiaryError, BestiaryOps};
pub use chat::{ChatError, ChatUseCases};
pub use inventory::{InventoryError, InventoryOps, InventoryUseCases};
pub use location_events::{EventError, EventHistoryOps, TriggerEvent};
pub use map::{MapError, MapOps};
pub use profile::{ProfileError, ProfileOps};
pub use rooms::RoomUseCases;
pub use shop::{ShopError, ShopOps};
