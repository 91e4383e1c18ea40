//! In-memory state storage modules.
//!
//! Stores manage runtime state that doesn't belong in the database:
//! - `RoomManager` - multiplayer rooms and their message logs

pub mod rooms;

pub use rooms::{RoomError, RoomManager, VisibleMessages};
