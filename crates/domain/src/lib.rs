//! Emberhall domain types.
//!
//! Pure data and rules with no I/O: rooms and their message log,
//! player stats and equipment, items, and the static world catalog.

pub mod account;
pub mod error;
pub mod ids;
pub mod item;
pub mod player;
pub mod room;
pub mod world;

pub use account::{ChatRole, ChatTurn, Credentials, Session, UserAccount};
pub use error::DomainError;
pub use ids::{MessageId, RoomId};
pub use item::{ItemDef, ItemEffect, ItemStats};
pub use player::{
    EffectiveStats, EquipmentSlot, InventoryEntry, PlayerLocation, PlayerProfile, PlayerStats,
    StatsPatch, DEFAULT_AREA, DEFAULT_LOCATION,
};
pub use room::{
    is_reserved_sender, GameRoom, HostMode, MessageType, RoomMessage, RoomUser,
    DEFAULT_MAX_USERS, IDLE_TIMEOUT_SECS, MAX_ROOM_MESSAGES, NARRATOR_SENDER, ONLINE_WINDOW_SECS,
    SYSTEM_SENDER,
};
pub use world::{
    Area, CreatureDef, CreatureSpawn, CreatureStats, Enemy, EventDef,
    EventKind, EventTrigger, FightEvent, GatheringEvent, GoldRange, HealingEvent, LocationDef,
    Persona, RepairEvent, ResearchEvent, ShopDef, ShopEvent, ShopListing, SkillDef,
    TreasureEvent, TreasureItem, WorldCatalog, UNLIMITED_STOCK,
};
