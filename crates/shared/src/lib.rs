//! Emberhall wire format - request bodies and response DTOs for the HTTP API.
//!
//! Every response is a JSON object carrying a `success` flag. Successful
//! payloads are flattened next to it; failures carry `error` and `code`.
//!
//! # Design Principles
//!
//! 1. **No business logic** - Pure data types and conversions from domain values
//! 2. **Flat JSON** - Field names match what browser clients already read
//! 3. **Unix seconds** - All timestamps cross the wire as `f64` epoch seconds

pub mod player;
pub mod requests;
pub mod responses;
pub mod rooms;
pub mod time;
pub mod world;

pub use player::{ChatTurnDto, EquippedItemDto, InventoryItemDto, ProfileDto, StatsDto};
pub use requests::*;
pub use responses::{ApiResponse, ErrorBody, ErrorCode};
pub use rooms::{RoomInfoDto, RoomMessageDto, RoomSummaryDto, RoomUserDto};
pub use time::{from_epoch_secs, to_epoch_secs};
pub use world::{CreatureDto, EventTriggerDto, LocationDto, PersonaDto, ShopDto, ShopItemDto};
