//! Request bodies and query strings accepted by the HTTP API.

use serde::{Deserialize, Serialize};

use emberhall_domain::StatsPatch;

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Narrator chat
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Persona name; the default narrator when absent.
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub regenerate: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterRequest {
    #[serde(default)]
    pub character: Option<String>,
}

// =============================================================================
// Profile, items and equipment
// =============================================================================

/// Body of `/update_user_stats`; every field is optional.
pub type UpdateStatsRequest = StatsPatch;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchItemsRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub rarity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemQuantityRequest {
    #[serde(default)]
    pub item_id: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipRequest {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub slot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnequipRequest {
    #[serde(default)]
    pub slot: String,
}

// =============================================================================
// Rooms
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomIdRequest {
    #[serde(default)]
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRoomMessageRequest {
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub content: String,
    /// `private`, `global` or `interaction`; `private` when absent.
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub target_user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerNarratorRequest {
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub interaction_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMessagesRequest {
    #[serde(default)]
    pub room_id: String,
    /// Unix seconds; only newer messages are returned.
    #[serde(default)]
    pub since_timestamp: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetHostModeRequest {
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub host_mode: String,
}

// =============================================================================
// Map, events and shops
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaQuery {
    #[serde(default)]
    pub area: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationQuery {
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEventRequest {
    #[serde(default)]
    pub event_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopQuery {
    #[serde(default)]
    pub shop_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventHistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

// =============================================================================
// Creatures and skills
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreaturesQuery {
    /// Empty lists every quality tier.
    #[serde(default)]
    pub quality: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatureQuery {
    #[serde(default)]
    pub creature_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillQuery {
    #[serde(default)]
    pub skill_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub shop_id: String,
    #[serde(default)]
    pub item_id: String,
}
