//! Response envelope and the payloads of the simpler endpoints.

use serde::{Deserialize, Serialize};

use emberhall_domain::{ItemDef, SkillDef};

use crate::player::{ChatTurnDto, ProfileDto};
use crate::rooms::{RoomInfoDto, RoomMessageDto, RoomSummaryDto};
use crate::world::{CreatureDto, EventTriggerDto, LocationDto, PersonaDto, ShopDto, ShopItemDto};

// =============================================================================
// Envelope
// =============================================================================

/// Successful response: `{"success": true, ...data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failed response: `{"success": false, "error": "...", "code": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: ErrorCode,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
        }
    }
}

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Client Errors (4xx) ===
    /// Request was malformed or invalid
    BadRequest,
    /// Authentication required or failed
    Unauthorized,
    /// User lacks permission for this operation
    Forbidden,
    /// Requested resource not found
    NotFound,
    /// Operation conflicts with current state
    Conflict,

    // === Server Errors (5xx) ===
    /// Internal server error
    InternalError,
    /// Upstream LLM failed
    UpstreamError,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Generic payloads
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub session_token: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub username: String,
}

// =============================================================================
// Narrator chat
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub character: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub character: String,
    pub messages: Vec<ChatTurnDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonasResponse {
    pub characters: Vec<PersonaDto>,
}

// =============================================================================
// Profile and items
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDataResponse {
    pub user: ProfileDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: ProfileDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub items: Vec<ItemDef>,
}

// =============================================================================
// Rooms
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreatedResponse {
    pub message: String,
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomSummaryDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfoResponse {
    pub room_info: RoomInfoDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSentResponse {
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarratorResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMessagesResponse {
    pub messages: Vec<RoomMessageDto>,
    pub room_info: RoomInfoDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostModeResponse {
    pub message: String,
    pub host_mode: String,
}

// =============================================================================
// Map and shops
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub location: LocationDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaLocationsResponse {
    pub area_id: String,
    pub locations: Vec<LocationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    pub message: String,
    pub location: LocationDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopResponse {
    pub shop: ShopDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItemsResponse {
    pub shop_id: String,
    pub items: Vec<ShopItemDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub message: String,
    pub item_id: String,
    pub gold_remaining: i64,
}

// =============================================================================
// Location events
// =============================================================================

/// Result of `/trigger_event`. `details` is flattened next to the base fields.
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub message: String,
    pub event_type: String,
    pub event_id: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventHistoryResponse {
    pub history: Vec<EventTriggerDto>,
}

// =============================================================================
// Creatures and skills
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreaturesResponse {
    pub creatures: Vec<CreatureDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureResponse {
    pub creature: CreatureDto,
    /// The creature's skills resolved from the skills catalog.
    pub skill_objects: Vec<SkillDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsResponse {
    pub skills: Vec<SkillDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillResponse {
    pub skill: SkillDef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_flattens_payload() {
        let json = serde_json::to_value(ApiResponse::ok(MessageResponse::new("hi")))
            .expect("serialize");
        assert_eq!(json, serde_json::json!({"success": true, "message": "hi"}));
    }

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_value(ErrorBody::new(ErrorCode::NotFound, "Room not found"))
            .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "Room not found", "code": "not_found"})
        );
    }
}
