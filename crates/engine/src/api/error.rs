//! HTTP error mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};

use emberhall_shared::{ErrorBody, ErrorCode};

use crate::infrastructure::ports::RepoError;
use crate::stores::RoomError;
use crate::use_cases::{
    AccountError, BestiaryError, ChatError, EventError, InventoryError, MapError, ProfileError,
    ShopError,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// The narrator backend failed.
    Upstream(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Conflict, msg),
            ApiError::Upstream(detail) => {
                tracing::warn!(error = %detail, "Narrator backend error");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorCode::UpstreamError,
                    "The narrator is unavailable, please try again".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(_) => ApiError::BadRequest(e.to_string()),
            AccountError::UsernameTaken => ApiError::Conflict(e.to_string()),
            AccountError::UnknownUser
            | AccountError::WrongPassword
            | AccountError::InvalidSession => ApiError::Unauthorized(e.to_string()),
            AccountError::Repo(e) => e.into(),
        }
    }
}

impl From<MapError> for ApiError {
    fn from(e: MapError) -> Self {
        match e {
            MapError::LocationNotFound(_) => ApiError::NotFound(e.to_string()),
            MapError::Inaccessible(_) => ApiError::BadRequest(e.to_string()),
            MapError::Repo(e) => e.into(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::EmptyMessage => ApiError::BadRequest(e.to_string()),
            ChatError::Llm(e) => ApiError::Upstream(e.to_string()),
            ChatError::Map(e) => e.into(),
            ChatError::Repo(e) => e.into(),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::Repo(e) => e.into(),
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::ItemNotFound(_) => ApiError::NotFound(e.to_string()),
            InventoryError::InvalidQuantity
            | InventoryError::QuantityTooLarge { .. }
            | InventoryError::NotEnoughItems { .. }
            | InventoryError::WrongSlot { .. }
            | InventoryError::SlotEmpty(_)
            | InventoryError::Validation(_) => ApiError::BadRequest(e.to_string()),
            InventoryError::Repo(e) => e.into(),
        }
    }
}

impl From<BestiaryError> for ApiError {
    fn from(e: BestiaryError) -> Self {
        match e {
            BestiaryError::CreatureNotFound(_) | BestiaryError::SkillNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
        }
    }
}

impl From<ShopError> for ApiError {
    fn from(e: ShopError) -> Self {
        match e {
            ShopError::NoShopHere
            | ShopError::ShopNotFound(_)
            | ShopError::ListingNotFound { .. } => ApiError::NotFound(e.to_string()),
            ShopError::OutOfStock => ApiError::Conflict(e.to_string()),
            ShopError::InsufficientGold { .. } => ApiError::BadRequest(e.to_string()),
            ShopError::Map(e) => e.into(),
            ShopError::Repo(e) => e.into(),
        }
    }
}

impl From<EventError> for ApiError {
    fn from(e: EventError) -> Self {
        match e {
            EventError::EventNotFound(_) => ApiError::NotFound(e.to_string()),
            EventError::WrongLocation { .. } => ApiError::BadRequest(e.to_string()),
            // Malformed event data is a world-file problem, not the caller's.
            EventError::InvalidData(_) => ApiError::Internal(e.to_string()),
            EventError::Map(e) => e.into(),
            EventError::Repo(e) => e.into(),
        }
    }
}

impl From<RoomError> for ApiError {
    fn from(e: RoomError) -> Self {
        match e {
            RoomError::RoomNotFound(_) => ApiError::NotFound(e.to_string()),
            RoomError::RoomFull(_) => ApiError::Conflict(e.to_string()),
            RoomError::NotMember { .. } | RoomError::NotHost => ApiError::Forbidden(e.to_string()),
            RoomError::EmptyContent => ApiError::BadRequest(e.to_string()),
        }
    }
}
