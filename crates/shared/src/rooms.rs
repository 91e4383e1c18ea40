//! Room DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emberhall_domain::{GameRoom, RoomMessage, RoomUser};

use crate::time::to_epoch_secs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMessageDto {
    pub id: String,
    pub sender: String,
    pub content: String,
    pub message_type: String,
    pub target_user: Option<String>,
    pub timestamp: f64,
}

impl From<&RoomMessage> for RoomMessageDto {
    fn from(m: &RoomMessage) -> Self {
        Self {
            id: m.id.to_string(),
            sender: m.sender.clone(),
            content: m.content.clone(),
            message_type: m.message_type.as_str().to_string(),
            target_user: m.target_user.clone(),
            timestamp: to_epoch_secs(m.timestamp),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomUserDto {
    pub username: String,
    pub is_host: bool,
    pub is_online: bool,
    pub joined_at: f64,
    pub last_activity: f64,
}

impl RoomUserDto {
    pub fn new(user: &RoomUser, now: DateTime<Utc>) -> Self {
        Self {
            username: user.username.clone(),
            is_host: user.is_host,
            is_online: user.is_online(now),
            joined_at: to_epoch_secs(user.joined_at),
            last_activity: to_epoch_secs(user.last_activity),
        }
    }
}

/// Full view of a room. Session tokens are never exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfoDto {
    pub room_id: String,
    pub host: String,
    pub host_mode: String,
    pub users: Vec<RoomUserDto>,
    pub user_count: usize,
    pub max_users: usize,
    pub created_at: f64,
}

impl RoomInfoDto {
    pub fn new(room: &GameRoom, now: DateTime<Utc>) -> Self {
        Self {
            room_id: room.id().to_string(),
            host: room.host().to_string(),
            host_mode: room.host_mode().as_str().to_string(),
            users: room.users().iter().map(|u| RoomUserDto::new(u, now)).collect(),
            user_count: room.user_count(),
            max_users: room.max_users(),
            created_at: to_epoch_secs(room.created_at()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub host: String,
    pub user_count: usize,
    pub max_users: usize,
    pub created_at: f64,
}

impl From<&GameRoom> for RoomSummaryDto {
    fn from(room: &GameRoom) -> Self {
        Self {
            room_id: room.id().to_string(),
            host: room.host().to_string(),
            user_count: room.user_count(),
            max_users: room.max_users(),
            created_at: to_epoch_secs(room.created_at()),
        }
    }
}
