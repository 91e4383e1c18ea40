//! Multiplayer rooms: members, the bounded message log and host mode.
//!
//! A room's host mode follows the last message appended:
//! an interaction switches the room to global narration, a private
//! message from a player switches it back. Messages from [`SYSTEM_SENDER`]
//! never change the mode.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{MessageId, RoomId};

/// Maximum number of messages a room keeps; older ones are evicted first.
pub const MAX_ROOM_MESSAGES: usize = 100;

/// Default seat count for a new room.
pub const DEFAULT_MAX_USERS: usize = 10;

/// Sender name for server notices. May post without membership.
pub const SYSTEM_SENDER: &str = "System";

/// Sender name for the game master voice. May post without membership.
pub const NARRATOR_SENDER: &str = "Narrator";

/// A member counts as online if active within this many seconds.
pub const ONLINE_WINDOW_SECS: i64 = 30;

/// A room whose members have all been idle longer than this is reclaimed.
pub const IDLE_TIMEOUT_SECS: i64 = 300;

/// Returns true for senders that can post to any room.
pub fn is_reserved_sender(sender: &str) -> bool {
    sender == SYSTEM_SENDER || sender == NARRATOR_SENDER
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Visible to the sender and the target only.
    Private,
    /// Visible to everyone in the room.
    Global,
    /// Player action addressed to the narrator; visible to everyone.
    Interaction,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Global => "global",
            Self::Interaction => "interaction",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "global" => Ok(Self::Global),
            "interaction" => Ok(Self::Interaction),
            other => Err(DomainError::parse(format!("Unknown message type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostMode {
    #[default]
    Private,
    Global,
}

impl HostMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for HostMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "global" => Ok(Self::Global),
            other => Err(DomainError::parse(format!("Unknown host mode: {other}"))),
        }
    }
}

/// An immutable entry in a room's message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMessage {
    pub id: MessageId,
    pub sender: String,
    pub content: String,
    pub message_type: MessageType,
    pub target_user: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RoomMessage {
    pub fn new(
        sender: impl Into<String>,
        content: impl Into<String>,
        message_type: MessageType,
        target_user: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            sender: sender.into(),
            content: content.into(),
            message_type,
            target_user,
            timestamp,
        }
    }

    /// Whether `username` may read this message.
    pub fn is_visible_to(&self, username: &str) -> bool {
        match self.message_type {
            MessageType::Global | MessageType::Interaction => true,
            MessageType::Private => {
                self.sender == username || self.target_user.as_deref() == Some(username)
            }
        }
    }
}

/// A joined member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUser {
    pub username: String,
    pub session_token: String,
    pub joined_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_host: bool,
}

impl RoomUser {
    pub fn is_online(&self, now: DateTime<Utc>) -> bool {
        now - self.last_activity < Duration::seconds(ONLINE_WINDOW_SECS)
    }

    pub fn is_idle(&self, now: DateTime<Utc>) -> bool {
        now - self.last_activity > Duration::seconds(IDLE_TIMEOUT_SECS)
    }
}

/// A chat room with a bounded log and a two-valued host mode.
#[derive(Debug, Clone)]
pub struct GameRoom {
    id: RoomId,
    host: String,
    host_mode: HostMode,
    max_users: usize,
    created_at: DateTime<Utc>,
    messages: VecDeque<RoomMessage>,
    // join order; at most one entry per username
    users: Vec<RoomUser>,
}

impl GameRoom {
    pub fn new(id: RoomId, host: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            host: host.into(),
            host_mode: HostMode::Private,
            max_users: DEFAULT_MAX_USERS,
            created_at,
            messages: VecDeque::new(),
            users: Vec::new(),
        }
    }

    pub fn with_max_users(mut self, max_users: usize) -> Self {
        self.max_users = max_users;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn host_mode(&self) -> HostMode {
        self.host_mode
    }

    pub fn max_users(&self) -> usize {
        self.max_users
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn users(&self) -> &[RoomUser] {
        &self.users
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn messages(&self) -> impl Iterator<Item = &RoomMessage> {
        self.messages.iter()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.users.len() >= self.max_users
    }

    pub fn contains_user(&self, username: &str) -> bool {
        self.users.iter().any(|u| u.username == username)
    }

    pub fn is_host(&self, username: &str) -> bool {
        self.host == username
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Add a member, or refresh the token and activity of an existing one.
    ///
    /// The only failure is a full room when `username` is not yet a member.
    pub fn add_user(
        &mut self,
        username: &str,
        session_token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if let Some(existing) = self.users.iter_mut().find(|u| u.username == username) {
            existing.session_token = session_token.to_string();
            existing.last_activity = now;
            return Ok(());
        }

        if self.is_full() {
            return Err(DomainError::constraint(format!(
                "Room {} is full ({}/{})",
                self.id,
                self.users.len(),
                self.max_users
            )));
        }

        self.users.push(RoomUser {
            username: username.to_string(),
            session_token: session_token.to_string(),
            joined_at: now,
            last_activity: now,
            is_host: self.is_host(username),
        });
        Ok(())
    }

    /// Remove a member. Returns false if they were not in the room.
    pub fn remove_user(&mut self, username: &str) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.username != username);
        self.users.len() != before
    }

    /// Record activity for a member. Returns false for non-members.
    pub fn touch(&mut self, username: &str, now: DateTime<Utc>) -> bool {
        match self.users.iter_mut().find(|u| u.username == username) {
            Some(user) => {
                user.last_activity = now;
                true
            }
            None => false,
        }
    }

    /// Empty rooms and rooms where every member is past the idle timeout.
    pub fn is_idle(&self, now: DateTime<Utc>) -> bool {
        self.users.iter().all(|u| u.is_idle(now))
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Append a message, evict beyond [`MAX_ROOM_MESSAGES`] and update host mode.
    pub fn add_message(&mut self, message: RoomMessage) {
        match message.message_type {
            MessageType::Interaction => self.host_mode = HostMode::Global,
            MessageType::Private if message.sender != SYSTEM_SENDER => {
                self.host_mode = HostMode::Private
            }
            _ => {}
        }

        self.messages.push_back(message);
        while self.messages.len() > MAX_ROOM_MESSAGES {
            self.messages.pop_front();
        }
    }

    /// Messages newer than `since` that `username` may read, oldest first.
    pub fn visible_to(&self, username: &str, since: Option<DateTime<Utc>>) -> Vec<RoomMessage> {
        self.messages
            .iter()
            .filter(|m| since.map_or(true, |s| m.timestamp > s))
            .filter(|m| m.is_visible_to(username))
            .cloned()
            .collect()
    }

    /// Manual override of the host mode.
    pub fn set_host_mode(&mut self, mode: HostMode) {
        self.host_mode = mode;
    }
}
