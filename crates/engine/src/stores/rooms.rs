//! Multiplayer room registry.
//!
//! Rooms live only in memory. Every operation takes the lock for its whole
//! read-modify-write so concurrent requests never lose updates.

use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use emberhall_domain::{
    is_reserved_sender, GameRoom, HostMode, MessageType, RoomId, RoomMessage, DEFAULT_MAX_USERS,
};
use emberhall_shared::{RoomInfoDto, RoomSummaryDto};

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),
    #[error("Room {0} is full")]
    RoomFull(RoomId),
    #[error("{username} is not in room {room_id}")]
    NotMember { room_id: RoomId, username: String },
    #[error("Only the host can change the host mode")]
    NotHost,
    #[error("Message content cannot be empty")]
    EmptyContent,
}

/// Messages a member may read plus the room state at the time of the read.
#[derive(Debug, Clone)]
pub struct VisibleMessages {
    pub messages: Vec<RoomMessage>,
    pub info: RoomInfoDto,
}

pub struct RoomManager {
    rooms: RwLock<HashMap<RoomId, GameRoom>>,
    max_users: usize,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::with_max_users(DEFAULT_MAX_USERS)
    }

    pub fn with_max_users(max_users: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            max_users,
        }
    }

    /// Register a new room. The host is not joined here.
    pub async fn create(&self, host: &str, now: DateTime<Utc>) -> RoomId {
        let mut rooms = self.rooms.write().await;
        let room = self.new_room(&rooms, host, now);
        let room_id = room.id().clone();
        rooms.insert(room_id.clone(), room);
        tracing::info!(room_id = %room_id, host, "Room created");
        room_id
    }

    /// Register a new room with its host already seated.
    ///
    /// Runs under one write guard, so cleanup can never see the room empty.
    pub async fn create_with_host(
        &self,
        host: &str,
        session_token: &str,
        now: DateTime<Utc>,
    ) -> Result<RoomId, RoomError> {
        let mut rooms = self.rooms.write().await;
        let mut room = self.new_room(&rooms, host, now);
        let room_id = room.id().clone();
        room.add_user(host, session_token, now)
            .map_err(|_| RoomError::RoomFull(room_id.clone()))?;
        rooms.insert(room_id.clone(), room);
        tracing::info!(room_id = %room_id, host, "Room created, host joined");
        Ok(room_id)
    }

    fn new_room(
        &self,
        rooms: &HashMap<RoomId, GameRoom>,
        host: &str,
        now: DateTime<Utc>,
    ) -> GameRoom {
        let mut room_id = RoomId::from_uuid(Uuid::new_v4());
        while rooms.contains_key(&room_id) {
            room_id = RoomId::from_uuid(Uuid::new_v4());
        }
        GameRoom::new(room_id, host, now).with_max_users(self.max_users)
    }

    pub async fn join(
        &self,
        room_id: &RoomId,
        username: &str,
        session_token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RoomError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        room.add_user(username, session_token, now)
            .map_err(|_| RoomError::RoomFull(room_id.clone()))?;
        tracing::info!(room_id = %room_id, username, users = room.user_count(), "User joined room");
        Ok(())
    }

    /// Remove a member. Returns true if the room was closed because it emptied.
    pub async fn leave(&self, room_id: &RoomId, username: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return false;
        };

        if room.remove_user(username) {
            tracing::info!(room_id = %room_id, username, "User left room");
        }
        if room.is_empty() {
            rooms.remove(room_id);
            tracing::info!(room_id = %room_id, "Room closed, no members left");
            return true;
        }
        false
    }

    pub async fn get(&self, room_id: &RoomId) -> Option<GameRoom> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Summaries of every open room, oldest first.
    pub async fn list(&self) -> Vec<RoomSummaryDto> {
        let rooms = self.rooms.read().await;
        let mut summaries: Vec<_> = rooms.values().map(RoomSummaryDto::from).collect();
        summaries.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
        summaries
    }

    /// Drop rooms with no members or whose members are all idle.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> Vec<RoomId> {
        let mut rooms = self.rooms.write().await;
        let stale: Vec<RoomId> = rooms
            .values()
            .filter(|room| room.is_idle(now))
            .map(|room| room.id().clone())
            .collect();

        for room_id in &stale {
            rooms.remove(room_id);
            tracing::info!(room_id = %room_id, "Removed idle room");
        }
        stale
    }

    /// Append a message. Reserved senders may post without joining.
    pub async fn send_message(
        &self,
        room_id: &RoomId,
        sender: &str,
        content: &str,
        message_type: MessageType,
        target_user: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RoomMessage, RoomError> {
        if content.trim().is_empty() {
            return Err(RoomError::EmptyContent);
        }

        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        if !room.touch(sender, now) && !is_reserved_sender(sender) {
            return Err(RoomError::NotMember {
                room_id: room_id.clone(),
                username: sender.to_string(),
            });
        }

        // Clients echo timestamps back as microsecond floats; store no finer
        // precision or `since` polling would return the last message again.
        let timestamp = now.trunc_subsecs(6);
        let message = RoomMessage::new(sender, content, message_type, target_user, timestamp);
        room.add_message(message.clone());
        tracing::debug!(
            room_id = %room_id,
            sender,
            message_type = %message_type,
            host_mode = %room.host_mode(),
            "Room message added"
        );
        Ok(message)
    }

    /// Messages newer than `since` that `username` may read.
    pub async fn messages_for(
        &self,
        room_id: &RoomId,
        username: &str,
        since: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<VisibleMessages, RoomError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        if !room.touch(username, now) {
            return Err(RoomError::NotMember {
                room_id: room_id.clone(),
                username: username.to_string(),
            });
        }

        Ok(VisibleMessages {
            messages: room.visible_to(username, since),
            info: RoomInfoDto::new(room, now),
        })
    }

    /// Host-only manual override of the host mode.
    pub async fn set_host_mode(
        &self,
        room_id: &RoomId,
        username: &str,
        mode: HostMode,
    ) -> Result<(), RoomError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        if !room.is_host(username) {
            return Err(RoomError::NotHost);
        }
        room.set_host_mode(mode);
        tracing::info!(room_id = %room_id, host_mode = %mode, "Host mode set");
        Ok(())
    }

    pub async fn room_info(
        &self,
        room_id: &RoomId,
        now: DateTime<Utc>,
    ) -> Result<RoomInfoDto, RoomError> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_id)
            .map(|room| RoomInfoDto::new(room, now))
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use emberhall_domain::{IDLE_TIMEOUT_SECS, MAX_ROOM_MESSAGES, NARRATOR_SENDER, SYSTEM_SENDER};
    use emberhall_shared::{from_epoch_secs, RoomMessageDto};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    async fn room_with(manager: &RoomManager, users: &[&str]) -> RoomId {
        let room_id = manager.create(users[0], t0()).await;
        for user in users {
            manager
                .join(&room_id, user, &format!("tok-{user}"), t0())
                .await
                .expect("join");
        }
        room_id
    }

    #[tokio::test]
    async fn create_returns_short_id_without_joining_host() {
        let manager = RoomManager::new();
        let room_id = manager.create("alice", t0()).await;

        assert_eq!(room_id.as_str().len(), 8);
        let room = manager.get(&room_id).await.expect("room exists");
        assert_eq!(room.host(), "alice");
        assert_eq!(room.user_count(), 0);
    }

    #[tokio::test]
    async fn create_with_host_survives_cleanup() {
        let manager = RoomManager::new();

        // Created and joined in two steps, a cleanup in between closes the room.
        let split = manager.create("alice", t0()).await;
        manager.cleanup(t0()).await;
        let err = manager
            .join(&split, "alice", "tok-a", t0())
            .await
            .expect_err("room was reclaimed");
        assert!(matches!(err, RoomError::RoomNotFound(_)));

        let room_id = manager
            .create_with_host("alice", "tok-a", t0())
            .await
            .expect("create");
        assert!(manager.cleanup(t0()).await.is_empty());

        let room = manager.get(&room_id).await.expect("room kept");
        assert_eq!(room.user_count(), 1);
        assert!(room.users()[0].is_host);
    }

    #[tokio::test]
    async fn join_unknown_room_fails() {
        let manager = RoomManager::new();
        let err = manager
            .join(&RoomId::from("nope"), "alice", "tok", t0())
            .await
            .expect_err("missing room");
        assert!(matches!(err, RoomError::RoomNotFound(_)));
    }

    #[tokio::test]
    async fn joining_a_full_room_fails() {
        let manager = RoomManager::with_max_users(2);
        let room_id = room_with(&manager, &["alice", "bob"]).await;

        let err = manager
            .join(&room_id, "carol", "tok", t0())
            .await
            .expect_err("room is full");
        assert!(matches!(err, RoomError::RoomFull(_)));

        // An existing member can still rejoin.
        manager
            .join(&room_id, "bob", "new-token", t0())
            .await
            .expect("rejoin");
        assert_eq!(manager.get(&room_id).await.expect("room").user_count(), 2);
    }

    #[tokio::test]
    async fn leaving_last_member_removes_room() {
        let manager = RoomManager::new();
        let room_id = room_with(&manager, &["alice", "bob"]).await;

        assert!(!manager.leave(&room_id, "alice").await);
        assert!(manager.get(&room_id).await.is_some());

        assert!(manager.leave(&room_id, "bob").await);
        assert!(manager.get(&room_id).await.is_none());
        assert_eq!(manager.room_count().await, 0);
    }

    #[tokio::test]
    async fn leaving_unknown_room_is_a_no_op() {
        let manager = RoomManager::new();
        assert!(!manager.leave(&RoomId::from("ghost"), "alice").await);
    }

    #[tokio::test]
    async fn non_member_cannot_post_but_reserved_senders_can() {
        let manager = RoomManager::new();
        let room_id = room_with(&manager, &["alice"]).await;

        let err = manager
            .send_message(&room_id, "mallory", "hi", MessageType::Global, None, t0())
            .await
            .expect_err("not a member");
        assert!(matches!(err, RoomError::NotMember { .. }));

        manager
            .send_message(&room_id, SYSTEM_SENDER, "welcome", MessageType::Global, None, t0())
            .await
            .expect("system posts");
        manager
            .send_message(&room_id, NARRATOR_SENDER, "a wind blows", MessageType::Global, None, t0())
            .await
            .expect("narrator posts");
    }

    #[tokio::test]
    async fn blank_content_is_rejected() {
        let manager = RoomManager::new();
        let room_id = room_with(&manager, &["alice"]).await;

        let err = manager
            .send_message(&room_id, "alice", "   ", MessageType::Global, None, t0())
            .await
            .expect_err("blank");
        assert!(matches!(err, RoomError::EmptyContent));
    }

    #[tokio::test]
    async fn private_messages_are_visible_only_to_sender_and_target() {
        let manager = RoomManager::new();
        let room_id = room_with(&manager, &["alice", "bob", "carol"]).await;

        manager
            .send_message(
                &room_id,
                "alice",
                "psst",
                MessageType::Private,
                Some("bob".to_string()),
                t0(),
            )
            .await
            .expect("send");

        for (user, expected) in [("alice", 1), ("bob", 1), ("carol", 0)] {
            let visible = manager
                .messages_for(&room_id, user, None, t0())
                .await
                .expect("read");
            assert_eq!(visible.messages.len(), expected, "user {user}");
        }
    }

    #[tokio::test]
    async fn interaction_then_private_flips_host_mode() {
        let manager = RoomManager::new();
        let room_id = room_with(&manager, &["alice", "bob"]).await;

        manager
            .send_message(&room_id, "alice", "I attack", MessageType::Interaction, None, t0())
            .await
            .expect("send");
        let info = manager.room_info(&room_id, t0()).await.expect("info");
        assert_eq!(info.host_mode, "global");

        manager
            .send_message(&room_id, "bob", "whisper", MessageType::Private, None, t0())
            .await
            .expect("send");
        let info = manager.room_info(&room_id, t0()).await.expect("info");
        assert_eq!(info.host_mode, "private");
    }

    #[tokio::test]
    async fn message_log_is_capped() {
        let manager = RoomManager::new();
        let room_id = room_with(&manager, &["alice"]).await;

        for i in 0..(MAX_ROOM_MESSAGES + 20) {
            manager
                .send_message(
                    &room_id,
                    "alice",
                    &format!("m{i}"),
                    MessageType::Global,
                    None,
                    t0() + Duration::seconds(i as i64),
                )
                .await
                .expect("send");
        }

        let room = manager.get(&room_id).await.expect("room");
        assert_eq!(room.message_count(), MAX_ROOM_MESSAGES);
        assert_eq!(room.messages().next().map(|m| m.content.as_str()), Some("m20"));
    }

    #[tokio::test]
    async fn messages_since_filters_by_timestamp() {
        let manager = RoomManager::new();
        let room_id = room_with(&manager, &["alice"]).await;
        manager
            .send_message(&room_id, "alice", "old", MessageType::Global, None, t0())
            .await
            .expect("send");
        manager
            .send_message(
                &room_id,
                "alice",
                "new",
                MessageType::Global,
                None,
                t0() + Duration::seconds(5),
            )
            .await
            .expect("send");

        let visible = manager
            .messages_for(&room_id, "alice", Some(t0()), t0() + Duration::seconds(6))
            .await
            .expect("read");

        assert_eq!(visible.messages.len(), 1);
        assert_eq!(visible.messages[0].content, "new");
        assert_eq!(visible.info.user_count, 1);
    }

    #[tokio::test]
    async fn echoed_wire_timestamp_does_not_redeliver() {
        let manager = RoomManager::new();
        let room_id = room_with(&manager, &["alice"]).await;
        let sent_at = Utc
            .timestamp_opt(1_714_564_800, 123_456_789)
            .single()
            .expect("valid timestamp");

        let message = manager
            .send_message(&room_id, "alice", "hello", MessageType::Global, None, sent_at)
            .await
            .expect("send");
        let wire = RoomMessageDto::from(&message).timestamp;
        let since = from_epoch_secs(wire).expect("round trip");

        let visible = manager
            .messages_for(&room_id, "alice", Some(since), sent_at)
            .await
            .expect("read");
        assert!(visible.messages.is_empty());

        let earlier = since - Duration::microseconds(1);
        let visible = manager
            .messages_for(&room_id, "alice", Some(earlier), sent_at)
            .await
            .expect("read");
        assert_eq!(visible.messages.len(), 1);
    }

    #[tokio::test]
    async fn only_host_sets_host_mode() {
        let manager = RoomManager::new();
        let room_id = room_with(&manager, &["alice", "bob"]).await;

        let err = manager
            .set_host_mode(&room_id, "bob", HostMode::Global)
            .await
            .expect_err("not host");
        assert!(matches!(err, RoomError::NotHost));

        manager
            .set_host_mode(&room_id, "alice", HostMode::Global)
            .await
            .expect("host sets mode");
        assert_eq!(
            manager.get(&room_id).await.expect("room").host_mode(),
            HostMode::Global
        );
    }

    #[tokio::test]
    async fn cleanup_removes_idle_and_empty_rooms_only() {
        let manager = RoomManager::new();
        let idle = room_with(&manager, &["alice"]).await;
        let active = room_with(&manager, &["bob", "carol"]).await;
        let empty = manager.create("dave", t0()).await;

        let later = t0() + Duration::seconds(IDLE_TIMEOUT_SECS + 1);
        manager
            .send_message(&active, "carol", "still here", MessageType::Global, None, later)
            .await
            .expect("send");

        let mut removed = manager.cleanup(later).await;
        removed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        let mut expected = vec![idle, empty];
        expected.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        assert_eq!(removed, expected);
        assert!(manager.get(&active).await.is_some());
    }
}
