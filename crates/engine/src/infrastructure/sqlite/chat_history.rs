//! SQLite-backed narrator conversation history, keyed by user and persona.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use emberhall_domain::{ChatRole, ChatTurn};

use super::parse_timestamp;
use crate::infrastructure::ports::{ChatHistoryRepo, RepoError};

pub struct SqliteChatHistoryRepo {
    pool: SqlitePool,
}

impl SqliteChatHistoryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatHistoryRepo for SqliteChatHistoryRepo {
    async fn recent(
        &self,
        username: &str,
        persona: &str,
        limit: usize,
    ) -> Result<Vec<ChatTurn>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT role, content, created_at FROM chat_history
            WHERE username = ? AND persona = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(username)
        .bind(persona)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("chat_history", e))?;

        let mut turns = rows
            .into_iter()
            .map(|row| {
                let role: String = row.get("role");
                let created_at: String = row.get("created_at");
                Ok(ChatTurn {
                    role: ChatRole::parse(&role).ok_or_else(|| {
                        RepoError::serialization(format!("unknown chat role {role:?}"))
                    })?,
                    content: row.get("content"),
                    timestamp: parse_timestamp(&created_at)?,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn append(
        &self,
        username: &str,
        persona: &str,
        turn: &ChatTurn,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO chat_history (username, persona, role, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(persona)
        .bind(turn.role.as_str())
        .bind(&turn.content)
        .bind(turn.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("chat_history", e))?;
        Ok(())
    }

    async fn delete_last_assistant(
        &self,
        username: &str,
        persona: &str,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            DELETE FROM chat_history
            WHERE id = (
                SELECT id FROM chat_history
                WHERE username = ? AND persona = ?
                ORDER BY id DESC
                LIMIT 1
            )
            AND role = ?
            "#,
        )
        .bind(username)
        .bind(persona)
        .bind(ChatRole::Assistant.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("chat_history", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, username: &str, persona: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM chat_history WHERE username = ? AND persona = ?")
            .bind(username)
            .bind(persona)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("chat_history", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite::test_support::temp_pool;
    use chrono::Utc;

    fn turn(role: ChatRole, content: &str) -> ChatTurn {
        ChatTurn {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn recent_returns_newest_turns_oldest_first() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteChatHistoryRepo::new(pool);
        for i in 0..5 {
            repo.append("ada", "Dungeon Master", &turn(ChatRole::User, &format!("m{i}")))
                .await
                .expect("append");
        }

        let turns = repo.recent("ada", "Dungeon Master", 3).await.expect("recent");
        let contents: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();

        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn history_is_scoped_by_persona() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteChatHistoryRepo::new(pool);
        repo.append("ada", "Sage", &turn(ChatRole::User, "hi sage"))
            .await
            .expect("append");

        assert!(repo.recent("ada", "Dungeon Master", 10).await.expect("recent").is_empty());

        repo.clear("ada", "Sage").await.expect("clear");
        assert!(repo.recent("ada", "Sage", 10).await.expect("recent").is_empty());
    }

    #[tokio::test]
    async fn delete_last_assistant_only_removes_trailing_reply() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteChatHistoryRepo::new(pool);
        repo.append("ada", "p", &turn(ChatRole::User, "q"))
            .await
            .expect("append");
        repo.append("ada", "p", &turn(ChatRole::Assistant, "a"))
            .await
            .expect("append");

        assert!(repo.delete_last_assistant("ada", "p").await.expect("delete"));
        // The newest turn is now the user's, so nothing more is removed.
        assert!(!repo.delete_last_assistant("ada", "p").await.expect("delete"));
        assert_eq!(repo.recent("ada", "p", 10).await.expect("recent").len(), 1);
    }
}
