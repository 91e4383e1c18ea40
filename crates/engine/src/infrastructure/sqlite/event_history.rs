//! SQLite-backed log of location events each player has triggered.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use emberhall_domain::EventTrigger;

use super::parse_timestamp;
use crate::infrastructure::ports::{EventHistoryRepo, RepoError};

pub struct SqliteEventHistoryRepo {
    pool: SqlitePool,
}

impl SqliteEventHistoryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventHistoryRepo for SqliteEventHistoryRepo {
    async fn record(&self, username: &str, trigger: &EventTrigger) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO event_triggers (username, event_id, event_name, event_type, triggered_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(&trigger.event_id)
        .bind(&trigger.event_name)
        .bind(&trigger.event_type)
        .bind(trigger.triggered_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("event_history", e))?;
        Ok(())
    }

    async fn recent(&self, username: &str, limit: usize) -> Result<Vec<EventTrigger>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT event_id, event_name, event_type, triggered_at FROM event_triggers
            WHERE username = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(username)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("event_history", e))?;

        rows.into_iter()
            .map(|row| {
                let triggered_at: String = row.get("triggered_at");
                Ok(EventTrigger {
                    event_id: row.get("event_id"),
                    event_name: row.get("event_name"),
                    event_type: row.get("event_type"),
                    triggered_at: parse_timestamp(&triggered_at)?,
                })
            })
            .collect()
    }
}
