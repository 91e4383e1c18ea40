//! SQLite-backed login sessions.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use emberhall_domain::Session;

use super::parse_timestamp;
use crate::infrastructure::ports::{RepoError, SessionRepo};

pub struct SqliteSessionRepo {
    pool: SqlitePool,
}

impl SqliteSessionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepo for SqliteSessionRepo {
    async fn save(&self, session: &Session) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (token, username, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(token) DO UPDATE SET
                username = excluded.username,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&session.token)
        .bind(&session.username)
        .bind(session.created_at.to_rfc3339())
        .bind(session.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("sessions", e))?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, RepoError> {
        let row = sqlx::query(
            "SELECT token, username, created_at, expires_at FROM user_sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("sessions", e))?;

        match row {
            Some(row) => {
                let created_at: String = row.get("created_at");
                let expires_at: String = row.get("expires_at");
                Ok(Some(Session {
                    token: row.get("token"),
                    username: row.get("username"),
                    created_at: parse_timestamp(&created_at)?,
                    expires_at: parse_timestamp(&expires_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, token: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM user_sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("sessions", e))?;
        Ok(())
    }
}
