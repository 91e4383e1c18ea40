//! SQLite-backed user accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use emberhall_domain::UserAccount;

use super::parse_timestamp;
use crate::infrastructure::ports::{RepoError, UserRepo};

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for SqliteUserRepo {
    async fn create(&self, account: &UserAccount) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, created_at, last_login)
            VALUES (?, ?, ?, NULL)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("users", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::constraint(format!(
                "username already exists: {}",
                account.username
            )));
        }
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<Option<UserAccount>, RepoError> {
        let row = sqlx::query(
            "SELECT username, password_hash, created_at, last_login FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("users", e))?;

        match row {
            Some(row) => {
                let created_at: String = row.get("created_at");
                let last_login: Option<String> = row.get("last_login");
                Ok(Some(UserAccount {
                    username: row.get("username"),
                    password_hash: row.get("password_hash"),
                    created_at: parse_timestamp(&created_at)?,
                    last_login: last_login.as_deref().map(parse_timestamp).transpose()?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn record_login(&self, username: &str, at: DateTime<Utc>) -> Result<(), RepoError> {
        sqlx::query("UPDATE users SET last_login = ? WHERE username = ?")
            .bind(at.to_rfc3339())
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::database("users", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite::test_support::temp_pool;

    fn account(name: &str) -> UserAccount {
        UserAccount {
            username: name.to_string(),
            password_hash: "salt$hash".to_string(),
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteUserRepo::new(pool);

        repo.create(&account("ada")).await.expect("create");
        let loaded = repo.get("ada").await.expect("get").expect("exists");

        assert_eq!(loaded.password_hash, "salt$hash");
        assert!(loaded.last_login.is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_constraint_violation() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteUserRepo::new(pool);

        repo.create(&account("ada")).await.expect("create");
        let err = repo.create(&account("ada")).await.expect_err("duplicate");

        assert!(matches!(err, RepoError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn record_login_sets_timestamp() {
        let (_dir, pool) = temp_pool().await;
        let repo = SqliteUserRepo::new(pool);
        repo.create(&account("ada")).await.expect("create");

        repo.record_login("ada", Utc::now()).await.expect("login");

        let loaded = repo.get("ada").await.expect("get").expect("exists");
        assert!(loaded.last_login.is_some());
    }
}
