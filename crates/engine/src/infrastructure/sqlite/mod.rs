//! SQLite persistence for accounts, player state, chat and event history, and shop stock.
//!
//! All repositories share one pool. The schema is created on connect.

mod chat_history;
mod event_history;
mod players;
mod sessions;
mod shops;
mod users;

pub use chat_history::SqliteChatHistoryRepo;
pub use event_history::SqliteEventHistoryRepo;
pub use players::SqlitePlayerRepo;
pub use sessions::SqliteSessionRepo;
pub use shops::SqliteShopRepo;
pub use users::SqliteUserRepo;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        username TEXT PRIMARY KEY,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        last_login TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_sessions (
        token TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS player_stats (
        username TEXT PRIMARY KEY,
        hp INTEGER NOT NULL,
        mp INTEGER NOT NULL,
        max_hp INTEGER NOT NULL,
        max_mp INTEGER NOT NULL,
        gold INTEGER NOT NULL,
        experience INTEGER NOT NULL,
        level INTEGER NOT NULL,
        attack INTEGER NOT NULL,
        defense INTEGER NOT NULL,
        critical_rate INTEGER NOT NULL,
        critical_damage INTEGER NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory (
        username TEXT NOT NULL,
        item_id TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        PRIMARY KEY (username, item_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS equipment (
        username TEXT NOT NULL,
        slot TEXT NOT NULL,
        item_id TEXT NOT NULL,
        PRIMARY KEY (username, slot)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS player_locations (
        username TEXT PRIMARY KEY,
        area_id TEXT NOT NULL,
        location_id TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chat_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        persona TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_chat_history_owner ON chat_history (username, persona, id)",
    r#"
    CREATE TABLE IF NOT EXISTS event_triggers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        event_id TEXT NOT NULL,
        event_name TEXT NOT NULL,
        event_type TEXT NOT NULL,
        triggered_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_event_triggers_owner ON event_triggers (username, id)",
    r#"
    CREATE TABLE IF NOT EXISTS shop_stock (
        shop_id TEXT NOT NULL,
        item_id TEXT NOT NULL,
        stock INTEGER NOT NULL,
        PRIMARY KEY (shop_id, item_id)
    )
    "#,
];

/// Open (creating if needed) the database file and ensure the schema.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await
        .map_err(|e| RepoError::database("connect", e))?;

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .map_err(|e| RepoError::database("schema", e))?;
    }

    tracing::info!(db_path, "SQLite schema ready");
    Ok(pool)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("bad timestamp {raw:?}: {e}")))
}
