//! SQLite-backed player stats, inventory, equipment and location.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};

use emberhall_domain::{EquipmentSlot, InventoryEntry, PlayerLocation, PlayerStats};

use crate::infrastructure::ports::{PlayerRepo, RepoError};

pub struct SqlitePlayerRepo {
    pool: SqlitePool,
}

impl SqlitePlayerRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Add `quantity` units to a bag stack, creating it if needed.
pub(super) async fn add_to_inventory(
    conn: &mut SqliteConnection,
    username: &str,
    item_id: &str,
    quantity: i64,
) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        INSERT INTO inventory (username, item_id, quantity)
        VALUES (?, ?, ?)
        ON CONFLICT(username, item_id) DO UPDATE SET quantity = quantity + excluded.quantity
        "#,
    )
    .bind(username)
    .bind(item_id)
    .bind(quantity)
    .execute(conn)
    .await
    .map_err(|e| RepoError::database("inventory", e))?;
    Ok(())
}

/// Take `quantity` units out of a bag stack. Empty stacks are deleted.
async fn take_from_inventory(
    conn: &mut SqliteConnection,
    username: &str,
    item_id: &str,
    quantity: i64,
) -> Result<(), RepoError> {
    let result = sqlx::query(
        r#"
        UPDATE inventory SET quantity = quantity - ?
        WHERE username = ? AND item_id = ? AND quantity >= ?
        "#,
    )
    .bind(quantity)
    .bind(username)
    .bind(item_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await
    .map_err(|e| RepoError::database("inventory", e))?;

    if result.rows_affected() == 0 {
        return Err(RepoError::constraint(format!(
            "not enough {item_id} in inventory"
        )));
    }

    sqlx::query("DELETE FROM inventory WHERE username = ? AND item_id = ? AND quantity <= 0")
        .bind(username)
        .bind(item_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| RepoError::database("inventory", e))?;
    Ok(())
}

#[async_trait]
impl PlayerRepo for SqlitePlayerRepo {
    async fn init_player(
        &self,
        username: &str,
        stats: &PlayerStats,
        location: &PlayerLocation,
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("init_player", e))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO player_stats (
                username, hp, mp, max_hp, max_mp, gold, experience, level,
                attack, defense, critical_rate, critical_damage, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(stats.hp)
        .bind(stats.mp)
        .bind(stats.max_hp)
        .bind(stats.max_mp)
        .bind(stats.gold)
        .bind(stats.experience)
        .bind(stats.level)
        .bind(stats.attack)
        .bind(stats.defense)
        .bind(stats.critical_rate)
        .bind(stats.critical_damage)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("init_player", e))?;

        sqlx::query(
            r#"
            INSERT INTO player_locations (username, area_id, location_id, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(&location.area_id)
        .bind(&location.location_id)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("init_player", e))?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("init_player", e))?;
        Ok(())
    }

    async fn get_stats(&self, username: &str) -> Result<Option<PlayerStats>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT hp, mp, max_hp, max_mp, gold, experience, level,
                   attack, defense, critical_rate, critical_damage
            FROM player_stats WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("player_stats", e))?;

        Ok(row.map(|row| PlayerStats {
            hp: row.get("hp"),
            mp: row.get("mp"),
            max_hp: row.get("max_hp"),
            max_mp: row.get("max_mp"),
            gold: row.get("gold"),
            experience: row.get("experience"),
            level: row.get("level"),
            attack: row.get("attack"),
            defense: row.get("defense"),
            critical_rate: row.get("critical_rate"),
            critical_damage: row.get("critical_damage"),
        }))
    }

    async fn save_stats(&self, username: &str, stats: &PlayerStats) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO player_stats (
                username, hp, mp, max_hp, max_mp, gold, experience, level,
                attack, defense, critical_rate, critical_damage, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET
                hp = excluded.hp,
                mp = excluded.mp,
                max_hp = excluded.max_hp,
                max_mp = excluded.max_mp,
                gold = excluded.gold,
                experience = excluded.experience,
                level = excluded.level,
                attack = excluded.attack,
                defense = excluded.defense,
                critical_rate = excluded.critical_rate,
                critical_damage = excluded.critical_damage,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(username)
        .bind(stats.hp)
        .bind(stats.mp)
        .bind(stats.max_hp)
        .bind(stats.max_mp)
        .bind(stats.gold)
        .bind(stats.experience)
        .bind(stats.level)
        .bind(stats.attack)
        .bind(stats.defense)
        .bind(stats.critical_rate)
        .bind(stats.critical_damage)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("player_stats", e))?;
        Ok(())
    }

    async fn get_inventory(&self, username: &str) -> Result<Vec<InventoryEntry>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, quantity FROM inventory
            WHERE username = ? AND quantity > 0
            ORDER BY item_id
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("inventory", e))?;

        Ok(rows
            .into_iter()
            .map(|row| InventoryEntry {
                item_id: row.get("item_id"),
                quantity: row.get("quantity"),
            })
            .collect())
    }

    async fn item_quantity(&self, username: &str, item_id: &str) -> Result<i64, RepoError> {
        let row = sqlx::query("SELECT quantity FROM inventory WHERE username = ? AND item_id = ?")
            .bind(username)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("inventory", e))?;
        Ok(row.map(|row| row.get::<i64, _>("quantity")).unwrap_or(0))
    }

    async fn add_item(
        &self,
        username: &str,
        item_id: &str,
        quantity: i64,
    ) -> Result<(), RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("inventory", e))?;
        add_to_inventory(&mut conn, username, item_id, quantity).await
    }

    async fn remove_item(
        &self,
        username: &str,
        item_id: &str,
        quantity: i64,
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("inventory", e))?;
        take_from_inventory(&mut tx, username, item_id, quantity).await?;
        tx.commit()
            .await
            .map_err(|e| RepoError::database("inventory", e))?;
        Ok(())
    }

    async fn get_equipment(
        &self,
        username: &str,
    ) -> Result<BTreeMap<EquipmentSlot, String>, RepoError> {
        let rows = sqlx::query("SELECT slot, item_id FROM equipment WHERE username = ?")
            .bind(username)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("equipment", e))?;

        let mut equipped = BTreeMap::new();
        for row in rows {
            let slot: String = row.get("slot");
            let slot: EquipmentSlot = slot
                .parse()
                .map_err(|e| RepoError::serialization(format!("equipment slot: {e}")))?;
            equipped.insert(slot, row.get("item_id"));
        }
        Ok(equipped)
    }

    async fn equip(
        &self,
        username: &str,
        slot: EquipmentSlot,
        item_id: &str,
    ) -> Result<Option<String>, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("equip", e))?;

        take_from_inventory(&mut tx, username, item_id, 1).await?;

        let previous: Option<String> =
            sqlx::query("SELECT item_id FROM equipment WHERE username = ? AND slot = ?")
                .bind(username)
                .bind(slot.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| RepoError::database("equip", e))?
                .map(|row| row.get("item_id"));

        sqlx::query(
            r#"
            INSERT INTO equipment (username, slot, item_id)
            VALUES (?, ?, ?)
            ON CONFLICT(username, slot) DO UPDATE SET item_id = excluded.item_id
            "#,
        )
        .bind(username)
        .bind(slot.as_str())
        .bind(item_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("equip", e))?;

        if let Some(previous) = &previous {
            add_to_inventory(&mut tx, username, previous, 1).await?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("equip", e))?;
        Ok(previous)
    }

    async fn unequip(
        &self,
        username: &str,
        slot: EquipmentSlot,
    ) -> Result<Option<String>, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("unequip", e))?;

        let removed: Option<String> = sqlx::query(
            "DELETE FROM equipment WHERE username = ? AND slot = ? RETURNING item_id",
        )
        .bind(username)
        .bind(slot.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepoError::database("unequip", e))?
        .map(|row| row.get("item_id"));

        if let Some(item_id) = &removed {
            add_to_inventory(&mut tx, username, item_id, 1).await?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("unequip", e))?;
        Ok(removed)
    }

    async fn get_location(&self, username: &str) -> Result<Option<PlayerLocation>, RepoError> {
        let row =
            sqlx::query("SELECT area_id, location_id FROM player_locations WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::database("player_locations", e))?;

        Ok(row.map(|row| PlayerLocation {
            area_id: row.get("area_id"),
            location_id: row.get("location_id"),
        }))
    }

    async fn set_location(
        &self,
        username: &str,
        location: &PlayerLocation,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO player_locations (username, area_id, location_id, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET
                area_id = excluded.area_id,
                location_id = excluded.location_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(username)
        .bind(&location.area_id)
        .bind(&location.location_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("player_locations", e))?;
        Ok(())
    }
}
