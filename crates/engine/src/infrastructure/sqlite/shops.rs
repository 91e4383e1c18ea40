//! SQLite-backed shop stock and the purchase transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use emberhall_domain::UNLIMITED_STOCK;

use super::players::add_to_inventory;
use crate::infrastructure::ports::{PurchaseOutcome, RepoError, ShopRepo};

pub struct SqliteShopRepo {
    pool: SqlitePool,
}

impl SqliteShopRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopRepo for SqliteShopRepo {
    async fn seed_stock(&self, shop_id: &str, item_id: &str, stock: i64) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO shop_stock (shop_id, item_id, stock)
            VALUES (?, ?, ?)
            ON CONFLICT(shop_id, item_id) DO NOTHING
            "#,
        )
        .bind(shop_id)
        .bind(item_id)
        .bind(stock)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("shop_stock", e))?;
        Ok(())
    }

    async fn stock_for_shop(&self, shop_id: &str) -> Result<HashMap<String, i64>, RepoError> {
        let rows = sqlx::query("SELECT item_id, stock FROM shop_stock WHERE shop_id = ?")
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("shop_stock", e))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("item_id"), row.get("stock")))
            .collect())
    }

    async fn purchase(
        &self,
        username: &str,
        shop_id: &str,
        item_id: &str,
        price: i64,
    ) -> Result<PurchaseOutcome, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("purchase", e))?;

        // Writing first takes the write lock before anything is read.
        let decremented = sqlx::query(
            r#"
            UPDATE shop_stock SET stock = stock - 1
            WHERE shop_id = ? AND item_id = ? AND stock > 0
            "#,
        )
        .bind(shop_id)
        .bind(item_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("purchase", e))?
        .rows_affected();

        if decremented == 0 {
            let stock: Option<i64> =
                sqlx::query("SELECT stock FROM shop_stock WHERE shop_id = ? AND item_id = ?")
                    .bind(shop_id)
                    .bind(item_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| RepoError::database("purchase", e))?
                    .map(|row| row.get("stock"));

            match stock {
                None => {
                    return Err(RepoError::not_found(
                        "ShopListing",
                        format!("{shop_id}/{item_id}"),
                    ))
                }
                Some(UNLIMITED_STOCK) => {}
                Some(_) => {
                    tx.rollback()
                        .await
                        .map_err(|e| RepoError::database("purchase", e))?;
                    return Ok(PurchaseOutcome::OutOfStock);
                }
            }
        }

        let paid = sqlx::query(
            "UPDATE player_stats SET gold = gold - ? WHERE username = ? AND gold >= ?",
        )
        .bind(price)
        .bind(username)
        .bind(price)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("purchase", e))?
        .rows_affected();

        let gold: Option<i64> = sqlx::query("SELECT gold FROM player_stats WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepoError::database("purchase", e))?
            .map(|row| row.get("gold"));
        let Some(gold) = gold else {
            return Err(RepoError::not_found("Player", username));
        };

        if paid == 0 {
            tx.rollback()
                .await
                .map_err(|e| RepoError::database("purchase", e))?;
            return Ok(PurchaseOutcome::InsufficientGold { gold, price });
        }

        add_to_inventory(&mut tx, username, item_id, 1).await?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("purchase", e))?;

        tracing::info!(username, shop_id, item_id, price, gold_remaining = gold, "Purchase completed");
        Ok(PurchaseOutcome::Completed {
            gold_remaining: gold,
        })
    }
}
