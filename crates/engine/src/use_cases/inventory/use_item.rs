//! Use item use case.
//!
//! Consumes items from the bag and applies their effect once per unit.

use std::sync::Arc;

use emberhall_domain::{ItemEffect, WorldCatalog};

use super::error::InventoryError;
use crate::infrastructure::ports::PlayerRepo;
use crate::use_cases::profile::load_profile;

pub struct UseItem {
    players: Arc<dyn PlayerRepo>,
    catalog: Arc<WorldCatalog>,
}

impl UseItem {
    pub fn new(players: Arc<dyn PlayerRepo>, catalog: Arc<WorldCatalog>) -> Self {
        Self { players, catalog }
    }

    /// Returns a summary such as "Used Potion x2, HP +60".
    ///
    /// HP and MP restoration stops at the equipment-boosted maximum.
    pub async fn execute(
        &self,
        username: &str,
        item_id: &str,
        quantity: i64,
    ) -> Result<String, InventoryError> {
        if quantity < 1 {
            return Err(InventoryError::InvalidQuantity);
        }
        let item = self
            .catalog
            .item(item_id)
            .ok_or_else(|| InventoryError::ItemNotFound(item_id.to_string()))?;

        let held = self.players.item_quantity(username, item_id).await?;
        if held < quantity {
            return Err(InventoryError::NotEnoughItems {
                item_id: item_id.to_string(),
                held,
                requested: quantity,
            });
        }

        // Scale before touching the bag so an overflowing total removes nothing.
        let effect = match item.parsed_effect() {
            Some(effect) => Some(
                effect
                    .times(quantity)
                    .ok_or(InventoryError::QuantityTooLarge { quantity })?,
            ),
            None => None,
        };

        self.players.remove_item(username, item_id, quantity).await?;

        let mut summary = format!("Used {} x{}", item.item_name, quantity);
        match effect {
            Some(effect) => {
                let profile = load_profile(self.players.as_ref(), &self.catalog, username).await?;
                let mut stats = profile.base;
                match effect {
                    ItemEffect::RestoreHp(amount) => {
                        stats.restore_hp(amount, profile.effective.max_hp);
                    }
                    ItemEffect::RestoreMp(amount) => {
                        stats.restore_mp(amount, profile.effective.max_mp);
                    }
                    ItemEffect::GrantGold(amount) => {
                        stats.grant_gold(amount);
                    }
                }
                self.players.save_stats(username, &stats).await?;
                summary.push_str(&format!(", {effect}"));
            }
            None => {
                if let Some(raw) = item.effect.as_deref().filter(|e| !e.trim().is_empty()) {
                    summary.push_str(&format!(", {raw}"));
                }
            }
        }

        tracing::info!(username, item_id, quantity, %summary, "Item used");
        Ok(summary)
    }
}
