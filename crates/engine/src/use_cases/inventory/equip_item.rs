//! Equip and unequip use cases.
//!
//! Equipped items leave the bag; whatever they replace goes back into it.

use std::sync::Arc;

use emberhall_domain::{EquipmentSlot, ItemDef, WorldCatalog};

use super::error::InventoryError;
use crate::infrastructure::ports::{PlayerRepo, RepoError};

pub struct EquipItem {
    players: Arc<dyn PlayerRepo>,
    catalog: Arc<WorldCatalog>,
}

impl EquipItem {
    pub fn new(players: Arc<dyn PlayerRepo>, catalog: Arc<WorldCatalog>) -> Self {
        Self { players, catalog }
    }

    /// Returns the equipped item and the id of the item it replaced, if any.
    pub async fn execute(
        &self,
        username: &str,
        item_id: &str,
        slot: &str,
    ) -> Result<(ItemDef, Option<String>), InventoryError> {
        let slot: EquipmentSlot = slot.parse()?;
        let item = self
            .catalog
            .item(item_id)
            .ok_or_else(|| InventoryError::ItemNotFound(item_id.to_string()))?;

        if let Some(expected) = item.slot {
            if expected != slot {
                return Err(InventoryError::WrongSlot {
                    item_name: item.item_name.clone(),
                    expected,
                    requested: slot,
                });
            }
        }

        let held = self.players.item_quantity(username, item_id).await?;
        if held < 1 {
            return Err(InventoryError::NotEnoughItems {
                item_id: item_id.to_string(),
                held,
                requested: 1,
            });
        }

        let previous = self
            .players
            .equip(username, slot, item_id)
            .await
            .map_err(|e| match e {
                // Lost a race with another request for the last unit.
                RepoError::ConstraintViolation(_) => InventoryError::NotEnoughItems {
                    item_id: item_id.to_string(),
                    held: 0,
                    requested: 1,
                },
                other => InventoryError::Repo(other),
            })?;

        tracing::info!(username, item_id, %slot, previous = ?previous, "Item equipped");
        Ok((item.clone(), previous))
    }
}

pub struct UnequipItem {
    players: Arc<dyn PlayerRepo>,
    catalog: Arc<WorldCatalog>,
}

impl UnequipItem {
    pub fn new(players: Arc<dyn PlayerRepo>, catalog: Arc<WorldCatalog>) -> Self {
        Self { players, catalog }
    }

    /// Returns the item that went back into the bag.
    pub async fn execute(&self, username: &str, slot: &str) -> Result<ItemDef, InventoryError> {
        let slot: EquipmentSlot = slot.parse()?;
        let removed = self
            .players
            .unequip(username, slot)
            .await?
            .ok_or(InventoryError::SlotEmpty(slot))?;

        tracing::info!(username, item_id = %removed, %slot, "Item unequipped");
        Ok(self
            .catalog
            .item(&removed)
            .cloned()
            .unwrap_or_else(|| ItemDef::unknown(&removed)))
    }
}
