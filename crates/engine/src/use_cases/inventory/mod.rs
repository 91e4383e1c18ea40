//! Inventory use cases.
//!
//! Handles the item catalog, the player's bag and equipment slots.

use std::sync::Arc;

use emberhall_domain::{ItemDef, WorldCatalog};

use crate::infrastructure::ports::PlayerRepo;

mod equip_item;
mod error;
mod use_item;

pub use equip_item::{EquipItem, UnequipItem};
pub use error::InventoryError;
pub use use_item::UseItem;

/// Container for inventory use cases.
pub struct InventoryUseCases {
    pub ops: Arc<InventoryOps>,
    pub use_item: Arc<UseItem>,
    pub equip: Arc<EquipItem>,
    pub unequip: Arc<UnequipItem>,
}

impl InventoryUseCases {
    pub fn new(
        ops: Arc<InventoryOps>,
        use_item: Arc<UseItem>,
        equip: Arc<EquipItem>,
        unequip: Arc<UnequipItem>,
    ) -> Self {
        Self {
            ops,
            use_item,
            equip,
            unequip,
        }
    }
}

/// Catalog queries and plain bag additions.
pub struct InventoryOps {
    players: Arc<dyn PlayerRepo>,
    catalog: Arc<WorldCatalog>,
}

impl InventoryOps {
    pub fn new(players: Arc<dyn PlayerRepo>, catalog: Arc<WorldCatalog>) -> Self {
        Self { players, catalog }
    }

    pub fn catalog_items(&self) -> Vec<ItemDef> {
        self.catalog.items.clone()
    }

    pub fn search_items(&self, query: &str, item_type: &str, rarity: &str) -> Vec<ItemDef> {
        self.catalog
            .search_items(query, item_type.trim(), rarity.trim())
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn add_item(
        &self,
        username: &str,
        item_id: &str,
        quantity: i64,
    ) -> Result<ItemDef, InventoryError> {
        if quantity < 1 {
            return Err(InventoryError::InvalidQuantity);
        }
        let item = self
            .catalog
            .item(item_id)
            .ok_or_else(|| InventoryError::ItemNotFound(item_id.to_string()))?;

        self.players.add_item(username, item_id, quantity).await?;
        tracing::info!(username, item_id, quantity, "Item added to inventory");
        Ok(item.clone())
    }
}
