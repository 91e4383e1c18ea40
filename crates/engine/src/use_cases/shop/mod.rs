//! Shop use cases.
//!
//! Listings and prices come from the world catalog; stock levels live in
//! SQLite so purchases survive restarts.

use std::sync::Arc;

use emberhall_domain::{ItemDef, ShopDef, WorldCatalog};

use crate::infrastructure::ports::{PlayerRepo, PurchaseOutcome, RepoError, ShopRepo};
use crate::use_cases::map::{MapError, MapOps};

#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("There is no shop here")]
    NoShopHere,
    #[error("Shop not found: {0}")]
    ShopNotFound(String),
    #[error("{item_id} is not sold at {shop_id}")]
    ListingNotFound { shop_id: String, item_id: String },
    #[error("Out of stock")]
    OutOfStock,
    #[error("Not enough gold: have {gold}, need {price}")]
    InsufficientGold { gold: i64, price: i64 },
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// One purchasable line in a shop.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopItem {
    pub item: ItemDef,
    pub price: i64,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub item: ItemDef,
    pub price: i64,
    pub gold_remaining: i64,
}

pub struct ShopOps {
    shops: Arc<dyn ShopRepo>,
    players: Arc<dyn PlayerRepo>,
    map: Arc<MapOps>,
    catalog: Arc<WorldCatalog>,
}

impl ShopOps {
    pub fn new(
        shops: Arc<dyn ShopRepo>,
        players: Arc<dyn PlayerRepo>,
        map: Arc<MapOps>,
        catalog: Arc<WorldCatalog>,
    ) -> Self {
        Self {
            shops,
            players,
            map,
            catalog,
        }
    }

    /// Insert the catalog's starting stock without touching existing rows.
    pub async fn seed_stock(&self) -> Result<usize, ShopError> {
        let mut seeded = 0;
        for shop in &self.catalog.shops {
            for listing in &shop.items {
                self.shops
                    .seed_stock(&shop.shop_id, &listing.item_id, listing.stock)
                    .await?;
                seeded += 1;
            }
        }
        tracing::info!(listings = seeded, "Shop stock seeded");
        Ok(seeded)
    }

    pub async fn current_shop(&self, username: &str) -> Result<ShopDef, ShopError> {
        let location = self.map.player_location(username).await?;
        self.catalog
            .shop_at(&location.location_id)
            .cloned()
            .ok_or(ShopError::NoShopHere)
    }

    /// Listings with live stock, cheapest first. Unknown items are skipped.
    pub async fn shop_items(&self, shop_id: &str) -> Result<Vec<ShopItem>, ShopError> {
        let shop = self
            .catalog
            .shop(shop_id)
            .ok_or_else(|| ShopError::ShopNotFound(shop_id.to_string()))?;
        let stock = self.shops.stock_for_shop(shop_id).await?;

        let mut items: Vec<ShopItem> = shop
            .items
            .iter()
            .filter_map(|listing| {
                let Some(item) = self.catalog.item(&listing.item_id) else {
                    tracing::warn!(shop_id, item_id = %listing.item_id, "Shop lists unknown item");
                    return None;
                };
                Some(ShopItem {
                    item: item.clone(),
                    price: listing.price,
                    stock: stock.get(&listing.item_id).copied().unwrap_or(listing.stock),
                })
            })
            .collect();
        items.sort_by_key(|i| i.price);
        Ok(items)
    }

    /// Buy one unit at the catalog price.
    pub async fn purchase(
        &self,
        username: &str,
        shop_id: &str,
        item_id: &str,
    ) -> Result<Purchase, ShopError> {
        let listing_missing = || ShopError::ListingNotFound {
            shop_id: shop_id.to_string(),
            item_id: item_id.to_string(),
        };
        let shop = self
            .catalog
            .shop(shop_id)
            .ok_or_else(|| ShopError::ShopNotFound(shop_id.to_string()))?;
        let listing = shop.listing(item_id).ok_or_else(listing_missing)?;
        let item = self.catalog.item(item_id).ok_or_else(listing_missing)?;

        // Players created before the stats table existed have no row yet.
        if self.players.get_stats(username).await?.is_none() {
            self.map.player_location(username).await?;
        }

        let outcome = self
            .shops
            .purchase(username, shop_id, item_id, listing.price)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    listing_missing()
                } else {
                    ShopError::Repo(e)
                }
            })?;

        match outcome {
            PurchaseOutcome::Completed { gold_remaining } => Ok(Purchase {
                item: item.clone(),
                price: listing.price,
                gold_remaining,
            }),
            PurchaseOutcome::OutOfStock => Err(ShopError::OutOfStock),
            PurchaseOutcome::InsufficientGold { gold, price } => {
                Err(ShopError::InsufficientGold { gold, price })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockPlayerRepo, MockShopRepo};
    use emberhall_domain::{PlayerLocation, PlayerStats, ShopListing};
    use std::collections::HashMap;

    fn catalog() -> WorldCatalog {
        let (areas, locations) = WorldCatalog::default_village();
        WorldCatalog {
            areas,
            locations,
            items: vec![
                ItemDef {
                    item_name: "Potion".to_string(),
                    ..ItemDef::unknown("potion")
                },
                ItemDef {
                    item_name: "Bread".to_string(),
                    ..ItemDef::unknown("bread")
                },
            ],
            shops: vec![ShopDef {
                shop_id: "general".to_string(),
                shop_name: "General Store".to_string(),
                description: String::new(),
                shop_type: "general".to_string(),
                location_id: "market".to_string(),
                items: vec![
                    ShopListing {
                        item_id: "potion".to_string(),
                        price: 30,
                        stock: 5,
                    },
                    ShopListing {
                        item_id: "bread".to_string(),
                        price: 5,
                        stock: -1,
                    },
                    ShopListing {
                        item_id: "ghost".to_string(),
                        price: 1,
                        stock: 1,
                    },
                ],
            }],
            ..WorldCatalog::default()
        }
    }

    fn ops(shops: MockShopRepo, players: MockPlayerRepo) -> ShopOps {
        let players: Arc<dyn PlayerRepo> = Arc::new(players);
        let catalog = Arc::new(catalog());
        let map = Arc::new(MapOps::new(players.clone(), catalog.clone()));
        ShopOps::new(Arc::new(shops), players, map, catalog)
    }

    fn player_at(location_id: &'static str) -> MockPlayerRepo {
        let mut players = MockPlayerRepo::new();
        players.expect_get_location().returning(move |_| {
            Ok(Some(PlayerLocation {
                area_id: "novice_village".to_string(),
                location_id: location_id.to_string(),
            }))
        });
        players
            .expect_get_stats()
            .returning(|_| Ok(Some(PlayerStats::default())));
        players
    }

    #[tokio::test]
    async fn current_shop_depends_on_location() {
        let shop = ops(MockShopRepo::new(), player_at("market"))
            .current_shop("ada")
            .await
            .expect("shop");
        assert_eq!(shop.shop_id, "general");

        let err = ops(MockShopRepo::new(), player_at("forest"))
            .current_shop("ada")
            .await
            .expect_err("no shop");
        assert!(matches!(err, ShopError::NoShopHere));
    }

    #[tokio::test]
    async fn shop_items_use_live_stock_and_skip_unknown_items() {
        let mut shops = MockShopRepo::new();
        shops
            .expect_stock_for_shop()
            .returning(|_| Ok(HashMap::from([("potion".to_string(), 2)])));

        let items = ops(shops, MockPlayerRepo::new())
            .shop_items("general")
            .await
            .expect("items");

        let summary: Vec<_> = items
            .iter()
            .map(|i| (i.item.item_id.as_str(), i.price, i.stock))
            .collect();
        assert_eq!(summary, vec![("bread", 5, -1), ("potion", 30, 2)]);
    }

    #[tokio::test]
    async fn purchase_uses_catalog_price() {
        let mut shops = MockShopRepo::new();
        shops
            .expect_purchase()
            .withf(|username, shop_id, item_id, price| {
                username == "ada" && shop_id == "general" && item_id == "potion" && *price == 30
            })
            .times(1)
            .returning(|_, _, _, _| Ok(PurchaseOutcome::Completed { gold_remaining: 70 }));

        let purchase = ops(shops, player_at("market"))
            .purchase("ada", "general", "potion")
            .await
            .expect("purchase");

        assert_eq!(purchase.gold_remaining, 70);
        assert_eq!(purchase.item.item_name, "Potion");
    }

    #[tokio::test]
    async fn purchase_outcomes_map_to_errors() {
        let mut shops = MockShopRepo::new();
        shops.expect_purchase().returning(|_, _, _, _| {
            Ok(PurchaseOutcome::InsufficientGold {
                gold: 10,
                price: 30,
            })
        });

        let err = ops(shops, player_at("market"))
            .purchase("ada", "general", "potion")
            .await
            .expect_err("too poor");

        assert!(matches!(
            err,
            ShopError::InsufficientGold {
                gold: 10,
                price: 30
            }
        ));
    }

    #[tokio::test]
    async fn unlisted_item_is_rejected_before_storage() {
        let err = ops(MockShopRepo::new(), MockPlayerRepo::new())
            .purchase("ada", "general", "sword")
            .await
            .expect_err("not listed");

        assert!(matches!(err, ShopError::ListingNotFound { .. }));
    }

    #[tokio::test]
    async fn seed_stock_covers_every_listing() {
        let mut shops = MockShopRepo::new();
        shops
            .expect_seed_stock()
            .times(3)
            .returning(|_, _, _| Ok(()));

        let seeded = ops(shops, MockPlayerRepo::new())
            .seed_stock()
            .await
            .expect("seed");

        assert_eq!(seeded, 3);
    }
}
