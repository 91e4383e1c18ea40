//! Map use cases: where the player is and where they can go.

use std::sync::Arc;

use emberhall_domain::{Area, LocationDef, PlayerLocation, PlayerStats, WorldCatalog};

use crate::infrastructure::ports::{PlayerRepo, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),
    #[error("{0} is not accessible")]
    Inaccessible(String),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// A location with its area, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationView {
    pub location: LocationDef,
    pub area: Option<Area>,
}

pub struct MapOps {
    players: Arc<dyn PlayerRepo>,
    catalog: Arc<WorldCatalog>,
}

impl MapOps {
    pub fn new(players: Arc<dyn PlayerRepo>, catalog: Arc<WorldCatalog>) -> Self {
        Self { players, catalog }
    }

    /// The stored location, initialising new players at the default spot.
    pub async fn player_location(&self, username: &str) -> Result<PlayerLocation, MapError> {
        if let Some(location) = self.players.get_location(username).await? {
            return Ok(location);
        }

        let location = PlayerLocation::default();
        self.players
            .init_player(username, &PlayerStats::default(), &location)
            .await?;
        Ok(location)
    }

    /// The player's location enriched from the catalog.
    ///
    /// Ids the catalog no longer knows get a placeholder description.
    pub async fn current_location(&self, username: &str) -> Result<LocationView, MapError> {
        let stored = self.player_location(username).await?;
        let location = self
            .catalog
            .location(&stored.location_id)
            .cloned()
            .unwrap_or_else(|| LocationDef {
                location_id: stored.location_id.clone(),
                display_name: stored.location_id.clone(),
                description: "An unfamiliar place.".to_string(),
                area_id: stored.area_id.clone(),
                location_type: "unknown".to_string(),
                is_accessible: true,
                aliases: Vec::new(),
                arrival_notice: None,
            });
        let area = self.catalog.area(&stored.area_id).cloned();
        Ok(LocationView { location, area })
    }

    pub fn area_locations(&self, area_id: &str) -> Vec<LocationView> {
        let area = self.catalog.area(area_id).cloned();
        self.catalog
            .locations_in_area(area_id)
            .into_iter()
            .map(|location| LocationView {
                location: location.clone(),
                area: area.clone(),
            })
            .collect()
    }

    /// Move to a location named by id, alias or display name.
    pub async fn move_to(&self, username: &str, target: &str) -> Result<LocationView, MapError> {
        let view = self.location_info(target)?;
        if !view.location.is_accessible {
            return Err(MapError::Inaccessible(view.location.display_name));
        }

        self.players
            .set_location(
                username,
                &PlayerLocation {
                    area_id: view.location.area_id.clone(),
                    location_id: view.location.location_id.clone(),
                },
            )
            .await?;

        tracing::info!(
            username,
            location_id = %view.location.location_id,
            area_id = %view.location.area_id,
            "Player moved"
        );
        Ok(view)
    }

    pub fn location_info(&self, name: &str) -> Result<LocationView, MapError> {
        let location = self
            .catalog
            .resolve_location(name)
            .cloned()
            .ok_or_else(|| MapError::LocationNotFound(name.to_string()))?;
        let area = self.catalog.area(&location.area_id).cloned();
        Ok(LocationView { location, area })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockPlayerRepo;

    fn catalog() -> WorldCatalog {
        let (areas, mut locations) = WorldCatalog::default_village();
        locations.push(LocationDef {
            location_id: "vault".to_string(),
            display_name: "Sealed Vault".to_string(),
            description: String::new(),
            area_id: "novice_village".to_string(),
            location_type: "dungeon".to_string(),
            is_accessible: false,
            aliases: Vec::new(),
            arrival_notice: None,
        });
        WorldCatalog {
            areas,
            locations,
            ..WorldCatalog::default()
        }
    }

    #[tokio::test]
    async fn move_resolves_aliases_and_stores_location() {
        let mut players = MockPlayerRepo::new();
        players
            .expect_set_location()
            .withf(|username, location| username == "ada" && location.location_id == "market")
            .times(1)
            .returning(|_, _| Ok(()));
        let map = MapOps::new(Arc::new(players), Arc::new(catalog()));

        let view = map.move_to("ada", "Market").await.expect("move");

        assert_eq!(view.location.location_id, "market");
        assert_eq!(
            view.area.map(|a| a.display_name),
            Some("Novice Village".to_string())
        );
    }

    #[tokio::test]
    async fn inaccessible_location_is_refused() {
        let map = MapOps::new(Arc::new(MockPlayerRepo::new()), Arc::new(catalog()));

        let err = map.move_to("ada", "vault").await.expect_err("sealed");

        assert!(matches!(err, MapError::Inaccessible(_)));
    }

    #[tokio::test]
    async fn unknown_location_is_not_found() {
        let map = MapOps::new(Arc::new(MockPlayerRepo::new()), Arc::new(catalog()));

        let err = map.move_to("ada", "atlantis").await.expect_err("unknown");

        assert!(matches!(err, MapError::LocationNotFound(_)));
    }

    #[tokio::test]
    async fn new_player_starts_at_home() {
        let mut players = MockPlayerRepo::new();
        players.expect_get_location().returning(|_| Ok(None));
        players
            .expect_init_player()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let map = MapOps::new(Arc::new(players), Arc::new(catalog()));

        let view = map.current_location("ada").await.expect("location");

        assert_eq!(view.location.location_id, "home");
    }

    #[test]
    fn area_listing_is_sorted_by_type_then_name() {
        let map = MapOps::new(Arc::new(MockPlayerRepo::new()), Arc::new(catalog()));

        let types: Vec<String> = map
            .area_locations("novice_village")
            .into_iter()
            .map(|v| v.location.location_type)
            .collect();

        let mut sorted = types.clone();
        sorted.sort();
        assert_eq!(types, sorted);
    }
}
