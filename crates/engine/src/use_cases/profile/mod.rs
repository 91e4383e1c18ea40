//! Player profile use cases.
//!
//! A profile is derived on every read: base stats from SQLite, item
//! definitions from the world catalog, bonuses from whatever is equipped.

use std::sync::Arc;

use emberhall_domain::{PlayerLocation, PlayerProfile, PlayerStats, StatsPatch, WorldCatalog};

use crate::infrastructure::ports::{PlayerRepo, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Load a player's profile, creating default rows for players that have none.
pub(crate) async fn load_profile(
    players: &dyn PlayerRepo,
    catalog: &WorldCatalog,
    username: &str,
) -> Result<PlayerProfile, RepoError> {
    let base = match players.get_stats(username).await? {
        Some(stats) => stats,
        None => {
            tracing::info!(username, "Creating missing player rows");
            players
                .init_player(username, &PlayerStats::default(), &PlayerLocation::default())
                .await?;
            PlayerStats::default()
        }
    };

    let inventory = players.get_inventory(username).await?;
    let equipment = players.get_equipment(username).await?;
    let location = players.get_location(username).await?.unwrap_or_default();

    Ok(PlayerProfile::assemble(
        username, base, &inventory, &equipment, location, catalog,
    ))
}

pub struct ProfileOps {
    players: Arc<dyn PlayerRepo>,
    catalog: Arc<WorldCatalog>,
}

impl ProfileOps {
    pub fn new(players: Arc<dyn PlayerRepo>, catalog: Arc<WorldCatalog>) -> Self {
        Self { players, catalog }
    }

    pub async fn profile(&self, username: &str) -> Result<PlayerProfile, ProfileError> {
        Ok(load_profile(self.players.as_ref(), &self.catalog, username).await?)
    }

    /// Apply the fields present in `patch` with clamping, then return the new profile.
    pub async fn update_stats(
        &self,
        username: &str,
        patch: &StatsPatch,
    ) -> Result<PlayerProfile, ProfileError> {
        let current = load_profile(self.players.as_ref(), &self.catalog, username).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        let mut stats = current.base;
        stats.apply(patch);
        self.players.save_stats(username, &stats).await?;
        tracing::debug!(username, ?patch, "Player stats updated");

        Ok(load_profile(self.players.as_ref(), &self.catalog, username).await?)
    }
}
