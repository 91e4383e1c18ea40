//! Loads the world catalog from the JSON files in the world data directory.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use emberhall_domain::{
    Area, CreatureDef, EventDef, ItemDef, LocationDef, Persona, ShopDef, SkillDef, WorldCatalog,
};

#[derive(Debug, thiserror::Error)]
pub enum WorldDataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct LocationsFile {
    #[serde(default)]
    areas: Vec<Area>,
    #[serde(default)]
    locations: Vec<LocationDef>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemsFile {
    #[serde(default)]
    items: Vec<ItemDef>,
}

#[derive(Debug, Default, Deserialize)]
struct ShopsFile {
    #[serde(default)]
    shops: Vec<ShopDef>,
}

#[derive(Debug, Default, Deserialize)]
struct CreaturesFile {
    #[serde(default)]
    creatures: Vec<CreatureDef>,
}

#[derive(Debug, Default, Deserialize)]
struct SkillsFile {
    #[serde(default)]
    skills: Vec<SkillDef>,
}

#[derive(Debug, Default, Deserialize)]
struct EventsFile {
    #[serde(default)]
    events: Vec<EventDef>,
}

#[derive(Debug, Default, Deserialize)]
struct PersonasFile {
    #[serde(default)]
    personas: Vec<Persona>,
}

/// Read every catalog file under `dir`.
///
/// Missing files count as empty, except `locations.json` which falls back to
/// the built-in starter village. Malformed JSON is an error.
pub fn load_world_catalog(dir: &Path) -> Result<WorldCatalog, WorldDataError> {
    let (areas, locations) = match read_optional::<LocationsFile>(&dir.join("locations.json"))? {
        Some(file) => (file.areas, file.locations),
        None => {
            tracing::info!(dir = %dir.display(), "No locations.json, using the default village");
            WorldCatalog::default_village()
        }
    };

    let items = read_optional::<ItemsFile>(&dir.join("items.json"))?.unwrap_or_default();
    let shops = read_optional::<ShopsFile>(&dir.join("shops.json"))?.unwrap_or_default();
    let creatures =
        read_optional::<CreaturesFile>(&dir.join("creatures.json"))?.unwrap_or_default();
    let skills = read_optional::<SkillsFile>(&dir.join("skills.json"))?.unwrap_or_default();
    let events = read_optional::<EventsFile>(&dir.join("events.json"))?.unwrap_or_default();
    let personas =
        read_optional::<PersonasFile>(&dir.join("personas.json"))?.unwrap_or_default();

    let catalog = WorldCatalog {
        areas,
        locations,
        items: items.items,
        shops: shops.shops,
        creatures: creatures.creatures,
        skills: skills.skills,
        events: events.events,
        personas: personas.personas,
    };

    tracing::info!(
        areas = catalog.areas.len(),
        locations = catalog.locations.len(),
        items = catalog.items.len(),
        shops = catalog.shops.len(),
        creatures = catalog.creatures.len(),
        skills = catalog.skills.len(),
        events = catalog.events.len(),
        personas = catalog.personas.len(),
        "World catalog loaded"
    );

    Ok(catalog)
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, WorldDataError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(WorldDataError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| WorldDataError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
