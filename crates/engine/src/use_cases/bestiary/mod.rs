//! Bestiary use cases: read-only views of the creature and skill catalogs.

use std::sync::Arc;

use emberhall_domain::{CreatureDef, SkillDef, WorldCatalog};

#[derive(Debug, thiserror::Error)]
pub enum BestiaryError {
    #[error("Creature not found: {0}")]
    CreatureNotFound(String),
    #[error("Skill not found: {0}")]
    SkillNotFound(String),
}

/// A creature together with the skills it knows.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureView {
    pub creature: CreatureDef,
    pub skills: Vec<SkillDef>,
}

pub struct BestiaryOps {
    catalog: Arc<WorldCatalog>,
}

impl BestiaryOps {
    pub fn new(catalog: Arc<WorldCatalog>) -> Self {
        Self { catalog }
    }

    /// All creatures, or only those of `quality` when it is non-blank.
    pub fn creatures(&self, quality: &str) -> Vec<CreatureDef> {
        self.catalog
            .creatures_of_quality(quality.trim())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn creature(&self, creature_id: &str) -> Result<CreatureView, BestiaryError> {
        let creature = self
            .catalog
            .creature(creature_id.trim())
            .ok_or_else(|| BestiaryError::CreatureNotFound(creature_id.to_string()))?;
        Ok(CreatureView {
            creature: creature.clone(),
            skills: self
                .catalog
                .creature_skills(creature)
                .into_iter()
                .cloned()
                .collect(),
        })
    }

    pub fn skills(&self) -> Vec<SkillDef> {
        self.catalog.skills.clone()
    }

    pub fn skill(&self, skill_id: &str) -> Result<SkillDef, BestiaryError> {
        self.catalog
            .skill(skill_id.trim())
            .cloned()
            .ok_or_else(|| BestiaryError::SkillNotFound(skill_id.to_string()))
    }
}
