//! Map, shop and persona DTOs.

use serde::{Deserialize, Serialize};

use emberhall_domain::{
    Area, CreatureDef, CreatureStats, EventTrigger, GoldRange, ItemDef, ItemStats, LocationDef,
    Persona, ShopDef,
};

use crate::time::to_epoch_secs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDto {
    pub area_id: String,
    pub area_display_name: String,
    pub location_id: String,
    pub location_display_name: String,
    pub description: String,
    pub location_type: String,
    pub is_accessible: bool,
}

impl LocationDto {
    pub fn new(location: &LocationDef, area: Option<&Area>) -> Self {
        Self {
            area_id: location.area_id.clone(),
            area_display_name: area
                .map(|a| a.display_name.clone())
                .unwrap_or_else(|| location.area_id.clone()),
            location_id: location.location_id.clone(),
            location_display_name: location.display_name.clone(),
            description: location.description.clone(),
            location_type: location.location_type.clone(),
            is_accessible: location.is_accessible,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaDto {
    pub name: String,
    pub system_prompt: String,
}

impl From<&Persona> for PersonaDto {
    fn from(p: &Persona) -> Self {
        Self {
            name: p.name.clone(),
            system_prompt: p.system_prompt.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopDto {
    pub shop_id: String,
    pub shop_name: String,
    pub description: String,
    pub shop_type: String,
    pub location_id: String,
}

impl From<&ShopDef> for ShopDto {
    fn from(s: &ShopDef) -> Self {
        Self {
            shop_id: s.shop_id.clone(),
            shop_name: s.shop_name.clone(),
            description: s.description.clone(),
            shop_type: s.shop_type.clone(),
            location_id: s.location_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItemDto {
    pub item_id: String,
    pub item_name: String,
    pub description: String,
    pub item_type: String,
    pub rarity: String,
    pub effect: Option<String>,
    pub stats: ItemStats,
    pub price: i64,
    /// -1 means unlimited.
    pub stock: i64,
}

impl ShopItemDto {
    pub fn new(item: &ItemDef, price: i64, stock: i64) -> Self {
        Self {
            item_id: item.item_id.clone(),
            item_name: item.item_name.clone(),
            description: item.description.clone(),
            item_type: item.item_type.clone(),
            rarity: item.rarity.clone(),
            effect: item.effect.clone(),
            stats: item.stats,
            price,
            stock,
        }
    }
}

/// Catalog creature with its quality-scaled stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureDto {
    pub creature_id: String,
    pub creature_name: String,
    pub avatar: Option<String>,
    pub quality: String,
    pub base_stats: CreatureStats,
    pub experience_reward: Option<i64>,
    pub gold_reward: Option<GoldRange>,
    pub skills: Vec<String>,
    pub quality_multiplier: f64,
    pub effective_attack: i64,
    pub effective_hp: i64,
}

impl From<&CreatureDef> for CreatureDto {
    fn from(c: &CreatureDef) -> Self {
        Self {
            creature_id: c.creature_id.clone(),
            creature_name: c.creature_name.clone(),
            avatar: c.avatar.clone(),
            quality: c.quality.clone(),
            base_stats: c.base_stats,
            experience_reward: c.experience_reward,
            gold_reward: c.gold_reward,
            skills: c.skills.clone(),
            quality_multiplier: c.quality_multiplier(),
            effective_attack: c.effective_attack(),
            effective_hp: c.effective_hp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTriggerDto {
    pub event_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub triggered_at: f64,
}

impl From<&EventTrigger> for EventTriggerDto {
    fn from(t: &EventTrigger) -> Self {
        Self {
            event_id: t.event_id.clone(),
            name: t.event_name.clone(),
            event_type: t.event_type.clone(),
            triggered_at: to_epoch_secs(t.triggered_at),
        }
    }
}
