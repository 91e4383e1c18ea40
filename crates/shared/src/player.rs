//! Character sheet and chat history DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use emberhall_domain::{
    ChatTurn, EffectiveStats, ItemDef, ItemStats, PlayerLocation, PlayerProfile, PlayerStats,
};

use crate::time::to_epoch_secs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDto {
    pub hp: i64,
    pub mp: i64,
    pub max_hp: i64,
    pub max_mp: i64,
    pub gold: i64,
    pub experience: i64,
    pub level: i64,
    pub attack: i64,
    pub defense: i64,
    pub critical_rate: i64,
    pub critical_damage: i64,
}

impl StatsDto {
    /// Effective values, with gold, experience and level taken from the base.
    pub fn effective(base: &PlayerStats, effective: &EffectiveStats) -> Self {
        Self {
            hp: effective.hp,
            mp: effective.mp,
            max_hp: effective.max_hp,
            max_mp: effective.max_mp,
            gold: base.gold,
            experience: base.experience,
            level: base.level,
            attack: effective.attack,
            defense: effective.defense,
            critical_rate: effective.critical_rate,
            critical_damage: effective.critical_damage,
        }
    }
}

impl From<&PlayerStats> for StatsDto {
    fn from(s: &PlayerStats) -> Self {
        Self {
            hp: s.hp,
            mp: s.mp,
            max_hp: s.max_hp,
            max_mp: s.max_mp,
            gold: s.gold,
            experience: s.experience,
            level: s.level,
            attack: s.attack,
            defense: s.defense,
            critical_rate: s.critical_rate,
            critical_damage: s.critical_damage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItemDto {
    pub item_id: String,
    pub item_name: String,
    pub description: String,
    pub item_type: String,
    pub rarity: String,
    pub quantity: i64,
    pub effect: Option<String>,
    pub stats: ItemStats,
}

impl InventoryItemDto {
    pub fn new(item: &ItemDef, quantity: i64) -> Self {
        Self {
            item_id: item.item_id.clone(),
            item_name: item.item_name.clone(),
            description: item.description.clone(),
            item_type: item.item_type.clone(),
            rarity: item.rarity.clone(),
            quantity,
            effect: item.effect.clone(),
            stats: item.stats,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquippedItemDto {
    pub item_id: String,
    pub item_name: String,
    pub stats: ItemStats,
}

impl From<&ItemDef> for EquippedItemDto {
    fn from(item: &ItemDef) -> Self {
        Self {
            item_id: item.item_id.clone(),
            item_name: item.item_name.clone(),
            stats: item.stats,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDto {
    pub username: String,
    /// Stats with equipment bonuses applied.
    pub stats: StatsDto,
    pub base_stats: StatsDto,
    pub equipment_bonuses: ItemStats,
    pub inventory: Vec<InventoryItemDto>,
    /// Keyed by slot name; empty slots are `null`.
    pub equipment: BTreeMap<String, Option<EquippedItemDto>>,
    pub location: PlayerLocation,
}

impl From<&PlayerProfile> for ProfileDto {
    fn from(p: &PlayerProfile) -> Self {
        Self {
            username: p.username.clone(),
            stats: StatsDto::effective(&p.base, &p.effective),
            base_stats: StatsDto::from(&p.base),
            equipment_bonuses: p.effective.bonuses,
            inventory: p
                .inventory
                .iter()
                .map(|(item, qty)| InventoryItemDto::new(item, *qty))
                .collect(),
            equipment: p
                .equipment
                .iter()
                .map(|(slot, item)| {
                    (slot.as_str().to_string(), item.as_ref().map(EquippedItemDto::from))
                })
                .collect(),
            location: p.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurnDto {
    pub role: String,
    pub content: String,
    pub timestamp: f64,
}

impl From<&ChatTurn> for ChatTurnDto {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
            timestamp: to_epoch_secs(turn.timestamp),
        }
    }
}
