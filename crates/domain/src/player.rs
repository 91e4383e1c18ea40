//! Player stats, equipment slots and the derived profile.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::item::{ItemDef, ItemStats};
use crate::world::WorldCatalog;

/// Starting area for new players.
pub const DEFAULT_AREA: &str = "novice_village";

/// Starting location for new players.
pub const DEFAULT_LOCATION: &str = "home";

/// Base stats stored per player, before equipment bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
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

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            hp: 100,
            mp: 50,
            max_hp: 100,
            max_mp: 50,
            gold: 100,
            experience: 0,
            level: 1,
            attack: 10,
            defense: 5,
            critical_rate: 5,
            critical_damage: 150,
        }
    }
}

/// Partial stat update; absent fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsPatch {
    pub hp: Option<i64>,
    pub mp: Option<i64>,
    pub max_hp: Option<i64>,
    pub max_mp: Option<i64>,
    pub gold: Option<i64>,
    pub experience: Option<i64>,
    pub level: Option<i64>,
    pub attack: Option<i64>,
    pub defense: Option<i64>,
    pub critical_rate: Option<i64>,
    pub critical_damage: Option<i64>,
}

impl StatsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl PlayerStats {
    /// Apply a patch with the stat floors and ceilings enforced.
    pub fn apply(&mut self, patch: &StatsPatch) {
        if let Some(v) = patch.hp {
            self.hp = v.max(0);
        }
        if let Some(v) = patch.mp {
            self.mp = v.max(0);
        }
        if let Some(v) = patch.max_hp {
            self.max_hp = v.max(1);
        }
        if let Some(v) = patch.max_mp {
            self.max_mp = v.max(0);
        }
        if let Some(v) = patch.gold {
            self.gold = v.max(0);
        }
        if let Some(v) = patch.experience {
            self.experience = v.max(0);
        }
        if let Some(v) = patch.level {
            self.level = v.max(1);
        }
        if let Some(v) = patch.attack {
            self.attack = v.max(0);
        }
        if let Some(v) = patch.defense {
            self.defense = v.max(0);
        }
        if let Some(v) = patch.critical_rate {
            self.critical_rate = v.clamp(0, 100);
        }
        if let Some(v) = patch.critical_damage {
            self.critical_damage = v.max(100);
        }
    }

    /// Restore HP up to `effective_max`. Returns the amount actually gained.
    pub fn restore_hp(&mut self, amount: i64, effective_max: i64) -> i64 {
        let before = self.hp;
        self.hp = self
            .hp
            .saturating_add(amount.max(0))
            .min(effective_max)
            .max(before);
        self.hp - before
    }

    /// Restore MP up to `effective_max`. Returns the amount actually gained.
    pub fn restore_mp(&mut self, amount: i64, effective_max: i64) -> i64 {
        let before = self.mp;
        self.mp = self
            .mp
            .saturating_add(amount.max(0))
            .min(effective_max)
            .max(before);
        self.mp - before
    }

    /// Add gold, saturating at `i64::MAX`. Returns the amount actually gained.
    pub fn grant_gold(&mut self, amount: i64) -> i64 {
        let before = self.gold;
        self.gold = self.gold.saturating_add(amount.max(0));
        self.gold - before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Helmet,
    Boots,
    Pants,
    Shield,
    Accessory,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 7] = [
        Self::Weapon,
        Self::Armor,
        Self::Helmet,
        Self::Boots,
        Self::Pants,
        Self::Shield,
        Self::Accessory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Helmet => "helmet",
            Self::Boots => "boots",
            Self::Pants => "pants",
            Self::Shield => "shield",
            Self::Accessory => "accessory",
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("Invalid equipment slot: {s}")))
    }
}

/// A stack of one item in a player's bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub item_id: String,
    pub quantity: i64,
}

/// Where a player currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLocation {
    pub area_id: String,
    pub location_id: String,
}

impl Default for PlayerLocation {
    fn default() -> Self {
        Self {
            area_id: DEFAULT_AREA.to_string(),
            location_id: DEFAULT_LOCATION.to_string(),
        }
    }
}

/// Stats after equipment bonuses are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveStats {
    pub hp: i64,
    pub mp: i64,
    pub max_hp: i64,
    pub max_mp: i64,
    pub attack: i64,
    pub defense: i64,
    pub critical_rate: i64,
    pub critical_damage: i64,
    pub bonuses: ItemStats,
}

impl EffectiveStats {
    /// Combine base stats with the bonuses of every equipped item.
    ///
    /// Current HP/MP are clamped to the boosted maximums.
    pub fn compute<'a>(base: &PlayerStats, equipped: impl IntoIterator<Item = &'a ItemDef>) -> Self {
        let bonuses: ItemStats = equipped.into_iter().map(|item| &item.stats).sum();
        let max_hp = base.max_hp + bonuses.hp;
        let max_mp = base.max_mp + bonuses.mp;

        Self {
            hp: base.hp.min(max_hp),
            mp: base.mp.min(max_mp),
            max_hp,
            max_mp,
            attack: base.attack + bonuses.attack,
            defense: base.defense + bonuses.defense,
            critical_rate: base.critical_rate + bonuses.critical_rate,
            critical_damage: base.critical_damage + bonuses.critical_damage,
            bonuses,
        }
    }
}

/// Everything the client shows on the character sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProfile {
    pub username: String,
    pub base: PlayerStats,
    pub effective: EffectiveStats,
    /// Held items with quantities; ids missing from the catalog get placeholders.
    pub inventory: Vec<(ItemDef, i64)>,
    /// Every slot in [`EquipmentSlot::ALL`] order.
    pub equipment: Vec<(EquipmentSlot, Option<ItemDef>)>,
    pub location: PlayerLocation,
}

impl PlayerProfile {
    pub fn assemble(
        username: &str,
        base: PlayerStats,
        inventory: &[InventoryEntry],
        equipment: &BTreeMap<EquipmentSlot, String>,
        location: PlayerLocation,
        catalog: &WorldCatalog,
    ) -> Self {
        let lookup = |item_id: &str| {
            catalog
                .item(item_id)
                .cloned()
                .unwrap_or_else(|| ItemDef::unknown(item_id))
        };

        let equipment: Vec<(EquipmentSlot, Option<ItemDef>)> = EquipmentSlot::ALL
            .into_iter()
            .map(|slot| (slot, equipment.get(&slot).map(|id| lookup(id))))
            .collect();

        let effective =
            EffectiveStats::compute(&base, equipment.iter().filter_map(|(_, item)| item.as_ref()));

        Self {
            username: username.to_string(),
            base,
            effective,
            inventory: inventory
                .iter()
                .map(|entry| (lookup(&entry.item_id), entry.quantity))
                .collect(),
            equipment,
            location,
        }
    }
}
