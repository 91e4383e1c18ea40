//! Item catalog entries and consumable effects.

use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::player::EquipmentSlot;

/// Stat bonuses an item grants while equipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemStats {
    pub attack: i64,
    pub defense: i64,
    pub hp: i64,
    pub mp: i64,
    pub critical_rate: i64,
    pub critical_damage: i64,
}

impl AddAssign for ItemStats {
    fn add_assign(&mut self, rhs: Self) {
        self.attack += rhs.attack;
        self.defense += rhs.defense;
        self.hp += rhs.hp;
        self.mp += rhs.mp;
        self.critical_rate += rhs.critical_rate;
        self.critical_damage += rhs.critical_damage;
    }
}

impl<'a> std::iter::Sum<&'a ItemStats> for ItemStats {
    fn sum<I: Iterator<Item = &'a ItemStats>>(iter: I) -> Self {
        iter.fold(ItemStats::default(), |mut acc, s| {
            acc += *s;
            acc
        })
    }
}

/// An entry from `items.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub item_id: String,
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_item_type")]
    pub item_type: String,
    #[serde(default = "default_rarity")]
    pub rarity: String,
    #[serde(default)]
    pub base_price: i64,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub stats: ItemStats,
    /// Equipment slot the item fits, if restricted.
    #[serde(default)]
    pub slot: Option<EquipmentSlot>,
}

fn default_item_type() -> String {
    "misc".to_string()
}

fn default_rarity() -> String {
    "common".to_string()
}

impl ItemDef {
    /// Placeholder for an id that is held but no longer in the catalog.
    pub fn unknown(item_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            item_name: format!("Unknown item ({item_id})"),
            description: String::new(),
            item_type: "unknown".to_string(),
            rarity: "common".to_string(),
            base_price: 0,
            effect: None,
            stats: ItemStats::default(),
            slot: None,
        }
    }

    pub fn parsed_effect(&self) -> Option<ItemEffect> {
        self.effect.as_deref().and_then(ItemEffect::parse)
    }

    /// Case-insensitive match on name or description.
    pub fn matches_text(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.item_name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}

/// A consumable effect such as `HP+20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEffect {
    RestoreHp(i64),
    RestoreMp(i64),
    GrantGold(i64),
}

impl ItemEffect {
    /// Parse `HP+n`, `MP+n` or `gold+n`. Returns None for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let (stat, amount) = raw.trim().split_once('+')?;
        let amount: i64 = amount.trim().parse().ok()?;
        match stat.trim().to_ascii_lowercase().as_str() {
            "hp" => Some(Self::RestoreHp(amount)),
            "mp" => Some(Self::RestoreMp(amount)),
            "gold" => Some(Self::GrantGold(amount)),
            _ => None,
        }
    }

    /// The same effect applied `quantity` times. None if the total overflows.
    pub fn times(self, quantity: i64) -> Option<Self> {
        Some(match self {
            Self::RestoreHp(n) => Self::RestoreHp(n.checked_mul(quantity)?),
            Self::RestoreMp(n) => Self::RestoreMp(n.checked_mul(quantity)?),
            Self::GrantGold(n) => Self::GrantGold(n.checked_mul(quantity)?),
        })
    }
}

impl fmt::Display for ItemEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestoreHp(n) => write!(f, "HP +{n}"),
            Self::RestoreMp(n) => write!(f, "MP +{n}"),
            Self::GrantGold(n) => write!(f, "gold +{n}"),
        }
    }
}
