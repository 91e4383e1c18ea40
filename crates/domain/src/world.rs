//! Static world catalog: areas, locations, items, shops, creatures,
//! location events and narrator personas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::item::ItemDef;
use crate::player::{DEFAULT_AREA, DEFAULT_LOCATION};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub area_id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub area_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDef {
    pub location_id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub area_id: String,
    #[serde(default)]
    pub location_type: String,
    #[serde(default = "default_true")]
    pub is_accessible: bool,
    /// Alternative names the narrator may use in movement directives.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Shown to the player when the narrator moves them here.
    #[serde(default)]
    pub arrival_notice: Option<String>,
}

fn default_true() -> bool {
    true
}

impl LocationDef {
    fn answers_to(&self, name: &str) -> bool {
        self.location_id.eq_ignore_ascii_case(name)
            || self.display_name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopListing {
    pub item_id: String,
    pub price: i64,
    /// Units on hand; -1 means unlimited.
    #[serde(default = "unlimited_stock")]
    pub stock: i64,
}

/// Stock value meaning "never runs out".
pub const UNLIMITED_STOCK: i64 = -1;

fn unlimited_stock() -> i64 {
    UNLIMITED_STOCK
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopDef {
    pub shop_id: String,
    pub shop_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shop_type: String,
    pub location_id: String,
    #[serde(default)]
    pub items: Vec<ShopListing>,
}

impl ShopDef {
    pub fn listing(&self, item_id: &str) -> Option<&ShopListing> {
        self.items.iter().find(|l| l.item_id == item_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldRange {
    #[serde(default)]
    pub min: i64,
    #[serde(default)]
    pub max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureStats {
    #[serde(default = "default_creature_hp")]
    pub hp: i64,
    #[serde(default = "default_creature_attack")]
    pub attack: i64,
    #[serde(default = "default_creature_defense")]
    pub defense: i64,
}

fn default_creature_hp() -> i64 {
    30
}

fn default_creature_attack() -> i64 {
    8
}

fn default_creature_defense() -> i64 {
    3
}

impl Default for CreatureStats {
    fn default() -> Self {
        Self {
            hp: default_creature_hp(),
            attack: default_creature_attack(),
            defense: default_creature_defense(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureDef {
    pub creature_id: String,
    pub creature_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub base_stats: CreatureStats,
    #[serde(default)]
    pub experience_reward: Option<i64>,
    #[serde(default)]
    pub gold_reward: Option<GoldRange>,
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Skill ids from the skills catalog.
    #[serde(default)]
    pub skills: Vec<String>,
}

fn default_quality() -> String {
    "common".to_string()
}

/// Stat multiplier for a creature quality tier. Unknown tiers count as common.
pub fn quality_multiplier(quality: &str) -> f64 {
    match quality {
        "rare" => 1.3,
        "hero" => 1.6,
        "epic" => 2.0,
        "legendary" => 2.5,
        _ => 1.0,
    }
}

/// Battle-ready view of a creature handed to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    pub avatar: String,
    pub hp: i64,
    pub max_hp: i64,
    pub attack: i64,
    pub defense: i64,
    pub exp: i64,
    pub gold: i64,
}

impl CreatureDef {
    pub fn quality_multiplier(&self) -> f64 {
        quality_multiplier(&self.quality)
    }

    /// Attack after the quality multiplier, truncated.
    pub fn effective_attack(&self) -> i64 {
        (self.base_stats.attack as f64 * self.quality_multiplier()) as i64
    }

    pub fn effective_hp(&self) -> i64 {
        (self.base_stats.hp as f64 * self.quality_multiplier()) as i64
    }

    pub fn to_enemy(&self) -> Enemy {
        Enemy {
            name: self.creature_name.clone(),
            avatar: self.avatar.clone().unwrap_or_else(|| "👹".to_string()),
            hp: self.base_stats.hp,
            max_hp: self.base_stats.hp,
            attack: self.base_stats.attack,
            defense: self.base_stats.defense,
            exp: self.experience_reward.unwrap_or(15),
            gold: self.gold_reward.map_or(5, |g| g.max),
        }
    }
}

/// A combat skill creatures can use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub skill_id: String,
    pub name: String,
    /// Description for skills that do more than deal damage.
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default = "default_damage_multiplier")]
    pub damage_multiplier: f64,
    #[serde(default)]
    pub mp_cost: i64,
}

fn default_damage_multiplier() -> f64 {
    1.0
}

// =============================================================================
// Location events
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub event_id: String,
    pub event_name: String,
    #[serde(default)]
    pub description: String,
    pub event_type: String,
    /// If set, the player must stand here to trigger the event.
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub event_data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSpawn {
    pub creature_id: String,
    #[serde(default = "default_chance")]
    pub spawn_chance: f64,
}

fn default_chance() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FightEvent {
    #[serde(default)]
    pub creatures: Vec<CreatureSpawn>,
    #[serde(default = "default_battle_type")]
    pub battle_type: String,
    #[serde(default)]
    pub safe_battle: bool,
    #[serde(default = "default_true")]
    pub flee_allowed: bool,
}

fn default_battle_type() -> String {
    "creature".to_string()
}

impl FightEvent {
    /// First spawn whose roll lands under its chance. One roll per candidate.
    pub fn pick_spawn(&self, mut roll: impl FnMut() -> f64) -> Option<&CreatureSpawn> {
        self.creatures.iter().find(|c| roll() < c.spawn_chance)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopEvent {
    #[serde(default = "default_general")]
    pub shop_type: String,
    #[serde(default = "default_unknown")]
    pub shop_id: String,
    #[serde(default)]
    pub auto_open_shop: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealingEvent {
    #[serde(default = "default_chance")]
    pub heal_percentage: f64,
    #[serde(default = "default_chance")]
    pub restore_mp_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatheringEvent {
    #[serde(default = "default_general")]
    pub gathering_type: String,
    #[serde(default = "default_success_chance")]
    pub success_chance: f64,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

fn default_success_chance() -> f64 {
    0.8
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepairEvent {
    #[serde(default = "default_repair_multiplier")]
    pub repair_cost_multiplier: f64,
}

fn default_repair_multiplier() -> f64 {
    0.1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResearchEvent {
    #[serde(default = "default_general")]
    pub research_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasureItem {
    pub item_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreasureEvent {
    #[serde(default = "default_treasure_type")]
    pub treasure_type: String,
    #[serde(default)]
    pub items: Vec<TreasureItem>,
    #[serde(default)]
    pub gold_reward: GoldRange,
}

fn default_treasure_type() -> String {
    "item".to_string()
}

fn default_general() -> String {
    "general".to_string()
}

fn default_unknown() -> String {
    "unknown".to_string()
}

/// Typed view of an event's `event_data`.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Fight(FightEvent),
    Shop(ShopEvent),
    Healing(HealingEvent),
    Gathering(GatheringEvent),
    Repair(RepairEvent),
    Research(ResearchEvent),
    Treasure(TreasureEvent),
    Other,
}

impl EventDef {
    pub fn kind(&self) -> Result<EventKind, DomainError> {
        // Missing event_data behaves like an empty object.
        let data = match &self.event_data {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other.clone(),
        };

        fn parse<T: serde::de::DeserializeOwned>(
            event_id: &str,
            data: serde_json::Value,
        ) -> Result<T, DomainError> {
            serde_json::from_value(data)
                .map_err(|e| DomainError::parse(format!("Bad event_data for {event_id}: {e}")))
        }

        let id = self.event_id.as_str();
        Ok(match self.event_type.as_str() {
            "fight" => EventKind::Fight(parse(id, data)?),
            "shop" => EventKind::Shop(parse(id, data)?),
            "healing" => EventKind::Healing(parse(id, data)?),
            "gathering" => EventKind::Gathering(parse(id, data)?),
            "repair" => EventKind::Repair(parse(id, data)?),
            "research" => EventKind::Research(parse(id, data)?),
            "treasure" => EventKind::Treasure(parse(id, data)?),
            _ => EventKind::Other,
        })
    }
}

/// One entry in a player's event log.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTrigger {
    pub event_id: String,
    pub event_name: String,
    pub event_type: String,
    pub triggered_at: DateTime<Utc>,
}

impl EventTrigger {
    pub fn new(event: &EventDef, triggered_at: DateTime<Utc>) -> Self {
        Self {
            event_id: event.event_id.clone(),
            event_name: event.event_name.clone(),
            event_type: event.event_type.clone(),
            triggered_at,
        }
    }
}

// =============================================================================
// Personas
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub system_prompt: String,
}

impl Persona {
    /// Fallback narrator used when no persona file is configured.
    pub fn default_narrator() -> Self {
        Self {
            name: "Dungeon Master".to_string(),
            system_prompt: "You are the game master of a fantasy text adventure. \
                Describe the world vividly, voice every non-player character and \
                keep the story moving. When the player travels somewhere, end your \
                reply with MOVE_TO:<location_id>."
                .to_string(),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Everything loaded from the world data directory.
#[derive(Debug, Clone, Default)]
pub struct WorldCatalog {
    pub areas: Vec<Area>,
    pub locations: Vec<LocationDef>,
    pub items: Vec<ItemDef>,
    pub shops: Vec<ShopDef>,
    pub creatures: Vec<CreatureDef>,
    pub skills: Vec<SkillDef>,
    pub events: Vec<EventDef>,
    pub personas: Vec<Persona>,
}

impl WorldCatalog {
    pub fn area(&self, area_id: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.area_id == area_id)
    }

    pub fn location(&self, location_id: &str) -> Option<&LocationDef> {
        self.locations.iter().find(|l| l.location_id == location_id)
    }

    /// Look up a location by id, then by alias or display name.
    pub fn resolve_location(&self, name: &str) -> Option<&LocationDef> {
        let name = name.trim();
        self.location(name)
            .or_else(|| self.locations.iter().find(|l| l.answers_to(name)))
    }

    /// Locations of an area sorted by type, then display name.
    pub fn locations_in_area(&self, area_id: &str) -> Vec<&LocationDef> {
        let mut found: Vec<&LocationDef> = self
            .locations
            .iter()
            .filter(|l| l.area_id == area_id)
            .collect();
        found.sort_by(|a, b| {
            a.location_type
                .cmp(&b.location_type)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        found
    }

    pub fn item(&self, item_id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    /// Filter items by free text, type and rarity. Empty filters match all.
    pub fn search_items(&self, query: &str, item_type: &str, rarity: &str) -> Vec<&ItemDef> {
        let query = query.trim();
        self.items
            .iter()
            .filter(|i| query.is_empty() || i.matches_text(query))
            .filter(|i| item_type.is_empty() || i.item_type == item_type)
            .filter(|i| rarity.is_empty() || i.rarity == rarity)
            .collect()
    }

    pub fn shop(&self, shop_id: &str) -> Option<&ShopDef> {
        self.shops.iter().find(|s| s.shop_id == shop_id)
    }

    pub fn shop_at(&self, location_id: &str) -> Option<&ShopDef> {
        self.shops.iter().find(|s| s.location_id == location_id)
    }

    pub fn creature(&self, creature_id: &str) -> Option<&CreatureDef> {
        self.creatures.iter().find(|c| c.creature_id == creature_id)
    }

    /// Creatures of one quality tier, or all of them when `quality` is empty.
    pub fn creatures_of_quality(&self, quality: &str) -> Vec<&CreatureDef> {
        self.creatures
            .iter()
            .filter(|c| quality.is_empty() || c.quality == quality)
            .collect()
    }

    pub fn skill(&self, skill_id: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.skill_id == skill_id)
    }

    /// Skills a creature knows, in its listed order. Unknown ids are skipped.
    pub fn creature_skills(&self, creature: &CreatureDef) -> Vec<&SkillDef> {
        creature
            .skills
            .iter()
            .filter_map(|id| self.skill(id))
            .collect()
    }

    pub fn event(&self, event_id: &str) -> Option<&EventDef> {
        self.events.iter().find(|e| e.event_id == event_id)
    }

    /// Persona by name, falling back to the default narrator.
    pub fn persona(&self, name: Option<&str>) -> Persona {
        name.and_then(|n| self.personas.iter().find(|p| p.name == n))
            .or_else(|| self.personas.first())
            .cloned()
            .unwrap_or_else(Persona::default_narrator)
    }

    /// Areas and locations used when no locations file is present.
    pub fn default_village() -> (Vec<Area>, Vec<LocationDef>) {
        let area = Area {
            area_id: DEFAULT_AREA.to_string(),
            display_name: "Novice Village".to_string(),
            description: "A quiet village where every adventure begins.".to_string(),
            area_type: "village".to_string(),
        };

        let loc = |id: &str, name: &str, ty: &str, desc: &str, aliases: &[&str]| LocationDef {
            location_id: id.to_string(),
            display_name: name.to_string(),
            description: desc.to_string(),
            area_id: DEFAULT_AREA.to_string(),
            location_type: ty.to_string(),
            is_accessible: true,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            arrival_notice: None,
        };

        let locations = vec![
            loc(DEFAULT_LOCATION, "Home", "residence", "Your cottage at the edge of the village.", &["house"]),
            loc("market", "Market", "commerce", "Stalls full of traders and travellers.", &["bazaar"]),
            loc("blacksmith", "Blacksmith", "commerce", "A hot forge ringing with hammer blows.", &["forge", "smithy"]),
            loc("library", "Library", "knowledge", "Dusty shelves of old tomes and maps.", &["archive"]),
            loc("forest", "Forest", "wilderness", "Dark woods just beyond the village fence.", &["woods"]),
        ];

        (vec![area], locations)
    }
}
