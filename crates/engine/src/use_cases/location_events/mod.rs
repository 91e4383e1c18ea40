//! Location event use cases.
//!
//! Events are configured per location in the world catalog. Triggering one
//! resolves its typed payload, applies any state change it implies (healing,
//! treasure) and reports the result for the client to present. Every
//! successful trigger is appended to the player's event history.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use emberhall_domain::{
    DomainError, EventDef, EventKind, EventTrigger, FightEvent, HealingEvent, TreasureEvent,
    WorldCatalog,
};

use crate::infrastructure::ports::{
    ClockPort, EventHistoryRepo, PlayerRepo, RandomPort, RepoError,
};
use crate::use_cases::map::{MapError, MapOps};
use crate::use_cases::profile::load_profile;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Event not found: {0}")]
    EventNotFound(String),
    #[error("This event happens at {required}, but you are at {current}")]
    WrongLocation { required: String, current: String },
    #[error("{0}")]
    InvalidData(#[from] DomainError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// What happened when an event fired.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    pub event_id: String,
    pub event_type: String,
    pub message: String,
    /// Kind-specific fields flattened into the response.
    pub details: Map<String, Value>,
}

/// History entries returned when the caller gives no limit.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const MAX_HISTORY_LIMIT: usize = 100;

pub struct TriggerEvent {
    players: Arc<dyn PlayerRepo>,
    history: Arc<dyn EventHistoryRepo>,
    map: Arc<MapOps>,
    catalog: Arc<WorldCatalog>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl TriggerEvent {
    pub fn new(
        players: Arc<dyn PlayerRepo>,
        history: Arc<dyn EventHistoryRepo>,
        map: Arc<MapOps>,
        catalog: Arc<WorldCatalog>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            players,
            history,
            map,
            catalog,
            clock,
            random,
        }
    }

    pub async fn execute(&self, username: &str, event_id: &str) -> Result<EventOutcome, EventError> {
        let event = self
            .catalog
            .event(event_id)
            .ok_or_else(|| EventError::EventNotFound(event_id.to_string()))?;

        if let Some(required) = &event.location_id {
            let current = self.map.player_location(username).await?;
            if &current.location_id != required {
                return Err(EventError::WrongLocation {
                    required: required.clone(),
                    current: current.location_id,
                });
            }
        }

        let mut outcome = EventOutcome {
            event_id: event.event_id.clone(),
            event_type: event.event_type.clone(),
            message: default_message(event),
            details: Map::new(),
        };

        match event.kind()? {
            EventKind::Fight(fight) => self.fight(&fight, &mut outcome),
            EventKind::Shop(shop) => {
                outcome.details.insert("shop_id".into(), json!(shop.shop_id));
                outcome.details.insert("shop_type".into(), json!(shop.shop_type));
                outcome
                    .details
                    .insert("auto_open_shop".into(), json!(shop.auto_open_shop));
            }
            EventKind::Healing(healing) => self.heal(username, &healing, &mut outcome).await?,
            EventKind::Gathering(gathering) => {
                outcome
                    .details
                    .insert("gathering_type".into(), json!(gathering.gathering_type));
                outcome
                    .details
                    .insert("success_chance".into(), json!(gathering.success_chance));
                outcome.details.insert("items".into(), json!(gathering.items));
            }
            EventKind::Repair(repair) => {
                outcome.details.insert(
                    "repair_cost_multiplier".into(),
                    json!(repair.repair_cost_multiplier),
                );
            }
            EventKind::Research(research) => {
                outcome
                    .details
                    .insert("research_type".into(), json!(research.research_type));
            }
            EventKind::Treasure(treasure) => {
                self.open_treasure(username, &treasure, &mut outcome).await?
            }
            EventKind::Other => {}
        }

        // The event already took effect, so a failed log write only warns.
        let trigger = EventTrigger::new(event, self.clock.now());
        if let Err(e) = self.history.record(username, &trigger).await {
            tracing::warn!(
                username,
                event_id = %trigger.event_id,
                error = %e,
                "Failed to record event trigger"
            );
        }

        tracing::info!(
            username,
            event_id = %outcome.event_id,
            event_type = %outcome.event_type,
            "Location event triggered"
        );
        Ok(outcome)
    }

    fn fight(&self, fight: &FightEvent, outcome: &mut EventOutcome) {
        outcome
            .details
            .insert("battle_type".into(), json!(fight.battle_type));
        outcome
            .details
            .insert("safe_battle".into(), json!(fight.safe_battle));
        outcome
            .details
            .insert("flee_allowed".into(), json!(fight.flee_allowed));

        let Some(spawn) = fight.pick_spawn(|| self.random.gen_unit()) else {
            outcome.message = "No creature appeared".to_string();
            return;
        };

        match self.catalog.creature(&spawn.creature_id) {
            Some(creature) => {
                let enemy = creature.to_enemy();
                outcome.message = format!("A wild {} appears!", enemy.name);
                outcome.details.insert("enemy".into(), json!(enemy));
            }
            None => {
                tracing::warn!(creature_id = %spawn.creature_id, "Fight event names unknown creature");
                outcome.message = format!("Creature definition missing: {}", spawn.creature_id);
                outcome
                    .details
                    .insert("missing_creature".into(), json!(spawn.creature_id));
            }
        }
    }

    async fn heal(
        &self,
        username: &str,
        healing: &HealingEvent,
        outcome: &mut EventOutcome,
    ) -> Result<(), EventError> {
        let profile = load_profile(self.players.as_ref(), &self.catalog, username).await?;
        let max_hp = profile.effective.max_hp;
        let max_mp = profile.effective.max_mp;

        let mut stats = profile.base;
        let hp_restored = stats.restore_hp(scaled(max_hp, healing.heal_percentage), max_hp);
        let mp_restored = stats.restore_mp(scaled(max_mp, healing.restore_mp_percentage), max_mp);
        self.players.save_stats(username, &stats).await?;

        outcome.message = format!("Restored {hp_restored} HP and {mp_restored} MP");
        outcome.details.insert("hp_restored".into(), json!(hp_restored));
        outcome.details.insert("mp_restored".into(), json!(mp_restored));
        outcome.details.insert("current_hp".into(), json!(stats.hp));
        outcome.details.insert("current_mp".into(), json!(stats.mp));
        Ok(())
    }

    async fn open_treasure(
        &self,
        username: &str,
        treasure: &TreasureEvent,
        outcome: &mut EventOutcome,
    ) -> Result<(), EventError> {
        let mut granted = Vec::new();
        for entry in &treasure.items {
            let Some(item) = self.catalog.item(&entry.item_id) else {
                tracing::warn!(item_id = %entry.item_id, "Treasure lists unknown item");
                continue;
            };
            if entry.quantity < 1 {
                continue;
            }
            self.players
                .add_item(username, &entry.item_id, entry.quantity)
                .await?;
            granted.push(json!({
                "item_id": item.item_id,
                "item_name": item.item_name,
                "quantity": entry.quantity,
            }));
        }

        let reward = treasure.gold_reward;
        let gold = if reward.max > 0 {
            self.random.gen_range(reward.min.max(0), reward.max)
        } else {
            0
        };
        if gold > 0 {
            let profile = load_profile(self.players.as_ref(), &self.catalog, username).await?;
            let mut stats = profile.base;
            stats.grant_gold(gold);
            self.players.save_stats(username, &stats).await?;
        }

        outcome.message = format!("Found {} item(s) and {} gold", granted.len(), gold);
        outcome
            .details
            .insert("treasure_type".into(), json!(treasure.treasure_type));
        outcome.details.insert("items".into(), Value::Array(granted));
        outcome.details.insert("gold".into(), json!(gold));
        Ok(())
    }
}

/// Reads a player's event history.
pub struct EventHistoryOps {
    history: Arc<dyn EventHistoryRepo>,
}

impl EventHistoryOps {
    pub fn new(history: Arc<dyn EventHistoryRepo>) -> Self {
        Self { history }
    }

    /// Newest first. `limit` defaults to [`DEFAULT_HISTORY_LIMIT`] and is capped
    /// at [`MAX_HISTORY_LIMIT`].
    pub async fn recent(
        &self,
        username: &str,
        limit: Option<usize>,
    ) -> Result<Vec<EventTrigger>, EventError> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .min(MAX_HISTORY_LIMIT);
        Ok(self.history.recent(username, limit).await?)
    }
}

fn default_message(event: &EventDef) -> String {
    if event.description.trim().is_empty() {
        event.event_name.clone()
    } else {
        event.description.clone()
    }
}

fn scaled(max: i64, fraction: f64) -> i64 {
    (max as f64 * fraction).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::ports::{MockEventHistoryRepo, MockPlayerRepo, MockRandomPort};
    use chrono::{DateTime, TimeZone, Utc};
    use emberhall_domain::{
        CreatureDef, GoldRange, ItemDef, PlayerLocation, PlayerStats,
    };
    use std::collections::BTreeMap;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    fn event(id: &str, event_type: &str, location: Option<&str>, data: Value) -> EventDef {
        EventDef {
            event_id: id.to_string(),
            event_name: format!("{id} event"),
            description: String::new(),
            event_type: event_type.to_string(),
            location_id: location.map(str::to_string),
            event_data: data,
        }
    }

    fn catalog() -> WorldCatalog {
        let (areas, locations) = WorldCatalog::default_village();
        WorldCatalog {
            areas,
            locations,
            items: vec![ItemDef {
                item_name: "Herb".to_string(),
                ..ItemDef::unknown("herb")
            }],
            creatures: vec![CreatureDef {
                creature_id: "slime".to_string(),
                creature_name: "Slime".to_string(),
                avatar: None,
                base_stats: Default::default(),
                experience_reward: Some(4),
                gold_reward: Some(GoldRange { min: 1, max: 3 }),
                quality: "common".to_string(),
                skills: vec![],
            }],
            events: vec![
                event(
                    "forest_fight",
                    "fight",
                    Some("forest"),
                    json!({"creatures": [
                        {"creature_id": "slime", "spawn_chance": 0.5}
                    ]}),
                ),
                event("spring", "healing", None, json!({"heal_percentage": 0.5})),
                event(
                    "chest",
                    "treasure",
                    None,
                    json!({"items": [{"item_id": "herb", "quantity": 2}, {"item_id": "nope"}],
                           "gold_reward": {"min": 10, "max": 20}}),
                ),
                event("bell", "festival", None, Value::Null),
            ],
            ..WorldCatalog::default()
        }
    }

    fn players_at(location_id: &'static str, stats: PlayerStats) -> MockPlayerRepo {
        let mut players = MockPlayerRepo::new();
        players.expect_get_location().returning(move |_| {
            Ok(Some(PlayerLocation {
                area_id: "novice_village".to_string(),
                location_id: location_id.to_string(),
            }))
        });
        players.expect_get_stats().returning(move |_| Ok(Some(stats)));
        players.expect_get_inventory().returning(|_| Ok(vec![]));
        players
            .expect_get_equipment()
            .returning(|_| Ok(BTreeMap::new()));
        players
    }

    fn accepting_history() -> MockEventHistoryRepo {
        let mut history = MockEventHistoryRepo::new();
        history.expect_record().returning(|_, _| Ok(()));
        history
    }

    fn trigger_with_history(
        players: MockPlayerRepo,
        history: MockEventHistoryRepo,
        random: impl RandomPort + 'static,
    ) -> TriggerEvent {
        let players: Arc<dyn PlayerRepo> = Arc::new(players);
        let catalog = Arc::new(catalog());
        let map = Arc::new(MapOps::new(players.clone(), catalog.clone()));
        TriggerEvent::new(
            players,
            Arc::new(history),
            map,
            catalog,
            Arc::new(FixedClock(noon())),
            Arc::new(random),
        )
    }

    fn trigger(players: MockPlayerRepo, random: impl RandomPort + 'static) -> TriggerEvent {
        trigger_with_history(players, accepting_history(), random)
    }

    #[tokio::test]
    async fn fight_spawns_when_roll_is_under_chance() {
        let outcome = trigger(
            players_at("forest", PlayerStats::default()),
            FixedRandom { int: 0, unit: 0.2 },
        )
        .execute("ada", "forest_fight")
        .await
        .expect("trigger");

        assert_eq!(outcome.message, "A wild Slime appears!");
        assert_eq!(outcome.details["enemy"]["gold"], json!(3));
        assert_eq!(outcome.details["enemy"]["exp"], json!(4));
        assert_eq!(outcome.details["flee_allowed"], json!(true));
    }

    #[tokio::test]
    async fn fight_without_spawn_reports_no_creature() {
        let mut random = MockRandomPort::new();
        random.expect_gen_unit().times(1).return_const(0.9);

        let outcome = trigger(players_at("forest", PlayerStats::default()), random)
            .execute("ada", "forest_fight")
            .await
            .expect("trigger");

        assert_eq!(outcome.message, "No creature appeared");
        assert!(!outcome.details.contains_key("enemy"));
    }

    #[tokio::test]
    async fn event_at_another_location_is_refused() {
        let err = trigger(
            players_at("home", PlayerStats::default()),
            FixedRandom { int: 0, unit: 0.0 },
        )
        .execute("ada", "forest_fight")
        .await
        .expect_err("wrong place");

        assert!(matches!(err, EventError::WrongLocation { .. }));
    }

    #[tokio::test]
    async fn healing_restores_a_share_of_max() {
        let stats = PlayerStats {
            hp: 10,
            mp: 50,
            ..PlayerStats::default()
        };
        let mut players = players_at("home", stats);
        players
            .expect_save_stats()
            .withf(|_, stats| stats.hp == 60 && stats.mp == 50)
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = trigger(players, FixedRandom { int: 0, unit: 0.0 })
            .execute("ada", "spring")
            .await
            .expect("trigger");

        assert_eq!(outcome.details["hp_restored"], json!(50));
        assert_eq!(outcome.details["mp_restored"], json!(0));
    }

    #[tokio::test]
    async fn treasure_grants_known_items_and_random_gold() {
        let mut players = players_at("home", PlayerStats::default());
        players
            .expect_add_item()
            .withf(|_, item_id, quantity| item_id == "herb" && *quantity == 2)
            .times(1)
            .returning(|_, _, _| Ok(()));
        players
            .expect_save_stats()
            .withf(|_, stats| stats.gold == 115)
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = trigger(players, FixedRandom { int: 15, unit: 0.0 })
            .execute("ada", "chest")
            .await
            .expect("trigger");

        assert_eq!(outcome.details["gold"], json!(15));
        assert_eq!(outcome.details["items"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn unknown_event_type_returns_base_response() {
        let outcome = trigger(
            players_at("home", PlayerStats::default()),
            FixedRandom { int: 0, unit: 0.0 },
        )
        .execute("ada", "bell")
        .await
        .expect("trigger");

        assert_eq!(outcome.event_type, "festival");
        assert_eq!(outcome.message, "bell event");
        assert!(outcome.details.is_empty());
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let err = trigger(MockPlayerRepo::new(), FixedRandom { int: 0, unit: 0.0 })
            .execute("ada", "ghost")
            .await
            .expect_err("missing");

        assert!(matches!(err, EventError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn successful_trigger_is_recorded_at_clock_time() {
        let mut history = MockEventHistoryRepo::new();
        history
            .expect_record()
            .withf(|username, trigger| {
                username == "ada"
                    && trigger.event_id == "bell"
                    && trigger.event_name == "bell event"
                    && trigger.event_type == "festival"
                    && trigger.triggered_at == noon()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        trigger_with_history(
            players_at("home", PlayerStats::default()),
            history,
            FixedRandom { int: 0, unit: 0.0 },
        )
        .execute("ada", "bell")
        .await
        .expect("trigger");
    }

    #[tokio::test]
    async fn refused_trigger_is_not_recorded() {
        let mut history = MockEventHistoryRepo::new();
        history.expect_record().times(0);

        let err = trigger_with_history(
            players_at("home", PlayerStats::default()),
            history,
            FixedRandom { int: 0, unit: 0.0 },
        )
        .execute("ada", "forest_fight")
        .await
        .expect_err("wrong place");

        assert!(matches!(err, EventError::WrongLocation { .. }));
    }

    #[tokio::test]
    async fn history_write_failure_keeps_the_outcome() {
        let mut history = MockEventHistoryRepo::new();
        history
            .expect_record()
            .times(1)
            .returning(|_, _| Err(RepoError::database("event_history", "disk full")));

        let outcome = trigger_with_history(
            players_at("home", PlayerStats::default()),
            history,
            FixedRandom { int: 0, unit: 0.0 },
        )
        .execute("ada", "bell")
        .await
        .expect("trigger");

        assert_eq!(outcome.event_id, "bell");
    }

    #[tokio::test]
    async fn history_limit_defaults_and_is_capped() {
        let mut history = MockEventHistoryRepo::new();
        let mut seq = mockall::Sequence::new();
        history
            .expect_recent()
            .withf(|username, limit| username == "ada" && *limit == DEFAULT_HISTORY_LIMIT)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));
        history
            .expect_recent()
            .withf(|_, limit| *limit == MAX_HISTORY_LIMIT)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![]));
        let ops = EventHistoryOps::new(Arc::new(history));

        ops.recent("ada", None).await.expect("default");
        ops.recent("ada", Some(5_000)).await.expect("capped");
    }
}
