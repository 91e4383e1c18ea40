//! Application state and composition.

use std::sync::Arc;

use sqlx::SqlitePool;

use emberhall_domain::WorldCatalog;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    ports::{
        ChatHistoryRepo, ClockPort, EventHistoryRepo, LlmPort, PlayerRepo, RandomPort,
        SessionRepo, ShopRepo, UserRepo,
    },
    sqlite::{
        SqliteChatHistoryRepo, SqliteEventHistoryRepo, SqlitePlayerRepo, SqliteSessionRepo,
        SqliteShopRepo, SqliteUserRepo,
    },
};
use crate::stores::RoomManager;
use crate::use_cases;

/// Main application state.
///
/// Holds all repositories, use cases and the in-memory room store.
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
    pub rooms: Arc<RoomManager>,
    pub catalog: Arc<WorldCatalog>,
    pub llm: Arc<dyn LlmPort>,
    pub clock: Arc<dyn ClockPort>,
}

/// Container for all repository ports.
pub struct Repositories {
    pub users: Arc<dyn UserRepo>,
    pub sessions: Arc<dyn SessionRepo>,
    pub chat_history: Arc<dyn ChatHistoryRepo>,
    pub players: Arc<dyn PlayerRepo>,
    pub shops: Arc<dyn ShopRepo>,
    pub event_history: Arc<dyn EventHistoryRepo>,
}

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepo::new(pool.clone())),
            sessions: Arc::new(SqliteSessionRepo::new(pool.clone())),
            chat_history: Arc::new(SqliteChatHistoryRepo::new(pool.clone())),
            players: Arc::new(SqlitePlayerRepo::new(pool.clone())),
            shops: Arc::new(SqliteShopRepo::new(pool.clone())),
            event_history: Arc::new(SqliteEventHistoryRepo::new(pool)),
        }
    }
}

/// Container for all use cases.
pub struct UseCases {
    pub account: use_cases::AccountUseCases,
    pub chat: use_cases::ChatUseCases,
    pub profile: Arc<use_cases::ProfileOps>,
    pub inventory: use_cases::InventoryUseCases,
    pub map: Arc<use_cases::MapOps>,
    pub shop: Arc<use_cases::ShopOps>,
    pub location_events: Arc<use_cases::TriggerEvent>,
    pub event_history: Arc<use_cases::EventHistoryOps>,
    pub bestiary: Arc<use_cases::BestiaryOps>,
    pub rooms: use_cases::RoomUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        repositories: Repositories,
        catalog: WorldCatalog,
        llm: Arc<dyn LlmPort>,
        rooms: RoomManager,
    ) -> Self {
        Self::with_ports(
            repositories,
            catalog,
            llm,
            rooms,
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
        )
    }

    /// Wire the app with explicit clock and randomness.
    pub fn with_ports(
        repositories: Repositories,
        catalog: WorldCatalog,
        llm: Arc<dyn LlmPort>,
        rooms: RoomManager,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let rooms = Arc::new(rooms);
        let repos = &repositories;

        let account = use_cases::AccountUseCases::new(
            Arc::new(use_cases::account::Register::new(
                repos.users.clone(),
                repos.players.clone(),
                clock.clone(),
                random.clone(),
            )),
            Arc::new(use_cases::account::Login::new(
                repos.users.clone(),
                repos.sessions.clone(),
                clock.clone(),
                random.clone(),
            )),
            Arc::new(use_cases::account::Logout::new(repos.sessions.clone())),
            Arc::new(use_cases::account::ValidateSession::new(
                repos.sessions.clone(),
                clock.clone(),
            )),
        );

        let map = Arc::new(use_cases::MapOps::new(
            repos.players.clone(),
            catalog.clone(),
        ));

        let chat = use_cases::ChatUseCases::new(
            Arc::new(use_cases::chat::NarratorChat::new(
                repos.chat_history.clone(),
                map.clone(),
                llm.clone(),
                catalog.clone(),
                clock.clone(),
            )),
            Arc::new(use_cases::chat::ChatHistoryOps::new(
                repos.chat_history.clone(),
                catalog.clone(),
            )),
        );

        let profile = Arc::new(use_cases::ProfileOps::new(
            repos.players.clone(),
            catalog.clone(),
        ));

        let inventory = use_cases::InventoryUseCases::new(
            Arc::new(use_cases::InventoryOps::new(
                repos.players.clone(),
                catalog.clone(),
            )),
            Arc::new(use_cases::inventory::UseItem::new(
                repos.players.clone(),
                catalog.clone(),
            )),
            Arc::new(use_cases::inventory::EquipItem::new(
                repos.players.clone(),
                catalog.clone(),
            )),
            Arc::new(use_cases::inventory::UnequipItem::new(
                repos.players.clone(),
                catalog.clone(),
            )),
        );

        let shop = Arc::new(use_cases::ShopOps::new(
            repos.shops.clone(),
            repos.players.clone(),
            map.clone(),
            catalog.clone(),
        ));

        let location_events = Arc::new(use_cases::TriggerEvent::new(
            repos.players.clone(),
            repos.event_history.clone(),
            map.clone(),
            catalog.clone(),
            clock.clone(),
            random.clone(),
        ));
        let event_history = Arc::new(use_cases::EventHistoryOps::new(
            repos.event_history.clone(),
        ));

        let bestiary = Arc::new(use_cases::BestiaryOps::new(catalog.clone()));

        let room_uc = use_cases::RoomUseCases::new(
            Arc::new(use_cases::rooms::OpenRoom::new(rooms.clone(), clock.clone())),
            Arc::new(use_cases::rooms::NarratorReply::new(
                rooms.clone(),
                llm.clone(),
                catalog.clone(),
                clock.clone(),
            )),
        );

        let use_cases = UseCases {
            account,
            chat,
            profile,
            inventory,
            map,
            shop,
            location_events,
            event_history,
            bestiary,
            rooms: room_uc,
        };

        Self {
            repositories,
            use_cases,
            rooms,
            catalog,
            llm,
            clock,
        }
    }
}
