//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use emberhall_domain::{HostMode, MessageType, RoomId, DEFAULT_AREA};
use emberhall_shared::{
    from_epoch_secs, responses::*, ApiResponse, AreaQuery, ChatRequest, ChatTurnDto,
    CharacterRequest, CreatureDto, CreatureQuery, CreaturesQuery, CredentialsRequest,
    EquipRequest, EventHistoryQuery, EventTriggerDto, ItemQuantityRequest, LocationDto,
    LocationQuery, MoveRequest, PersonaDto, ProfileDto, PurchaseRequest, RoomIdRequest,
    RoomMessageDto, RoomMessagesRequest, SearchItemsRequest, SendRoomMessageRequest,
    SetHostModeRequest, ShopDto, ShopItemDto, ShopQuery, SkillQuery, TriggerEventRequest,
    TriggerNarratorRequest, UnequipRequest, UpdateStatsRequest,
};

use super::auth::AuthUser;
use super::error::ApiError;
use crate::app::App;
use crate::use_cases::map::LocationView;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/health", get(health))
        // Accounts
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/validate_session", post(validate_session))
        // Narrator chat
        .route("/chat", post(chat))
        .route("/get_character_history", post(character_history))
        .route("/clear", post(clear_history))
        .route("/get_characters", get(personas))
        // Profile, items and equipment
        .route("/get_user_data", post(user_data))
        .route("/update_user_stats", post(update_user_stats))
        .route("/get_items", get(catalog_items))
        .route("/search_items", post(search_items))
        .route("/add_item", post(add_item))
        .route("/use_item", post(use_item))
        .route("/equip_item", post(equip_item))
        .route("/unequip_item", post(unequip_item))
        // Rooms
        .route("/create_room", post(create_room))
        .route("/join_room", post(join_room))
        .route("/leave_room", post(leave_room))
        .route("/get_room_list", get(room_list))
        .route("/get_room_info", post(room_info))
        .route("/send_room_message", post(send_room_message))
        .route("/trigger_dm_response", post(trigger_narrator))
        .route("/get_room_messages", post(room_messages))
        .route("/set_host_mode", post(set_host_mode))
        // Map, events and shops
        .route("/get_user_location", get(user_location))
        .route("/get_area_locations", get(area_locations))
        .route("/move_to_location", post(move_to_location))
        .route("/get_location_info", get(location_info))
        .route("/trigger_event", post(trigger_event))
        .route("/get_event_history", get(event_history))
        .route("/get_current_shop", get(current_shop))
        .route("/get_shop_items", get(shop_items))
        .route("/purchase_item", post(purchase_item))
        // Bestiary
        .route("/get_creatures", get(creatures))
        .route("/get_creature", get(creature))
        .route("/get_skills", get(skills))
        .route("/get_skill", get(skill))
}

async fn health() -> &'static str {
    "OK"
}

fn room_id(raw: &str) -> Result<RoomId, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::bad_request("room_id is required"));
    }
    Ok(RoomId::from(raw))
}

fn location_dto(view: &LocationView) -> LocationDto {
    LocationDto::new(&view.location, view.area.as_ref())
}

// =============================================================================
// Accounts
// =============================================================================

async fn register(
    State(app): State<Arc<App>>,
    Json(body): Json<CredentialsRequest>,
) -> ApiResult<MessageResponse> {
    let username = app
        .use_cases
        .account
        .register
        .execute(&body.username, &body.password)
        .await?;
    ok(MessageResponse::new(format!("User {username} registered")))
}

async fn login(
    State(app): State<Arc<App>>,
    Json(body): Json<CredentialsRequest>,
) -> ApiResult<LoginResponse> {
    let session = app
        .use_cases
        .account
        .login
        .execute(&body.username, &body.password)
        .await?;
    ok(LoginResponse {
        message: "Login successful".to_string(),
        session_token: session.token,
        username: session.username,
    })
}

async fn logout(State(app): State<Arc<App>>, user: AuthUser) -> ApiResult<MessageResponse> {
    app.use_cases.account.logout.execute(&user.token).await?;
    ok(MessageResponse::new("Logged out"))
}

async fn validate_session(user: AuthUser) -> ApiResult<SessionResponse> {
    ok(SessionResponse {
        username: user.username,
    })
}

// =============================================================================
// Narrator chat
// =============================================================================

async fn chat(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    let reply = app
        .use_cases
        .chat
        .chat
        .execute(
            &user.username,
            &body.message,
            body.character.as_deref(),
            body.regenerate,
        )
        .await?;
    ok(ChatResponse {
        response: reply.response,
        character: reply.persona,
    })
}

async fn character_history(
    State(app): State<Arc<App>>,
    user: AuthUser,
    body: Option<Json<CharacterRequest>>,
) -> ApiResult<HistoryResponse> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let (character, turns) = app
        .use_cases
        .chat
        .history
        .history(&user.username, body.character.as_deref())
        .await?;
    ok(HistoryResponse {
        character,
        messages: turns.iter().map(ChatTurnDto::from).collect(),
    })
}

async fn clear_history(
    State(app): State<Arc<App>>,
    user: AuthUser,
    body: Option<Json<CharacterRequest>>,
) -> ApiResult<MessageResponse> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let persona = app
        .use_cases
        .chat
        .history
        .clear(&user.username, body.character.as_deref())
        .await?;
    ok(MessageResponse::new(format!(
        "Conversation with {persona} cleared"
    )))
}

async fn personas(State(app): State<Arc<App>>) -> ApiResult<PersonasResponse> {
    let personas = app.use_cases.chat.history.personas();
    ok(PersonasResponse {
        characters: personas.iter().map(PersonaDto::from).collect(),
    })
}

// =============================================================================
// Profile, items and equipment
// =============================================================================

async fn user_data(State(app): State<Arc<App>>, user: AuthUser) -> ApiResult<UserDataResponse> {
    let profile = app.use_cases.profile.profile(&user.username).await?;
    ok(UserDataResponse {
        user: ProfileDto::from(&profile),
    })
}

async fn update_user_stats(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(patch): Json<UpdateStatsRequest>,
) -> ApiResult<ProfileUpdateResponse> {
    let profile = app
        .use_cases
        .profile
        .update_stats(&user.username, &patch)
        .await?;
    ok(ProfileUpdateResponse {
        message: "Stats updated".to_string(),
        user: ProfileDto::from(&profile),
    })
}

async fn catalog_items(State(app): State<Arc<App>>) -> ApiResult<ItemsResponse> {
    ok(ItemsResponse {
        items: app.use_cases.inventory.ops.catalog_items(),
    })
}

async fn search_items(
    State(app): State<Arc<App>>,
    Json(body): Json<SearchItemsRequest>,
) -> ApiResult<ItemsResponse> {
    ok(ItemsResponse {
        items: app
            .use_cases
            .inventory
            .ops
            .search_items(&body.query, &body.item_type, &body.rarity),
    })
}

async fn add_item(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<ItemQuantityRequest>,
) -> ApiResult<MessageResponse> {
    let item = app
        .use_cases
        .inventory
        .ops
        .add_item(&user.username, &body.item_id, body.quantity)
        .await?;
    ok(MessageResponse::new(format!(
        "Added {} x{}",
        item.item_name, body.quantity
    )))
}

async fn use_item(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<ItemQuantityRequest>,
) -> ApiResult<MessageResponse> {
    let summary = app
        .use_cases
        .inventory
        .use_item
        .execute(&user.username, &body.item_id, body.quantity)
        .await?;
    ok(MessageResponse::new(summary))
}

async fn equip_item(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<EquipRequest>,
) -> ApiResult<MessageResponse> {
    let (item, previous) = app
        .use_cases
        .inventory
        .equip
        .execute(&user.username, &body.item_id, &body.slot)
        .await?;
    let message = match previous {
        Some(previous) => format!("Equipped {} (replaced {previous})", item.item_name),
        None => format!("Equipped {}", item.item_name),
    };
    ok(MessageResponse::new(message))
}

async fn unequip_item(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<UnequipRequest>,
) -> ApiResult<MessageResponse> {
    let item = app
        .use_cases
        .inventory
        .unequip
        .execute(&user.username, &body.slot)
        .await?;
    ok(MessageResponse::new(format!("Unequipped {}", item.item_name)))
}

// =============================================================================
// Rooms
// =============================================================================

async fn create_room(
    State(app): State<Arc<App>>,
    user: AuthUser,
) -> ApiResult<RoomCreatedResponse> {
    let room_id = app
        .use_cases
        .rooms
        .open
        .execute(&user.username, &user.token)
        .await?;
    ok(RoomCreatedResponse {
        message: "Room created".to_string(),
        room_id: room_id.to_string(),
    })
}

async fn join_room(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<RoomIdRequest>,
) -> ApiResult<RoomInfoResponse> {
    let room_id = room_id(&body.room_id)?;
    let now = app.clock.now();
    app.rooms
        .join(&room_id, &user.username, &user.token, now)
        .await?;
    ok(RoomInfoResponse {
        room_info: app.rooms.room_info(&room_id, now).await?,
    })
}

async fn leave_room(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<RoomIdRequest>,
) -> ApiResult<MessageResponse> {
    let room_id = room_id(&body.room_id)?;
    let closed = app.rooms.leave(&room_id, &user.username).await;
    let message = if closed {
        "Left room; room closed"
    } else {
        "Left room"
    };
    ok(MessageResponse::new(message))
}

async fn room_list(State(app): State<Arc<App>>) -> ApiResult<RoomListResponse> {
    app.rooms.cleanup(app.clock.now()).await;
    ok(RoomListResponse {
        rooms: app.rooms.list().await,
    })
}

async fn room_info(
    State(app): State<Arc<App>>,
    _user: AuthUser,
    Json(body): Json<RoomIdRequest>,
) -> ApiResult<RoomInfoResponse> {
    let room_id = room_id(&body.room_id)?;
    ok(RoomInfoResponse {
        room_info: app.rooms.room_info(&room_id, app.clock.now()).await?,
    })
}

async fn send_room_message(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<SendRoomMessageRequest>,
) -> ApiResult<MessageSentResponse> {
    let room_id = room_id(&body.room_id)?;
    let message_type = match body.message_type.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw
            .parse::<MessageType>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        _ => MessageType::Private,
    };
    let target_user = body
        .target_user
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let message = app
        .rooms
        .send_message(
            &room_id,
            &user.username,
            &body.content,
            message_type,
            target_user,
            app.clock.now(),
        )
        .await?;
    ok(MessageSentResponse {
        message_id: message.id.to_string(),
    })
}

async fn trigger_narrator(
    State(app): State<Arc<App>>,
    _user: AuthUser,
    Json(body): Json<TriggerNarratorRequest>,
) -> ApiResult<NarratorResponse> {
    let room_id = room_id(&body.room_id)?;
    let message = app
        .use_cases
        .rooms
        .narrator
        .execute(&room_id, &body.interaction_content)
        .await?;
    ok(NarratorResponse {
        response: message.content,
    })
}

async fn room_messages(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<RoomMessagesRequest>,
) -> ApiResult<RoomMessagesResponse> {
    let room_id = room_id(&body.room_id)?;
    let since = match body.since_timestamp {
        Some(secs) => Some(
            from_epoch_secs(secs)
                .ok_or_else(|| ApiError::bad_request("Invalid since_timestamp"))?,
        ),
        None => None,
    };

    let visible = app
        .rooms
        .messages_for(&room_id, &user.username, since, app.clock.now())
        .await?;
    ok(RoomMessagesResponse {
        messages: visible.messages.iter().map(RoomMessageDto::from).collect(),
        room_info: visible.info,
    })
}

async fn set_host_mode(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<SetHostModeRequest>,
) -> ApiResult<HostModeResponse> {
    let room_id = room_id(&body.room_id)?;
    let mode: HostMode = body
        .host_mode
        .parse()
        .map_err(|e: emberhall_domain::DomainError| ApiError::bad_request(e.to_string()))?;

    app.rooms
        .set_host_mode(&room_id, &user.username, mode)
        .await?;
    ok(HostModeResponse {
        message: format!("Host mode set to {mode}"),
        host_mode: mode.as_str().to_string(),
    })
}

// =============================================================================
// Map, events and shops
// =============================================================================

async fn user_location(State(app): State<Arc<App>>, user: AuthUser) -> ApiResult<LocationResponse> {
    let view = app.use_cases.map.current_location(&user.username).await?;
    ok(LocationResponse {
        location: location_dto(&view),
    })
}

async fn area_locations(
    State(app): State<Arc<App>>,
    _user: AuthUser,
    Query(query): Query<AreaQuery>,
) -> ApiResult<AreaLocationsResponse> {
    let area_id = query
        .area
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_AREA.to_string());
    let locations = app.use_cases.map.area_locations(&area_id);
    ok(AreaLocationsResponse {
        area_id,
        locations: locations.iter().map(location_dto).collect(),
    })
}

async fn move_to_location(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<MoveRequest>,
) -> ApiResult<MoveResponse> {
    if body.location.trim().is_empty() {
        return Err(ApiError::bad_request("location is required"));
    }
    let view = app
        .use_cases
        .map
        .move_to(&user.username, &body.location)
        .await?;
    ok(MoveResponse {
        message: format!("Moved to {}", view.location.display_name),
        location: location_dto(&view),
    })
}

async fn location_info(
    State(app): State<Arc<App>>,
    _user: AuthUser,
    Query(query): Query<LocationQuery>,
) -> ApiResult<LocationResponse> {
    if query.location.trim().is_empty() {
        return Err(ApiError::bad_request("location is required"));
    }
    let view = app.use_cases.map.location_info(&query.location)?;
    ok(LocationResponse {
        location: location_dto(&view),
    })
}

async fn trigger_event(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<TriggerEventRequest>,
) -> ApiResult<EventResponse> {
    let outcome = app
        .use_cases
        .location_events
        .execute(&user.username, body.event_id.trim())
        .await?;
    ok(EventResponse {
        message: outcome.message,
        event_type: outcome.event_type,
        event_id: outcome.event_id,
        details: outcome.details,
    })
}

async fn event_history(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Query(query): Query<EventHistoryQuery>,
) -> ApiResult<EventHistoryResponse> {
    let history = app
        .use_cases
        .event_history
        .recent(&user.username, query.limit)
        .await?;
    ok(EventHistoryResponse {
        history: history.iter().map(EventTriggerDto::from).collect(),
    })
}

async fn current_shop(State(app): State<Arc<App>>, user: AuthUser) -> ApiResult<ShopResponse> {
    let shop = app.use_cases.shop.current_shop(&user.username).await?;
    ok(ShopResponse {
        shop: ShopDto::from(&shop),
    })
}

async fn shop_items(
    State(app): State<Arc<App>>,
    _user: AuthUser,
    Query(query): Query<ShopQuery>,
) -> ApiResult<ShopItemsResponse> {
    let shop_id = query.shop_id.trim().to_string();
    if shop_id.is_empty() {
        return Err(ApiError::bad_request("shop_id is required"));
    }
    let items = app.use_cases.shop.shop_items(&shop_id).await?;
    ok(ShopItemsResponse {
        items: items
            .iter()
            .map(|i| ShopItemDto::new(&i.item, i.price, i.stock))
            .collect(),
        shop_id,
    })
}

async fn purchase_item(
    State(app): State<Arc<App>>,
    user: AuthUser,
    Json(body): Json<PurchaseRequest>,
) -> ApiResult<PurchaseResponse> {
    let purchase = app
        .use_cases
        .shop
        .purchase(&user.username, body.shop_id.trim(), body.item_id.trim())
        .await?;
    ok(PurchaseResponse {
        message: format!(
            "Bought {} for {} gold",
            purchase.item.item_name, purchase.price
        ),
        item_id: purchase.item.item_id,
        gold_remaining: purchase.gold_remaining,
    })
}

async fn creatures(
    State(app): State<Arc<App>>,
    _user: AuthUser,
    Query(query): Query<CreaturesQuery>,
) -> ApiResult<CreaturesResponse> {
    let creatures = app.use_cases.bestiary.creatures(&query.quality);
    ok(CreaturesResponse {
        creatures: creatures.iter().map(CreatureDto::from).collect(),
    })
}

async fn creature(
    State(app): State<Arc<App>>,
    _user: AuthUser,
    Query(query): Query<CreatureQuery>,
) -> ApiResult<CreatureResponse> {
    if query.creature_id.trim().is_empty() {
        return Err(ApiError::bad_request("creature_id is required"));
    }
    let view = app.use_cases.bestiary.creature(&query.creature_id)?;
    ok(CreatureResponse {
        creature: CreatureDto::from(&view.creature),
        skill_objects: view.skills,
    })
}

async fn skills(State(app): State<Arc<App>>, _user: AuthUser) -> ApiResult<SkillsResponse> {
    ok(SkillsResponse {
        skills: app.use_cases.bestiary.skills(),
    })
}

async fn skill(
    State(app): State<Arc<App>>,
    _user: AuthUser,
    Query(query): Query<SkillQuery>,
) -> ApiResult<SkillResponse> {
    if query.skill_id.trim().is_empty() {
        return Err(ApiError::bad_request("skill_id is required"));
    }
    ok(SkillResponse {
        skill: app.use_cases.bestiary.skill(&query.skill_id)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use emberhall_domain::{ItemDef, ItemStats, ShopDef, ShopListing, WorldCatalog};

    use crate::app::Repositories;
    use crate::infrastructure::ports::{FinishReason, LlmResponse, MockLlmPort};
    use crate::infrastructure::sqlite::test_support::temp_pool;
    use crate::stores::RoomManager;

    struct TestServer {
        router: Router,
        _dir: TempDir,
    }

    fn catalog() -> WorldCatalog {
        let (areas, locations) = WorldCatalog::default_village();
        WorldCatalog {
            areas,
            locations,
            items: vec![ItemDef {
                item_id: "potion".to_string(),
                item_name: "Potion".to_string(),
                description: "Restores health.".to_string(),
                item_type: "consumable".to_string(),
                rarity: "common".to_string(),
                base_price: 20,
                effect: Some("HP+30".to_string()),
                stats: ItemStats::default(),
                slot: None,
            }],
            shops: vec![ShopDef {
                shop_id: "general_store".to_string(),
                shop_name: "General Store".to_string(),
                description: String::new(),
                shop_type: "general".to_string(),
                location_id: "market".to_string(),
                items: vec![ShopListing {
                    item_id: "potion".to_string(),
                    price: 30,
                    stock: 2,
                }],
            }],
            creatures: serde_json::from_value(json!([
                {"creature_id": "slime", "creature_name": "Slime"},
                {"creature_id": "drake", "creature_name": "Drake", "quality": "epic",
                 "base_stats": {"hp": 50, "attack": 12}, "skills": ["fire_breath"]}
            ]))
            .expect("creatures"),
            skills: serde_json::from_value(json!([
                {"skill_id": "fire_breath", "name": "Fire Breath", "damage_multiplier": 2.0, "mp_cost": 10}
            ]))
            .expect("skills"),
            events: serde_json::from_value(json!([
                {"event_id": "spring", "event_name": "Healing Spring", "event_type": "healing"},
                {"event_id": "bell", "event_name": "Village Bell", "event_type": "festival"}
            ]))
            .expect("events"),
            ..WorldCatalog::default()
        }
    }

    async fn server(llm: MockLlmPort) -> TestServer {
        server_with_rooms(llm, RoomManager::new()).await
    }

    async fn server_with_rooms(llm: MockLlmPort, rooms: RoomManager) -> TestServer {
        let (dir, pool) = temp_pool().await;
        let app = Arc::new(App::new(
            Repositories::sqlite(pool),
            catalog(),
            Arc::new(llm),
            rooms,
        ));
        app.use_cases.shop.seed_stock().await.expect("seed");
        TestServer {
            router: routes().with_state(app),
            _dir: dir,
        }
    }

    impl TestServer {
        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }

        async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
            let mut request = Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json");
            if let Some(token) = token {
                request = request.header("X-Session-Token", token);
            }
            self.send(request.body(Body::from(body.to_string())).unwrap())
                .await
        }

        async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
            let mut request = Request::builder().uri(path);
            if let Some(token) = token {
                request = request.header("X-Session-Token", token);
            }
            self.send(request.body(Body::empty()).unwrap()).await
        }

        async fn login_as(&self, username: &str) -> String {
            let credentials = json!({"username": username, "password": "secret"});
            let (status, _) = self.post("/register", None, credentials.clone()).await;
            assert_eq!(status, StatusCode::OK);
            let (status, body) = self.post("/login", None, credentials).await;
            assert_eq!(status, StatusCode::OK);
            body["session_token"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let server = server(MockLlmPort::new()).await;
        let response = server
            .router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn register_login_and_profile() {
        let server = server(MockLlmPort::new()).await;
        let token = server.login_as("ada").await;

        let (status, body) = server.post("/validate_session", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "ada");

        let (status, body) = server.post("/get_user_data", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["username"], "ada");
        assert_eq!(body["user"]["stats"]["gold"], 100);
        assert_eq!(body["user"]["location"]["location_id"], "home");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let server = server(MockLlmPort::new()).await;
        server.login_as("ada").await;

        let (status, body) = server
            .post("/register", None, json!({"username": "ada", "password": "other"}))
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Username already exists");
    }

    #[tokio::test]
    async fn protected_routes_need_a_session() {
        let server = server(MockLlmPort::new()).await;

        let (status, body) = server.post("/get_user_data", None, json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = server.get("/get_user_location", Some("not-a-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_invalidates_token() {
        let server = server(MockLlmPort::new()).await;
        let token = server.login_as("ada").await;

        let (status, _) = server.post("/logout", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = server.post("/validate_session", Some(&token), json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn private_room_message_reaches_only_its_target() {
        let server = server(MockLlmPort::new()).await;
        let ada = server.login_as("ada").await;
        let bob = server.login_as("bob").await;
        let cy = server.login_as("cy").await;

        let (status, body) = server.post("/create_room", Some(&ada), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let room_id = body["room_id"].as_str().unwrap().to_string();

        for token in [&bob, &cy] {
            let (status, _) = server
                .post("/join_room", Some(token), json!({"room_id": room_id}))
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, _) = server
            .post(
                "/send_room_message",
                Some(&ada),
                json!({"room_id": room_id, "content": "psst", "target_user": "bob"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, bob_view) = server
            .post("/get_room_messages", Some(&bob), json!({"room_id": room_id}))
            .await;
        assert_eq!(bob_view["messages"].as_array().unwrap().len(), 1);
        assert_eq!(bob_view["messages"][0]["content"], "psst");
        assert_eq!(bob_view["room_info"]["user_count"], 3);
        assert_eq!(bob_view["room_info"]["host_mode"], "private");

        let (_, cy_view) = server
            .post("/get_room_messages", Some(&cy), json!({"room_id": room_id}))
            .await;
        assert!(cy_view["messages"].as_array().unwrap().is_empty());

        let (_, list) = server.get("/get_room_list", None).await;
        assert_eq!(list["rooms"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn polling_with_echoed_timestamp_returns_only_new_messages() {
        let server = server(MockLlmPort::new()).await;
        let ada = server.login_as("ada").await;
        let (_, body) = server.post("/create_room", Some(&ada), json!({})).await;
        let room_id = body["room_id"].as_str().unwrap().to_string();

        let say = |content: &'static str| {
            json!({"room_id": room_id, "content": content, "message_type": "global"})
        };
        let (status, _) = server.post("/send_room_message", Some(&ada), say("first")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, poll) = server
            .post("/get_room_messages", Some(&ada), json!({"room_id": room_id}))
            .await;
        assert_eq!(status, StatusCode::OK);
        let last_seen = poll["messages"][0]["timestamp"].as_f64().unwrap();

        let (_, poll) = server
            .post(
                "/get_room_messages",
                Some(&ada),
                json!({"room_id": room_id, "since_timestamp": last_seen}),
            )
            .await;
        assert!(poll["messages"].as_array().unwrap().is_empty());

        server.post("/send_room_message", Some(&ada), say("second")).await;
        let (_, poll) = server
            .post(
                "/get_room_messages",
                Some(&ada),
                json!({"room_id": room_id, "since_timestamp": last_seen}),
            )
            .await;
        let messages = poll["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["content"], "second");
    }

    #[tokio::test]
    async fn joining_a_full_room_conflicts() {
        let server = server_with_rooms(MockLlmPort::new(), RoomManager::with_max_users(2)).await;
        let ada = server.login_as("ada").await;
        let bob = server.login_as("bob").await;
        let cy = server.login_as("cy").await;

        let (_, body) = server.post("/create_room", Some(&ada), json!({})).await;
        let room_id = body["room_id"].as_str().unwrap().to_string();
        let (status, _) = server
            .post("/join_room", Some(&bob), json!({"room_id": room_id}))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = server
            .post("/join_room", Some(&cy), json!({"room_id": room_id}))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        // Members may rejoin a full room.
        let (status, body) = server
            .post("/join_room", Some(&bob), json!({"room_id": room_id}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["room_info"]["user_count"], 2);
    }

    #[tokio::test]
    async fn only_host_sets_host_mode() {
        let server = server(MockLlmPort::new()).await;
        let ada = server.login_as("ada").await;
        let bob = server.login_as("bob").await;

        let (_, body) = server.post("/create_room", Some(&ada), json!({})).await;
        let room_id = body["room_id"].as_str().unwrap().to_string();
        server
            .post("/join_room", Some(&bob), json!({"room_id": room_id}))
            .await;

        let (status, _) = server
            .post(
                "/set_host_mode",
                Some(&bob),
                json!({"room_id": room_id, "host_mode": "global"}),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = server
            .post(
                "/set_host_mode",
                Some(&ada),
                json!({"room_id": room_id, "host_mode": "sideways"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = server
            .post(
                "/set_host_mode",
                Some(&ada),
                json!({"room_id": room_id, "host_mode": "global"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["host_mode"], "global");
    }

    #[tokio::test]
    async fn joining_unknown_room_is_not_found() {
        let server = server(MockLlmPort::new()).await;
        let ada = server.login_as("ada").await;

        let (status, _) = server
            .post("/join_room", Some(&ada), json!({"room_id": "deadbeef"}))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_moves_player_on_directive() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().returning(|_| {
            Ok(LlmResponse {
                content: "You stroll to the stalls. **MOVE_TO:bazaar**".to_string(),
                finish_reason: FinishReason::Stop,
                usage: None,
            })
        });
        let server = server(llm).await;
        let ada = server.login_as("ada").await;

        let (status, body) = server
            .post("/chat", Some(&ada), json!({"message": "take me shopping"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "You stroll to the stalls.");

        let (_, location) = server.get("/get_user_location", Some(&ada)).await;
        assert_eq!(location["location"]["location_id"], "market");

        let (_, history) = server
            .post("/get_character_history", Some(&ada), json!({}))
            .await;
        assert_eq!(history["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn shop_purchase_spends_gold_and_stock() {
        let server = server(MockLlmPort::new()).await;
        let ada = server.login_as("ada").await;

        let (status, _) = server.get("/get_current_shop", Some(&ada)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        server
            .post("/move_to_location", Some(&ada), json!({"location": "Market"}))
            .await;
        let (status, body) = server.get("/get_current_shop", Some(&ada)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shop"]["shop_id"], "general_store");

        let (status, body) = server
            .post(
                "/purchase_item",
                Some(&ada),
                json!({"shop_id": "general_store", "item_id": "potion", "price": 1}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gold_remaining"], 70);

        let (_, items) = server
            .get("/get_shop_items?shop_id=general_store", Some(&ada))
            .await;
        assert_eq!(items["items"][0]["stock"], 1);

        let (status, body) = server
            .post("/use_item", Some(&ada), json!({"item_id": "potion"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Used Potion x1, HP +30");
    }

    #[tokio::test]
    async fn area_locations_default_to_village() {
        let server = server(MockLlmPort::new()).await;
        let ada = server.login_as("ada").await;

        let (status, body) = server.get("/get_area_locations", Some(&ada)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["area_id"], DEFAULT_AREA);
        assert_eq!(body["locations"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn creature_catalog_filters_and_scales_by_quality() {
        let server = server(MockLlmPort::new()).await;
        let ada = server.login_as("ada").await;

        let (status, _) = server.get("/get_creatures", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, all) = server.get("/get_creatures", Some(&ada)).await;
        assert_eq!(all["creatures"].as_array().unwrap().len(), 2);

        let (status, body) = server.get("/get_creatures?quality=epic", Some(&ada)).await;
        assert_eq!(status, StatusCode::OK);
        let drake = &body["creatures"][0];
        assert_eq!(body["creatures"].as_array().unwrap().len(), 1);
        assert_eq!(drake["quality_multiplier"], 2.0);
        assert_eq!(drake["effective_attack"], 24);
        assert_eq!(drake["effective_hp"], 100);

        let (status, body) = server.get("/get_creature?creature_id=drake", Some(&ada)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["creature"]["creature_name"], "Drake");
        assert_eq!(body["skill_objects"][0]["name"], "Fire Breath");

        let (status, _) = server.get("/get_creature?creature_id=dragon", Some(&ada)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn skills_catalog_lists_and_looks_up() {
        let server = server(MockLlmPort::new()).await;
        let ada = server.login_as("ada").await;

        let (status, body) = server.get("/get_skills", Some(&ada)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"][0]["mp_cost"], 10);

        let (status, body) = server.get("/get_skill?skill_id=fire_breath", Some(&ada)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skill"]["damage_multiplier"], 2.0);

        let (status, _) = server.get("/get_skill?skill_id=fly", Some(&ada)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = server.get("/get_skill", Some(&ada)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn event_history_lists_own_triggers_newest_first() {
        let server = server(MockLlmPort::new()).await;
        let ada = server.login_as("ada").await;
        let bob = server.login_as("bob").await;

        for event_id in ["spring", "bell"] {
            let (status, _) = server
                .post("/trigger_event", Some(&ada), json!({"event_id": event_id}))
                .await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = server
            .post("/trigger_event", Some(&ada), json!({"event_id": "ghost"}))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = server.get("/get_event_history", Some(&ada)).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body["history"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Village Bell", "Healing Spring"]);
        assert_eq!(body["history"][0]["type"], "festival");
        assert!(body["history"][0]["triggered_at"].as_f64().unwrap() > 0.0);

        let (_, body) = server.get("/get_event_history?limit=1", Some(&ada)).await;
        assert_eq!(body["history"].as_array().unwrap().len(), 1);

        let (_, body) = server.get("/get_event_history", Some(&bob)).await;
        assert!(body["history"].as_array().unwrap().is_empty());
    }
}
