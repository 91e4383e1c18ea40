//! Emberhall Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emberhall_engine::api;
use emberhall_engine::app::{App, Repositories};
use emberhall_engine::infrastructure::{
    app_config::AppConfig,
    openai_compat::ChatCompletionsClient,
    ports::LlmPort,
    resilient_llm::{ResilientLlmClient, RetryConfig},
    sqlite,
    world_data::load_world_catalog,
};
use emberhall_engine::stores::RoomManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine is often run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emberhall_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Emberhall Engine");

    let config = AppConfig::from_env();

    let catalog = load_world_catalog(&config.world_data_dir).with_context(|| {
        format!(
            "loading world data from {}",
            config.world_data_dir.display()
        )
    })?;
    tracing::info!(
        locations = catalog.locations.len(),
        items = catalog.items.len(),
        shops = catalog.shops.len(),
        events = catalog.events.len(),
        personas = catalog.personas.len(),
        "World data loaded"
    );

    let pool = sqlite::connect(&config.database_path)
        .await
        .with_context(|| format!("opening database {}", config.database_path))?;

    let chat_client = Arc::new(ChatCompletionsClient::new(
        &config.llm_base_url,
        &config.llm_model,
        config.llm_api_key.clone(),
        config.llm_timeout,
    ));
    let retry_config = RetryConfig::default().with_max_retries(config.llm_max_retries);
    tracing::info!(
        base_url = %config.llm_base_url,
        model = %config.llm_model,
        max_retries = retry_config.max_retries,
        base_delay_ms = retry_config.base_delay_ms,
        "LLM client configured"
    );
    let llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(chat_client, retry_config));

    let app = Arc::new(App::new(
        Repositories::sqlite(pool),
        catalog,
        llm,
        RoomManager::new(),
    ));

    let seeded = app
        .use_cases
        .shop
        .seed_stock()
        .await
        .context("seeding shop stock")?;
    tracing::info!(listings = seeded, "Shop stock ready");

    // Spawn idle room cleanup
    let cleanup_app = app.clone();
    let cleanup_interval = config.room_cleanup_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cleanup_interval);
        loop {
            ticker.tick().await;
            let removed = cleanup_app.rooms.cleanup(cleanup_app.clock.now()).await;
            if !removed.is_empty() {
                tracing::info!(count = removed.len(), "Cleaned up idle rooms");
            }
        }
    });

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(config.cors_allowed_origins.as_deref()) {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("parsing listen address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed_origins: Option<&str>) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins?;

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        // Browsers send the session header and JSON bodies, both of which trigger preflights.
        .allow_headers([
            HeaderName::from_static("x-session-token"),
            axum::http::header::CONTENT_TYPE,
        ]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
