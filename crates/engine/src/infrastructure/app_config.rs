//! Process configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default LLM base URL (a local Ollama exposes the OpenAI-compatible API).
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434";

/// Default model name.
pub const DEFAULT_LLM_MODEL: &str = "llama3.2";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub world_data_dir: PathBuf,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub llm_max_retries: u32,
    pub room_cleanup_interval: Duration,
    /// Comma-separated origins, or `*`. CORS is disabled when unset.
    pub cors_allowed_origins: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
            database_path: "emberhall.db".to_string(),
            world_data_dir: PathBuf::from("control_data"),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout: Duration::from_secs(120),
            llm_max_retries: 2,
            room_cleanup_interval: Duration::from_secs(60),
            cors_allowed_origins: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (for testing).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or(
                "SERVER_PORT",
                get("SERVER_PORT").or_else(|| get("PORT")),
                defaults.server_port,
            ),
            database_path: get("DATABASE_PATH").unwrap_or(defaults.database_path),
            world_data_dir: get("WORLD_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.world_data_dir),
            llm_base_url: get("LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_api_key: get("LLM_API_KEY"),
            llm_model: get("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_timeout: Duration::from_secs(parse_or(
                "LLM_TIMEOUT_SECS",
                get("LLM_TIMEOUT_SECS"),
                defaults.llm_timeout.as_secs(),
            )),
            llm_max_retries: parse_or(
                "LLM_MAX_RETRIES",
                get("LLM_MAX_RETRIES"),
                defaults.llm_max_retries,
            ),
            room_cleanup_interval: Duration::from_secs(parse_or(
                "ROOM_CLEANUP_INTERVAL_SECS",
                get("ROOM_CLEANUP_INTERVAL_SECS"),
                defaults.room_cleanup_interval.as_secs(),
            )),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid config value, using default");
            default
        }),
    }
}
