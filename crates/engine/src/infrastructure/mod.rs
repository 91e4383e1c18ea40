//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod app_config;
pub mod clock;
pub mod openai_compat;
pub mod password;
pub mod ports;
pub mod resilient_llm;
pub mod sqlite;
pub mod world_data;
