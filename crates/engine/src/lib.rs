//! Emberhall Engine library.
//!
//! This crate contains all server-side code for the Emberhall game server.
//!
//! ## Structure
//!
//! - `stores/` - In-memory multiplayer room registry
//! - `use_cases/` - User story orchestration across repositories and stores
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
