//! HTTP surface for safety-weighted walking routes.
//!
//! All routing logic lives in `safepath_core`; this crate only maps requests
//! onto it and owns the swappable routing snapshot.

pub mod api;
pub mod config;
pub mod state;

pub use api::build_router;
pub use config::ServerConfig;
pub use state::AppState;
