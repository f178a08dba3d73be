//! HTTP and WebSocket surface of the matchmaking service
//!
//! Clients join and leave the queue over HTTP and receive match
//! notifications over a registered WebSocket connection.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod router;
pub mod state;

pub use config::GatewayConfig;
pub use router::create_router;
pub use state::AppState;
