//! Axum wiring for the duplex upgrade and the rest of the HTTP surface.
//!
//! - [`handler`]: the `/ws` upgrade entry point
//! - [`routes`]: router assembly (REST control plane, health, metrics, CORS)

mod handler;
mod routes;

pub use handler::websocket_handler;
pub use routes::create_router;
