//! WebSocket upgrade entry point (C4): extracts the invite code and the
//! client id issued by a prior REST `join`/`create`, then hands off to the
//! per-connection duplex loop.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use crate::connection;
use crate::server::CoordinatorServer;

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub code: String,
    #[serde(rename = "clientId")]
    pub client_id: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectQuery>,
    State(server): State<CoordinatorServer>,
) -> Response {
    ws.on_upgrade(move |socket| {
        connection::handle_socket(
            socket,
            server.registry,
            server.metrics,
            Arc::new(server.config.server.clone()),
            params.code,
            params.client_id,
        )
    })
}
