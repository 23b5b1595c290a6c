//! REST control plane (C6): create/join/get/close/kick over plain HTTP,
//! with the duplex channel carrying everything that follows (spec §6).

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{error_code, http_status, ErrorCode};
use crate::protocol::validation::{validate_avatar_url, validate_name};
use crate::protocol::ServerMessage;
use crate::registry::RegistryError;
use crate::session::SessionSnapshot;

use super::CoordinatorServer;

/// REST errors are always `{error: string}` (spec §6.1).
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(code = ?self.code, status = %self.status, "rejecting request");
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self {
            status: http_status(&err),
            code: error_code(&err),
            message: err.to_string(),
        }
    }
}

fn bad_request(code: ErrorCode, message: String) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        code,
        message,
    }
}

/// Bounds a registry mutation to the configured deadline (spec §5): under
/// heavy per-session lock contention, callers get a 504 instead of hanging.
async fn with_deadline<T>(
    server: &CoordinatorServer,
    fut: impl std::future::Future<Output = T>,
) -> Result<T, ApiError> {
    tokio::time::timeout(
        Duration::from_secs(server.config.server.rest_deadline_secs),
        fut,
    )
    .await
    .map_err(|_| ApiError {
        status: StatusCode::GATEWAY_TIMEOUT,
        code: ErrorCode::InternalError,
        message: "request exceeded the mutation deadline".to_string(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub host_name: String,
    #[serde(default)]
    pub host_avatar_url: Option<String>,
    #[serde(default)]
    pub rom_id: Option<String>,
    #[serde(default)]
    pub rom_title: Option<String>,
    #[serde(default)]
    pub voice_enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub code: String,
    pub client_id: String,
    pub session: SessionSnapshot,
}

/// create — spec §4.2 / §6.1.
pub async fn create_session(
    State(server): State<CoordinatorServer>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let host_name = validate_name(&body.host_name, &server.config.server)
        .map_err(|msg| bad_request(ErrorCode::InvalidPlayerName, msg))?;
    let host_avatar_url = body
        .host_avatar_url
        .map(|url| validate_avatar_url(&url))
        .transpose()
        .map_err(|msg| bad_request(ErrorCode::InvalidAvatarUrl, msg))?;

    let created = server.registry.create(
        host_name,
        host_avatar_url,
        body.rom_id,
        body.rom_title,
        body.voice_enabled,
    )?;
    server.metrics.sessions_created.fetch_add(1, Ordering::Relaxed);
    let session = created.handle.snapshot().await;
    Ok(Json(CreateSessionResponse {
        code: created.code,
        client_id: created.client_id,
        session,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionRequest {
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionResponse {
    pub client_id: String,
    pub slot: u8,
    pub session: SessionSnapshot,
}

/// join — spec §4.2 / §6.2.
pub async fn join_session(
    State(server): State<CoordinatorServer>,
    Path(code): Path<String>,
    Json(body): Json<JoinSessionRequest>,
) -> Result<Json<JoinSessionResponse>, ApiError> {
    let name = validate_name(&body.name, &server.config.server)
        .map_err(|msg| bad_request(ErrorCode::InvalidPlayerName, msg))?;
    let avatar_url = body
        .avatar_url
        .map(|url| validate_avatar_url(&url))
        .transpose()
        .map_err(|msg| bad_request(ErrorCode::InvalidAvatarUrl, msg))?;

    let (client_id, slot, handle) =
        with_deadline(&server, server.registry.join(&code, name, avatar_url)).await??;
    server.metrics.members_joined.fetch_add(1, Ordering::Relaxed);
    let session = handle.snapshot().await;
    handle
        .bus
        .broadcast_room_state(ServerMessage::RoomState {
            session: session.clone(),
        })
        .await;
    Ok(Json(JoinSessionResponse {
        client_id,
        slot,
        session,
    }))
}

/// get — spec §4.2 / §6.3.
pub async fn get_session(
    State(server): State<CoordinatorServer>,
    Path(code): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = server.registry.lookup(&code).ok_or(RegistryError::NotFound)?;
    Ok(Json(handle.snapshot().await))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionRequest {
    pub client_id: String,
}

#[derive(Debug, Serialize)]
pub struct CloseSessionResponse {
    pub closed: bool,
}

/// close — spec §4.2 / §6.1. Host-only, terminal.
pub async fn close_session(
    State(server): State<CoordinatorServer>,
    Path(code): Path<String>,
    Json(body): Json<CloseSessionRequest>,
) -> Result<Json<CloseSessionResponse>, ApiError> {
    let handle = with_deadline(&server, server.registry.close(&code, &body.client_id)).await??;
    handle.bus.broadcast_closed("host closed the session").await;
    Ok(Json(CloseSessionResponse { closed: true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickMemberRequest {
    pub client_id: String,
    pub target_client_id: String,
}

#[derive(Debug, Serialize)]
pub struct KickMemberResponse {
    pub kicked: bool,
}

/// kick — spec §4.2 / §6.1. Host-only; cannot target the host itself.
pub async fn kick_member(
    State(server): State<CoordinatorServer>,
    Path(code): Path<String>,
    Json(body): Json<KickMemberRequest>,
) -> Result<Json<KickMemberResponse>, ApiError> {
    let handle = with_deadline(
        &server,
        server
            .registry
            .kick(&code, &body.client_id, &body.target_client_id),
    )
    .await??;
    handle.bus.kick(&body.target_client_id).await;
    let session = handle.snapshot().await;
    handle
        .bus
        .broadcast_room_state(ServerMessage::RoomState { session })
        .await;
    Ok(Json(KickMemberResponse { kicked: true }))
}
