//! Wire-visible error codes and the mapping from internal errors to the
//! REST status / duplex close codes described in spec §7.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::RegistryError;
use crate::session::SessionError;

/// Error codes surfaced to clients, either as `{"error": "..."}` on REST or
/// implicitly via a close code on the duplex channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    InvalidPlayerName,
    InvalidChatMessage,
    InvalidAvatarUrl,
    InvalidInviteCode,
    SessionNotFound,
    Forbidden,
    RoomFull,
    CapacityExhausted,
    InternalError,
}

impl ErrorCode {
    /// A human-readable, actionable description of this error code.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The request body is malformed or missing required fields.",
            Self::InvalidPlayerName => {
                "The player name is invalid. Names must be non-empty and at most 32 characters."
            }
            Self::InvalidChatMessage => {
                "The chat message is invalid. Messages must be non-empty and at most 280 characters."
            }
            Self::InvalidAvatarUrl => {
                "The avatar URL must use the http, https, or data:image scheme."
            }
            Self::InvalidInviteCode => {
                "The invite code is malformed. Codes are exactly 6 characters from the invite code charset."
            }
            Self::SessionNotFound => {
                "No session exists for the given invite code, or it has been evicted."
            }
            Self::Forbidden => "Only the host of this session may perform that action.",
            Self::RoomFull => "The session already has 4 members; no slots are free.",
            Self::CapacityExhausted => {
                "The coordinator is at its session capacity. Try again shortly."
            }
            Self::InternalError => "An internal coordinator error occurred.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Duplex close codes, spec §4.4.
pub mod close_code {
    pub const NORMAL: u16 = 1000;
    pub const AUTH: u16 = 4401;
    pub const KICKED: u16 = 4403;
    pub const SESSION_CLOSED: u16 = 4000;
    pub const SUPERSEDED: u16 = 4409;
    pub const INTERNAL: u16 = 4500;
}

/// HTTP status for a REST error, per §7's mapping table.
#[must_use]
pub fn http_status(err: &RegistryError) -> axum::http::StatusCode {
    use axum::http::StatusCode;
    match err {
        RegistryError::NotFound => StatusCode::NOT_FOUND,
        RegistryError::Forbidden | RegistryError::Session(SessionError::Forbidden) => {
            StatusCode::FORBIDDEN
        }
        RegistryError::RoomFull | RegistryError::Session(SessionError::RoomFull) => {
            StatusCode::CONFLICT
        }
        RegistryError::CapacityExhausted => StatusCode::SERVICE_UNAVAILABLE,
        RegistryError::Session(SessionError::Closed) => StatusCode::NOT_FOUND,
        RegistryError::Session(SessionError::MemberNotFound) => StatusCode::NOT_FOUND,
        RegistryError::Session(SessionError::ChatTooLong) => StatusCode::BAD_REQUEST,
    }
}

#[must_use]
pub fn error_code(err: &RegistryError) -> ErrorCode {
    match err {
        RegistryError::NotFound | RegistryError::Session(SessionError::MemberNotFound) => {
            ErrorCode::SessionNotFound
        }
        RegistryError::Forbidden | RegistryError::Session(SessionError::Forbidden) => {
            ErrorCode::Forbidden
        }
        RegistryError::RoomFull | RegistryError::Session(SessionError::RoomFull) => {
            ErrorCode::RoomFull
        }
        RegistryError::CapacityExhausted => ErrorCode::CapacityExhausted,
        RegistryError::Session(SessionError::Closed) => ErrorCode::SessionNotFound,
        RegistryError::Session(SessionError::ChatTooLong) => ErrorCode::InvalidChatMessage,
    }
}
