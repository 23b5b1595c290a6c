//! Duplex frame envelopes exchanged over `/ws` (spec §6.3-6.4).

use serde::{Deserialize, Serialize};

use super::types::{ClientId, InputPayload, SignalPayload};
use crate::session::{ChatEntry, SessionSnapshot};

/// Frames a connected client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Ping,
    Input {
        payload: InputPayload,
    },
    Chat {
        text: String,
    },
    /// Host-only ROM advisory; silently ignored from a guest (§4.3 set_host_rom).
    HostRom {
        #[serde(default)]
        rom_id: Option<String>,
        #[serde(default)]
        rom_title: Option<String>,
    },
    WebrtcSignal {
        target_client_id: ClientId,
        payload: SignalPayload,
    },
}

/// Frames the coordinator may send.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomState {
        session: SessionSnapshot,
    },
    RemoteInput {
        from_client_id: ClientId,
        from_slot: u8,
        from_name: String,
        at: i64,
        payload: InputPayload,
    },
    Chat {
        entry: ChatEntry,
    },
    WebrtcSignal {
        from_client_id: ClientId,
        payload: SignalPayload,
    },
    SessionClosed {
        reason: String,
    },
    Error {
        code: crate::error::ErrorCode,
        message: String,
    },
    Pong,
}
