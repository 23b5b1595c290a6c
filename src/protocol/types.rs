//! Core wire/domain types shared across the coordinator (spec §3, §6.2).

use serde::{Deserialize, Serialize};

/// Opaque per-connection client token (C9), not a game identity.
pub type ClientId = String;

/// A 6-character invite code (C1).
pub type SessionCode = String;

/// A single N64 controller digital control (the 18-element `KnownControls`
/// set, §3/§4.7): the 14 physical buttons plus the four directions of the
/// analog stick reported as discrete presses for menu-style navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitalControl {
    A,
    B,
    Z,
    Start,
    L,
    R,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    CUp,
    CDown,
    CLeft,
    CRight,
    StickUp,
    StickDown,
    StickLeft,
    StickRight,
}

/// An input frame relayed from a guest to the host (C7, I5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputPayload {
    Digital { control: DigitalControl, pressed: bool },
    Analog { x: f32, y: f32 },
}

/// An opaque WebRTC signalling payload relayed byte-for-byte (C8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalPayload {
    Offer { sdp: String },
    Answer { sdp: String },
    IceCandidate { candidate: String },
}
