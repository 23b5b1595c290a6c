#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # N64 Multiplayer Coordinator
//!
//! A coordinator service for browser-based N64 emulator online play:
//! session registry, host-authoritative input relay, chat, and WebRTC
//! signalling — entirely in-memory, single process, no database.

/// Per-connection duplex loop: handshake, heartbeat, per-frame dispatch.
pub mod connection;

/// Monotonic clock and identifier generation.
pub mod clock;

/// Configuration loading, validation, and defaults.
pub mod config;

/// Wire-visible error codes and REST/duplex error mapping.
pub mod error;

/// Structured logging configuration.
pub mod logging;

/// In-process metrics counters and exposition.
pub mod metrics;

/// Wire protocol: frame envelopes, payload schemas, invite codes, validation.
pub mod protocol;

/// Per-session message bus: fan-out with per-message-type backpressure.
pub mod bus;

/// Session registry: create/lookup/join/close/kick/evict.
pub mod registry;

/// Session state machine: members, chat, host-authoritative mutations.
pub mod session;

/// Top-level orchestration: shared application state, REST handlers,
/// background eviction sweep.
pub mod server;

/// Axum routing: duplex upgrade, health, metrics.
pub mod websocket;
