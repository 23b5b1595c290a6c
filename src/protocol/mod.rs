//! Wire contracts: frame envelopes, payload schemas, invite codes, and
//! validation for everything that crosses the network boundary.

pub mod messages;
pub mod room_codes;
pub mod types;
pub mod validation;

pub use messages::{ClientMessage, ServerMessage};
pub use types::{ClientId, DigitalControl, InputPayload, SessionCode, SignalPayload};
