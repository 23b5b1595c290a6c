//! Coordinator behavior configuration: session limits, eviction timers,
//! and input tuning — the option table from spec §6.5.

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_chat_ring, default_closed_grace_ms, default_host_grace_ms, default_idle_evict_ms,
    default_max_chat_backlog, default_max_chat_len, default_max_name_len, default_max_sessions,
    default_ping_timeout_ms, default_remote_analog_deadzone, default_rest_deadline_secs,
    default_socket_heartbeat_interval_ms,
};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Hard cap on concurrently live sessions (C2, C6 503 mapping).
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Maximum chat message length in characters (I2).
    #[serde(default = "default_max_chat_len")]
    pub max_chat_len: usize,
    /// Number of chat entries retained per session (§3 ChatEntry ring).
    #[serde(default = "default_chat_ring")]
    pub chat_ring: usize,
    /// Grace period before an unattached host's session is evicted.
    #[serde(default = "default_host_grace_ms")]
    pub host_grace_ms: u64,
    /// Idle (zero connected members) eviction threshold.
    #[serde(default = "default_idle_evict_ms")]
    pub idle_evict_ms: u64,
    /// How long a closed session stays lookup-able before hard eviction.
    #[serde(default = "default_closed_grace_ms")]
    pub closed_grace_ms: u64,
    /// Server-initiated heartbeat ping interval.
    #[serde(default = "default_socket_heartbeat_interval_ms")]
    pub socket_heartbeat_interval_ms: u64,
    /// Missing-pong timeout before a connection is considered dead.
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,
    /// Analog stick deadzone applied by the input validator (C7).
    #[serde(default = "default_remote_analog_deadzone")]
    pub remote_analog_deadzone: f32,
    /// Chat backlog depth before a slow subscriber is disconnected (C5).
    #[serde(default = "default_max_chat_backlog")]
    pub max_chat_backlog: usize,
    /// Maximum member display name length (I1).
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
    /// REST mutation deadline in seconds (§5).
    #[serde(default = "default_rest_deadline_secs")]
    pub rest_deadline_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            max_chat_len: default_max_chat_len(),
            chat_ring: default_chat_ring(),
            host_grace_ms: default_host_grace_ms(),
            idle_evict_ms: default_idle_evict_ms(),
            closed_grace_ms: default_closed_grace_ms(),
            socket_heartbeat_interval_ms: default_socket_heartbeat_interval_ms(),
            ping_timeout_ms: default_ping_timeout_ms(),
            remote_analog_deadzone: default_remote_analog_deadzone(),
            max_chat_backlog: default_max_chat_backlog(),
            max_name_len: default_max_name_len(),
            rest_deadline_secs: default_rest_deadline_secs(),
        }
    }
}
