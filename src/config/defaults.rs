//! Default value functions for every configuration field.
//!
//! Kept as plain/`const fn`s the way the reference does, so `#[serde(default
//! = "...")]` can point straight at them.

use super::logging::LogFormat;

pub const fn default_port() -> u16 {
    8080
}

pub const fn default_max_sessions() -> usize {
    1000
}

pub const fn default_max_chat_len() -> usize {
    280
}

pub const fn default_chat_ring() -> usize {
    60
}

pub const fn default_host_grace_ms() -> u64 {
    30_000
}

pub const fn default_idle_evict_ms() -> u64 {
    900_000
}

pub const fn default_closed_grace_ms() -> u64 {
    60_000
}

pub const fn default_socket_heartbeat_interval_ms() -> u64 {
    10_000
}

pub const fn default_ping_timeout_ms() -> u64 {
    25_000
}

pub const fn default_remote_analog_deadzone() -> f32 {
    0.03
}

pub const fn default_max_chat_backlog() -> usize {
    64
}

pub const fn default_max_name_len() -> usize {
    32
}

pub const fn default_rest_deadline_secs() -> u64 {
    12
}

pub fn default_cors_origins() -> String {
    "http://localhost:3000,http://localhost:5173".to_string()
}

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "coordinator.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
