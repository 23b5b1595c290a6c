//! Configuration for the coordinator.
//!
//! Supports JSON configuration files, environment variable overrides, stdin
//! input, and compiled-in defaults, with the precedence documented on
//! [`loader::load`].
//!
//! # Module Structure
//!
//! - [`types`]: root `Config` struct
//! - [`server`]: session limits, eviction timers, input tuning (spec §6.5)
//! - [`security`]: CORS
//! - [`logging`]: logging configuration
//! - [`loader`]: configuration loading functions
//! - [`validation`]: configuration validation functions
//! - [`defaults`]: default value functions

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod security;
pub mod server;
pub mod types;
pub mod validation;

pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use security::SecurityConfig;
pub use server::ServerConfig;
pub use types::Config;
pub use validation::validate_config;
