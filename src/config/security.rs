//! Security-adjacent configuration: currently just CORS, since the
//! coordinator has no auth, TLS, or token-binding surface.

use serde::{Deserialize, Serialize};

use super::defaults::default_cors_origins;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Comma-separated allowed origins, or "*" for permissive CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
        }
    }
}
