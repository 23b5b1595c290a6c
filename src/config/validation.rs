//! Configuration sanity checks run at startup (`--validate-config`).

use super::Config;

/// Validate cross-field invariants that `serde`'s per-field defaults can't
/// express (ranges, non-emptiness). Called by `main` for `--validate-config`
/// and, best-effort, by [`super::loader::load`].
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    if config.server.max_sessions == 0 {
        anyhow::bail!("server.max_sessions must be greater than 0");
    }
    if config.server.max_chat_len == 0 {
        anyhow::bail!("server.max_chat_len must be greater than 0");
    }
    if !(0.0..1.0).contains(&config.server.remote_analog_deadzone) {
        anyhow::bail!("server.remote_analog_deadzone must be in [0.0, 1.0)");
    }
    if config.server.max_chat_backlog == 0 {
        anyhow::bail!("server.max_chat_backlog must be greater than 0");
    }
    if config.security.cors_origins.trim().is_empty() {
        anyhow::bail!("security.cors_origins must not be empty (use \"*\" for permissive CORS)");
    }
    Ok(())
}
