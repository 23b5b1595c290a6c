//! Validation for member names, chat text, avatar URLs, and invite codes
//! (C7's non-input counterpart; input clamping lives in `connection`).

use super::room_codes::CHARSET;
use crate::config::ServerConfig;

fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// I1: member display name, collapsed whitespace, bounded length.
pub fn validate_name(raw: &str, config: &ServerConfig) -> Result<String, String> {
    let normalized = normalize_whitespace(raw);
    if normalized.is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if normalized.chars().count() > config.max_name_len {
        return Err(format!(
            "name too long (max {} characters)",
            config.max_name_len
        ));
    }
    Ok(normalized)
}

/// I2: chat text, trimmed, bounded length.
pub fn validate_chat_text(raw: &str, config: &ServerConfig) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("chat message cannot be empty".to_string());
    }
    if trimmed.chars().count() > config.max_chat_len {
        return Err(format!(
            "chat message too long (max {} characters)",
            config.max_chat_len
        ));
    }
    Ok(trimmed.to_string())
}

/// Avatar URL must be fetchable by a browser `<img>` tag without extra
/// scheme-specific risk: http(s) or an inline data URI.
pub fn validate_avatar_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || trimmed.starts_with("data:image")
    {
        Ok(trimmed.to_string())
    } else {
        Err("avatar URL must use http, https, or data:image".to_string())
    }
}

pub const INVITE_CODE_LEN: usize = 6;

/// Format-check (not existence-check) for a client-supplied invite code.
pub fn validate_invite_code_format(code: &str) -> Result<String, String> {
    let upper = super::room_codes::canonicalize(code);
    if upper.chars().count() != INVITE_CODE_LEN {
        return Err(format!(
            "invite code must be exactly {INVITE_CODE_LEN} characters"
        ));
    }
    if !upper.bytes().all(|b| CHARSET.contains(&b)) {
        return Err("invite code contains invalid characters".to_string());
    }
    Ok(upper)
}
