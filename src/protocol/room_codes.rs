//! Invite code generation (C1): 6-character, ambiguity-free charset, with
//! bounded collision retry and a salted fallback.

use rand::RngExt;

/// Charset excludes visually ambiguous characters (0/O, 1/I) per spec §6.6.
pub const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;
const MAX_COLLISION_RETRIES: u32 = 8;

fn draw() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
            // always within [0, len).
            #[allow(clippy::indexing_slicing)]
            CHARSET[idx] as char
        })
        .collect()
}

/// Generate a single candidate invite code without checking for collisions.
#[must_use]
pub fn generate() -> String {
    draw()
}

/// Generate a code guaranteed unique against `exists`, retrying up to
/// [`MAX_COLLISION_RETRIES`] times before falling back to a clock-salted
/// draw so degenerate collision runs still terminate (spec §4.1).
pub fn generate_unique(exists: impl Fn(&str) -> bool) -> String {
    for _ in 0..MAX_COLLISION_RETRIES {
        let candidate = draw();
        if !exists(&candidate) {
            return candidate;
        }
    }

    let candidate = draw();
    let salt_idx = (crate::clock::now_ms() as usize) % CHARSET.len();
    let mut chars: Vec<char> = candidate.chars().collect();
    // SAFETY: `draw()` always returns exactly CODE_LEN (> 0) characters.
    #[allow(clippy::indexing_slicing)]
    {
        chars[0] = CHARSET[salt_idx] as char;
    }
    chars.into_iter().collect()
}

/// Normalize a client-supplied code for lookup (trim + uppercase).
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_the_right_length_and_charset() {
        for _ in 0..50 {
            let code = generate();
            assert_eq!(code.chars().count(), CODE_LEN);
            assert!(code.bytes().all(|b| CHARSET.contains(&b)));
        }
    }

    #[test]
    fn generate_unique_avoids_existing_codes() {
        let taken = "AAAAAA".to_string();
        let code = generate_unique(|c| c == taken);
        assert_ne!(code, taken);
    }

    #[test]
    fn generate_unique_falls_back_when_always_colliding() {
        let code = generate_unique(|_| true);
        assert_eq!(code.chars().count(), CODE_LEN);
    }

    #[test]
    fn canonicalize_trims_and_uppercases() {
        assert_eq!(canonicalize(" ab2cde \n"), "AB2CDE");
    }
}
