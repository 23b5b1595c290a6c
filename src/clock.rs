//! Monotonic clock and identifier generation (C9).
//!
//! All session timestamps use milliseconds since process start, never
//! wall-clock time — the coordinator makes no promises across restarts.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use base64::Engine;
use rand::RngExt;

fn process_start() -> Instant {
    static START: OnceLock<Instant> = OnceLock::new();
    *START.get_or_init(Instant::now)
}

/// Milliseconds elapsed since this process started.
#[must_use]
pub fn now_ms() -> i64 {
    process_start().elapsed().as_millis() as i64
}

/// A 128-bit opaque client token, base64url-encoded without padding
/// (22 characters).
#[must_use]
pub fn generate_client_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = std::array::from_fn(|_| rng.random_range(0..=255) as u8);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Session-local monotonic chat id allocator (I4: strictly increasing).
#[derive(Debug, Default)]
pub struct ChatIdAllocator(AtomicI64);

impl ChatIdAllocator {
    #[must_use]
    pub fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}
