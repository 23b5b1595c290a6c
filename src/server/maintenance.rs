//! Background eviction sweep (spec §5): the registry is the only thing
//! allowed to evict a session, and it never does so from a connection task.

use std::sync::atomic::Ordering;
use std::time::Duration;

use super::CoordinatorServer;

/// Runs until the process exits, periodically auto-closing sessions whose
/// host has overstayed `host_grace_ms` and clearing idle/past-grace-period
/// closed sessions out of the registry.
pub async fn run(server: CoordinatorServer) {
    let interval = Duration::from_millis(server.config.server.idle_evict_ms.min(60_000).max(1_000));
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;

        let host_timed_out = server
            .registry
            .close_host_grace_expired(server.config.server.host_grace_ms)
            .await;
        for handle in host_timed_out {
            handle.bus.broadcast_closed("host disconnected").await;
        }

        let evicted = server.registry.evict_expired(
            server.config.server.idle_evict_ms,
            server.config.server.closed_grace_ms,
        );
        if !evicted.is_empty() {
            server
                .metrics
                .sessions_evicted
                .fetch_add(evicted.len() as u64, Ordering::Relaxed);
        }
    }
}
