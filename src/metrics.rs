//! In-process counters exposed at `GET /metrics` (JSON) and
//! `GET /metrics/prom` (Prometheus text exposition format).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct Metrics {
    pub sessions_created: AtomicU64,
    pub sessions_evicted: AtomicU64,
    pub members_joined: AtomicU64,
    pub input_frames_relayed: AtomicU64,
    pub input_frames_dropped: AtomicU64,
    pub chat_sent: AtomicU64,
    pub chat_disconnects: AtomicU64,
    pub ws_connections_accepted: AtomicU64,
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub sessions_created: u64,
    pub sessions_evicted: u64,
    pub members_joined: u64,
    pub input_frames_relayed: u64,
    pub input_frames_dropped: u64,
    pub chat_sent: u64,
    pub chat_disconnects: u64,
    pub ws_connections_accepted: u64,
}

impl Metrics {
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            sessions_evicted: self.sessions_evicted.load(Ordering::Relaxed),
            members_joined: self.members_joined.load(Ordering::Relaxed),
            input_frames_relayed: self.input_frames_relayed.load(Ordering::Relaxed),
            input_frames_dropped: self.input_frames_dropped.load(Ordering::Relaxed),
            chat_sent: self.chat_sent.load(Ordering::Relaxed),
            chat_disconnects: self.chat_disconnects.load(Ordering::Relaxed),
            ws_connections_accepted: self.ws_connections_accepted.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "# TYPE coordinator_sessions_created_total counter\n\
             coordinator_sessions_created_total {}\n\
             # TYPE coordinator_sessions_evicted_total counter\n\
             coordinator_sessions_evicted_total {}\n\
             # TYPE coordinator_members_joined_total counter\n\
             coordinator_members_joined_total {}\n\
             # TYPE coordinator_input_frames_relayed_total counter\n\
             coordinator_input_frames_relayed_total {}\n\
             # TYPE coordinator_input_frames_dropped_total counter\n\
             coordinator_input_frames_dropped_total {}\n\
             # TYPE coordinator_chat_sent_total counter\n\
             coordinator_chat_sent_total {}\n\
             # TYPE coordinator_chat_disconnects_total counter\n\
             coordinator_chat_disconnects_total {}\n\
             # TYPE coordinator_ws_connections_accepted_total counter\n\
             coordinator_ws_connections_accepted_total {}\n",
            snapshot.sessions_created,
            snapshot.sessions_evicted,
            snapshot.members_joined,
            snapshot.input_frames_relayed,
            snapshot.input_frames_dropped,
            snapshot.chat_sent,
            snapshot.chat_disconnects,
            snapshot.ws_connections_accepted,
        )
    }
}
