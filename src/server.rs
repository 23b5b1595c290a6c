//! Top-level orchestration: wires configuration, the session registry, and
//! metrics into the shared application state handed to every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::registry::SessionRegistry;

pub mod maintenance;
pub mod rest;

#[derive(Clone)]
pub struct CoordinatorServer {
    pub registry: SessionRegistry,
    pub config: Arc<Config>,
    pub metrics: Arc<Metrics>,
}

impl CoordinatorServer {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        let registry = SessionRegistry::new(Arc::new(config.server.clone()));
        Self {
            registry,
            config,
            metrics: Arc::new(Metrics::default()),
        }
    }

    /// 200 while the registry can still accept sessions, 503 once it's at
    /// `max_sessions` capacity (spec §11): there is no other external
    /// dependency to probe.
    #[must_use]
    pub fn health_check(&self) -> bool {
        !self.registry.is_at_capacity()
    }
}
