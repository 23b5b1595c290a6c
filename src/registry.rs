//! Session Registry (C2): process-wide mapping from invite code to session,
//! and the only place permitted to create, look up, or evict sessions
//! (spec §4.2, §5).

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::bus::SessionBus;
use crate::clock::generate_client_id;
use crate::config::ServerConfig;
use crate::protocol::{room_codes, ClientId};
use crate::session::{Session, SessionError, SessionSnapshot};

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("session not found")]
    NotFound,
    #[error("room is full")]
    RoomFull,
    #[error("forbidden")]
    Forbidden,
    #[error("registry at capacity")]
    CapacityExhausted,
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// One session's serialized mutator: every mutation runs under this lock,
/// one at a time, and its message bus for fan-out (spec §5's
/// single-writer-per-session discipline).
pub struct SessionHandle {
    inner: Mutex<Session>,
    pub bus: SessionBus,
}

impl SessionHandle {
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Run a closure against the session under its single-writer lock.
    /// Never call socket I/O from inside `f` (§5: mutation never blocks on
    /// socket I/O).
    pub async fn with_mut<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }

    pub async fn try_with_mut<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut guard = self.inner.try_lock().ok()?;
        Some(f(&mut guard))
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Arc<SessionHandle>>>,
    config: Arc<ServerConfig>,
}

pub struct CreatedSession {
    pub code: String,
    pub client_id: ClientId,
    pub handle: Arc<SessionHandle>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            config,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.sessions.len() >= self.config.max_sessions
    }

    /// create — spec §4.2.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        host_name: String,
        host_avatar_url: Option<String>,
        rom_id: Option<String>,
        rom_title: Option<String>,
        voice_enabled: bool,
    ) -> Result<CreatedSession, RegistryError> {
        if self.is_at_capacity() {
            return Err(RegistryError::CapacityExhausted);
        }
        let code = room_codes::generate_unique(|c| self.sessions.contains_key(c));
        let client_id = generate_client_id();
        let session = Session::new(
            code.clone(),
            client_id.clone(),
            host_name,
            host_avatar_url,
            rom_id,
            rom_title,
            voice_enabled,
            self.config.chat_ring,
        );
        let handle = Arc::new(SessionHandle {
            inner: Mutex::new(session),
            bus: SessionBus::default(),
        });
        self.sessions.insert(code.clone(), handle.clone());
        tracing::info!(code = %code, %client_id, "session created");
        Ok(CreatedSession {
            code,
            client_id,
            handle,
        })
    }

    /// lookup — spec §4.2.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<Arc<SessionHandle>> {
        let code = room_codes::canonicalize(code);
        self.sessions.get(&code).map(|entry| entry.clone())
    }

    /// join — spec §4.2.
    pub async fn join(
        &self,
        code: &str,
        name: String,
        avatar_url: Option<String>,
    ) -> Result<(ClientId, u8, Arc<SessionHandle>), RegistryError> {
        let handle = self.lookup(code).ok_or(RegistryError::NotFound)?;
        let client_id = generate_client_id();
        let slot = handle
            .with_mut(|session| session.member_join(client_id.clone(), name, avatar_url))
            .await?;
        tracing::info!(%code, %client_id, slot, "member joined");
        Ok((client_id, slot, handle))
    }

    /// close — spec §4.2.
    pub async fn close(&self, code: &str, actor: &str) -> Result<Arc<SessionHandle>, RegistryError> {
        let handle = self.lookup(code).ok_or(RegistryError::NotFound)?;
        handle.with_mut(|session| session.close(actor)).await?;
        tracing::info!(%code, actor, "session closed");
        Ok(handle)
    }

    /// kick — spec §4.2.
    pub async fn kick(
        &self,
        code: &str,
        actor: &str,
        target: &str,
    ) -> Result<Arc<SessionHandle>, RegistryError> {
        let handle = self.lookup(code).ok_or(RegistryError::NotFound)?;
        handle.with_mut(|session| session.kick(actor, target)).await?;
        tracing::info!(%code, actor, target, "member kicked");
        Ok(handle)
    }

    /// Auto-close sessions whose host has been disconnected past
    /// `host_grace_ms` (I2, spec §4.3/§6.5), returning the handles that just
    /// transitioned so the caller can broadcast `session_closed` to any
    /// guests still attached. Distinct from `evict_expired`: this closes a
    /// session in place rather than removing it from the registry, so the
    /// usual `closed_grace_ms` window still applies afterward.
    pub async fn close_host_grace_expired(&self, host_grace_ms: u64) -> Vec<Arc<SessionHandle>> {
        let handles: Vec<Arc<SessionHandle>> =
            self.sessions.iter().map(|entry| entry.value().clone()).collect();
        let mut closed = Vec::new();
        for handle in handles {
            let just_closed = handle
                .with_mut(|session| {
                    if session.is_host_grace_expired(host_grace_ms) {
                        session.auto_close();
                        true
                    } else {
                        false
                    }
                })
                .await;
            if just_closed {
                closed.push(handle);
            }
        }
        closed
    }

    /// Evict sessions past their idle/closed grace periods (spec §5: only
    /// the registry may evict, never a connection task). Sessions currently
    /// under mutation are left for the next sweep rather than blocked on.
    #[must_use]
    pub fn evict_expired(&self, idle_evict_ms: u64, closed_grace_ms: u64) -> Vec<String> {
        let mut evicted = Vec::new();
        self.sessions.retain(|code, handle| {
            let expired = match handle.inner.try_lock() {
                Ok(session) => {
                    session.is_closed_expired(closed_grace_ms) || session.is_idle_expired(idle_evict_ms)
                }
                Err(_) => false,
            };
            if expired {
                evicted.push(code.clone());
            }
            !expired
        });
        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "sessions evicted");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(ServerConfig::default()))
    }

    #[test]
    fn create_generates_a_six_character_code() {
        let registry = registry();
        let created = registry
            .create("Host".to_string(), None, None, None, false)
            .unwrap();
        assert_eq!(created.code.chars().count(), 6);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn create_fails_at_capacity() {
        let mut cfg = ServerConfig::default();
        cfg.max_sessions = 1;
        let registry = SessionRegistry::new(Arc::new(cfg));
        registry
            .create("Host".to_string(), None, None, None, false)
            .unwrap();
        let err = registry.create("Host 2".to_string(), None, None, None, false);
        assert_eq!(err.unwrap_err(), RegistryError::CapacityExhausted);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = registry();
        let created = registry
            .create("Host".to_string(), None, None, None, false)
            .unwrap();
        let found = registry.lookup(&created.code.to_ascii_lowercase());
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn join_allocates_a_guest_slot() {
        let registry = registry();
        let created = registry
            .create("Host".to_string(), None, None, None, false)
            .unwrap();
        let (_client_id, slot, _handle) = registry
            .join(&created.code, "Guest".to_string(), None)
            .await
            .unwrap();
        assert!((2..=4).contains(&slot));
    }

    #[tokio::test]
    async fn join_unknown_code_returns_not_found() {
        let registry = registry();
        let err = registry.join("ZZZZZZ", "Guest".to_string(), None).await;
        assert_eq!(err.unwrap_err(), RegistryError::NotFound);
    }

    #[tokio::test]
    async fn close_requires_host_actor() {
        let registry = registry();
        let created = registry
            .create("Host".to_string(), None, None, None, false)
            .unwrap();
        let err = registry.close(&created.code, "not-the-host").await;
        assert_eq!(err.unwrap_err(), RegistryError::Session(SessionError::Forbidden));
    }

    #[tokio::test]
    async fn close_host_grace_expired_closes_an_unattached_host_session() {
        let registry = registry();
        let created = registry
            .create("Host".to_string(), None, None, None, false)
            .unwrap();
        let closed = registry.close_host_grace_expired(0).await;
        assert_eq!(closed.len(), 1);
        assert!(created.handle.snapshot().await.closed);
    }

    #[tokio::test]
    async fn close_host_grace_expired_leaves_an_attached_host_alone() {
        let registry = registry();
        let created = registry
            .create("Host".to_string(), None, None, None, false)
            .unwrap();
        created
            .handle
            .with_mut(|session| session.socket_attach(&created.client_id))
            .await
            .unwrap();
        let closed = registry.close_host_grace_expired(0).await;
        assert!(closed.is_empty());
        assert!(!created.handle.snapshot().await.closed);
    }

    #[test]
    fn evict_expired_removes_idle_sessions() {
        let mut cfg = ServerConfig::default();
        cfg.idle_evict_ms = 0;
        let registry = SessionRegistry::new(Arc::new(cfg));
        registry
            .create("Host".to_string(), None, None, None, false)
            .unwrap();
        let evicted = registry.evict_expired(0, 60_000);
        assert_eq!(evicted.len(), 1);
        assert_eq!(registry.len(), 0);
    }
}
