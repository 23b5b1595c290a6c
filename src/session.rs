//! Session state machine (C3): `Session`/`Member`/`ChatEntry` and the
//! mutating operations from spec §4.3's op table.
//!
//! Every method here is called from inside the single-writer mutator owned
//! by [`crate::registry::SessionHandle`] (see §5) — `Session` itself has no
//! locking of its own.

use std::collections::VecDeque;

use serde::Serialize;

use crate::clock::{now_ms, ChatIdAllocator};
use crate::protocol::ClientId;

/// The host always occupies slot 1 (I3).
pub const HOST_SLOT: u8 = 1;
const GUEST_SLOTS: [u8; 3] = [2, 3, 4];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub client_id: ClientId,
    pub slot: u8,
    pub name: String,
    pub avatar_url: Option<String>,
    pub is_host: bool,
    pub connected: bool,
    pub joined_at: i64,
    pub last_seen_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub id: i64,
    pub from_client_id: ClientId,
    pub from_name: String,
    pub from_slot: u8,
    pub message: String,
    pub at: i64,
}

/// A read-only view handed to clients as `room_state` (spec §6.4).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub code: String,
    pub created_at: i64,
    pub host_client_id: ClientId,
    pub rom_id: Option<String>,
    pub rom_title: Option<String>,
    pub voice_enabled: bool,
    pub members: Vec<Member>,
    pub chat: Vec<ChatEntry>,
    pub closed: bool,
}

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,
    #[error("room is full")]
    RoomFull,
    #[error("member not found")]
    MemberNotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("chat message too long")]
    ChatTooLong,
}

/// The mutable state owned by one session's single-writer mutator.
#[derive(Debug)]
pub struct Session {
    pub code: String,
    pub created_at: i64,
    pub last_activity_at: i64,
    pub host_client_id: ClientId,
    pub rom_id: Option<String>,
    pub rom_title: Option<String>,
    pub voice_enabled: bool,
    members: Vec<Member>,
    chat: VecDeque<ChatEntry>,
    chat_ids: ChatIdAllocator,
    pub closed: bool,
    pub closed_at: Option<i64>,
    chat_ring_cap: usize,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code: String,
        host_client_id: ClientId,
        host_name: String,
        host_avatar_url: Option<String>,
        rom_id: Option<String>,
        rom_title: Option<String>,
        voice_enabled: bool,
        chat_ring_cap: usize,
    ) -> Self {
        let now = now_ms();
        let host = Member {
            client_id: host_client_id.clone(),
            slot: HOST_SLOT,
            name: host_name,
            avatar_url: host_avatar_url,
            is_host: true,
            connected: false,
            joined_at: now,
            last_seen_at: now,
        };
        Self {
            code,
            created_at: now,
            last_activity_at: now,
            host_client_id,
            rom_id,
            rom_title,
            voice_enabled,
            members: vec![host],
            chat: VecDeque::new(),
            chat_ids: ChatIdAllocator::default(),
            closed: false,
            closed_at: None,
            chat_ring_cap,
        }
    }

    fn touch(&mut self) {
        self.last_activity_at = now_ms();
    }

    #[must_use]
    pub fn member(&self, client_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.client_id == client_id)
    }

    fn member_mut(&mut self, client_id: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.client_id == client_id)
    }

    #[must_use]
    pub fn is_host(&self, client_id: &str) -> bool {
        self.host_client_id == client_id
    }

    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.members.iter().filter(|m| m.connected).count()
    }

    fn next_free_slot(&self) -> Option<u8> {
        GUEST_SLOTS
            .iter()
            .copied()
            .find(|slot| !self.members.iter().any(|m| m.slot == *slot))
    }

    /// member_join — spec §4.3. Allocates the lowest free guest slot (I3).
    pub fn member_join(
        &mut self,
        client_id: ClientId,
        name: String,
        avatar_url: Option<String>,
    ) -> Result<u8, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let slot = self.next_free_slot().ok_or(SessionError::RoomFull)?;
        let now = now_ms();
        self.members.push(Member {
            client_id,
            slot,
            name,
            avatar_url,
            is_host: false,
            connected: false,
            joined_at: now,
            last_seen_at: now,
        });
        self.touch();
        Ok(slot)
    }

    /// socket_attach — spec §4.3, invoked when a member's duplex connects.
    pub fn socket_attach(&mut self, client_id: &str) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let now = now_ms();
        let member = self
            .member_mut(client_id)
            .ok_or(SessionError::MemberNotFound)?;
        member.connected = true;
        member.last_seen_at = now;
        self.touch();
        Ok(())
    }

    /// socket_detach — spec §4.3, invoked when a member's duplex drops.
    pub fn socket_detach(&mut self, client_id: &str) -> Result<(), SessionError> {
        let now = now_ms();
        let member = self
            .member_mut(client_id)
            .ok_or(SessionError::MemberNotFound)?;
        member.connected = false;
        member.last_seen_at = now;
        self.touch();
        Ok(())
    }

    /// chat — spec §4.3. `text` must already be validated (I2) by the caller.
    pub fn chat(&mut self, client_id: &str, text: String) -> Result<ChatEntry, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let member = self.member(client_id).ok_or(SessionError::MemberNotFound)?;
        let entry = ChatEntry {
            id: self.chat_ids.next(),
            from_client_id: client_id.to_string(),
            from_name: member.name.clone(),
            from_slot: member.slot,
            message: text,
            at: now_ms(),
        };
        self.chat.push_back(entry.clone());
        while self.chat.len() > self.chat_ring_cap {
            self.chat.pop_front();
        }
        self.touch();
        Ok(entry)
    }

    /// set_host_rom — spec §4.3. A non-host origin or a closed session is a
    /// silent no-op, not an error: ROM advisories are best-effort metadata.
    pub fn set_host_rom(&mut self, actor: &str, rom_id: Option<String>, rom_title: Option<String>) {
        if !self.is_host(actor) || self.closed {
            return;
        }
        self.rom_id = rom_id;
        self.rom_title = rom_title;
        self.touch();
    }

    /// kick — spec §4.3. Only the host may kick, and never itself.
    pub fn kick(&mut self, actor: &str, target: &str) -> Result<(), SessionError> {
        if !self.is_host(actor) {
            return Err(SessionError::Forbidden);
        }
        if self.is_host(target) {
            return Err(SessionError::Forbidden);
        }
        let before = self.members.len();
        self.members.retain(|m| m.client_id != target);
        if self.members.len() == before {
            return Err(SessionError::MemberNotFound);
        }
        self.touch();
        Ok(())
    }

    /// close — spec §4.3. Only the host may close; terminal, not reversible.
    pub fn close(&mut self, actor: &str) -> Result<(), SessionError> {
        if !self.is_host(actor) {
            return Err(SessionError::Forbidden);
        }
        self.closed = true;
        self.closed_at = Some(now_ms());
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            code: self.code.clone(),
            created_at: self.created_at,
            host_client_id: self.host_client_id.clone(),
            rom_id: self.rom_id.clone(),
            rom_title: self.rom_title.clone(),
            voice_enabled: self.voice_enabled,
            members: self.members.clone(),
            chat: self.chat.iter().cloned().collect(),
            closed: self.closed,
        }
    }

    #[must_use]
    pub fn is_idle_expired(&self, idle_evict_ms: u64) -> bool {
        self.connected_count() == 0 && now_ms() - self.last_activity_at >= idle_evict_ms as i64
    }

    #[must_use]
    pub fn is_closed_expired(&self, closed_grace_ms: u64) -> bool {
        match self.closed_at {
            Some(at) => now_ms() - at >= closed_grace_ms as i64,
            None => false,
        }
    }

    /// I2: the host may disconnect without closing the session, but only for
    /// up to `host_grace_ms`. Past that, the session auto-closes rather than
    /// waiting indefinitely for a host that never reconnects.
    #[must_use]
    pub fn is_host_grace_expired(&self, host_grace_ms: u64) -> bool {
        if self.closed {
            return false;
        }
        match self.member(&self.host_client_id) {
            Some(host) if !host.connected => now_ms() - host.last_seen_at >= host_grace_ms as i64,
            _ => false,
        }
    }

    /// Closes the session without an actor check, for the sweep's
    /// `HOST_GRACE_MS` timeout rather than a host-initiated `close` (§4.3).
    pub fn auto_close(&mut self) {
        self.closed = true;
        self.closed_at = Some(now_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session() -> (Session, ClientId) {
        let host_id = "host-1".to_string();
        let session = Session::new(
            "ABC234".to_string(),
            host_id.clone(),
            "Host".to_string(),
            None,
            None,
            None,
            false,
            60,
        );
        (session, host_id)
    }

    #[test]
    fn host_occupies_slot_one() {
        let (session, host_id) = new_session();
        assert_eq!(session.member(&host_id).unwrap().slot, HOST_SLOT);
        assert!(session.member(&host_id).unwrap().is_host);
    }

    #[test]
    fn four_members_fill_all_slots_fifth_is_full() {
        let (mut session, _host) = new_session();
        for i in 0..3 {
            let slot = session
                .member_join(format!("guest-{i}"), format!("Guest {i}"), None)
                .unwrap();
            assert!((2..=4).contains(&slot));
        }
        let err = session.member_join("guest-4".to_string(), "Guest 4".to_string(), None);
        assert_eq!(err, Err(SessionError::RoomFull));
    }

    #[test]
    fn slots_are_unique_across_members() {
        let (mut session, _host) = new_session();
        for i in 0..3 {
            session
                .member_join(format!("guest-{i}"), format!("Guest {i}"), None)
                .unwrap();
        }
        let mut slots: Vec<u8> = session.members().iter().map(|m| m.slot).collect();
        slots.sort_unstable();
        assert_eq!(slots, vec![1, 2, 3, 4]);
    }

    #[test]
    fn chat_ids_are_monotonically_increasing() {
        let (mut session, host_id) = new_session();
        let first = session.chat(&host_id, "hi".to_string()).unwrap();
        let second = session.chat(&host_id, "there".to_string()).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn chat_ring_drops_oldest_beyond_capacity() {
        let mut session = Session::new(
            "ABC234".to_string(),
            "host-1".to_string(),
            "Host".to_string(),
            None,
            None,
            None,
            false,
            2,
        );
        session.chat("host-1", "one".to_string()).unwrap();
        session.chat("host-1", "two".to_string()).unwrap();
        session.chat("host-1", "three".to_string()).unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.chat.len(), 2);
        assert_eq!(snapshot.chat[0].message, "two");
    }

    #[test]
    fn guest_set_host_rom_is_silently_ignored() {
        let (mut session, _host) = new_session();
        session
            .member_join("guest-0".to_string(), "Guest".to_string(), None)
            .unwrap();
        session.set_host_rom("guest-0", Some("rom-1".to_string()), None);
        assert!(session.rom_id.is_none());
    }

    #[test]
    fn host_set_host_rom_updates_advisory() {
        let (mut session, host_id) = new_session();
        session.set_host_rom(&host_id, Some("rom-1".to_string()), Some("Mario".to_string()));
        assert_eq!(session.rom_id.as_deref(), Some("rom-1"));
    }

    #[test]
    fn kick_cannot_target_the_host() {
        let (mut session, host_id) = new_session();
        let err = session.kick(&host_id, &host_id);
        assert_eq!(err, Err(SessionError::Forbidden));
    }

    #[test]
    fn non_host_cannot_kick() {
        let (mut session, _host) = new_session();
        session
            .member_join("guest-0".to_string(), "Guest".to_string(), None)
            .unwrap();
        session
            .member_join("guest-1".to_string(), "Guest 1".to_string(), None)
            .unwrap();
        let err = session.kick("guest-0", "guest-1");
        assert_eq!(err, Err(SessionError::Forbidden));
    }

    #[test]
    fn host_grace_does_not_expire_while_host_connected() {
        let (mut session, host_id) = new_session();
        session.socket_attach(&host_id).unwrap();
        assert!(!session.is_host_grace_expired(0));
    }

    #[test]
    fn host_grace_expires_once_the_timeout_elapses() {
        let (mut session, host_id) = new_session();
        session.socket_attach(&host_id).unwrap();
        session.socket_detach(&host_id).unwrap();
        assert!(session.is_host_grace_expired(0));
        assert!(!session.is_host_grace_expired(60_000));
    }

    #[test]
    fn auto_close_is_terminal_like_a_host_close() {
        let (mut session, host_id) = new_session();
        session.socket_detach(&host_id).ok();
        session.auto_close();
        assert!(session.closed);
        assert!(session.closed_at.is_some());
    }

    #[test]
    fn close_is_terminal_and_host_only() {
        let (mut session, host_id) = new_session();
        session.close(&host_id).unwrap();
        assert!(session.closed);
        let err = session.member_join("late".to_string(), "Late".to_string(), None);
        assert_eq!(err, Err(SessionError::Closed));
    }
}
