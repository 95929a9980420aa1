use crate::core_session::Session;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type SessionId = u64;
pub type ListenerId = u64;

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<SessionId, Arc<Session>>,
    listeners: HashMap<ListenerId, SessionId>,
}

/// Owner of every live session, and the listener -> session routing table.
///
/// Sessions are inserted once at accept and removed once at teardown; every
/// other event looks a session up here and never constructs one. The lock is
/// held only for the map operation itself.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
    next_session: AtomicU64,
    next_listener: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_session_id(&self) -> SessionId {
        self.next_session.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn insert(&self, session: Arc<Session>) {
        self.inner.lock().sessions.insert(session.id(), session);
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.inner.lock().sessions.get(&id).cloned()
    }

    /// Removes the session and any listener routes still pointing at it.
    pub fn remove(&self, id: SessionId) -> Option<Arc<Session>> {
        let mut inner = self.inner.lock();
        inner.listeners.retain(|_, owner| *owner != id);
        inner.sessions.remove(&id)
    }

    /// Allocates a listener id routed to `owner`.
    pub fn register_listener(&self, owner: SessionId) -> ListenerId {
        let listener_id = self.next_listener.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.lock().listeners.insert(listener_id, owner);
        listener_id
    }

    pub fn remove_listener(&self, listener_id: ListenerId) -> Option<SessionId> {
        self.inner.lock().listeners.remove(&listener_id)
    }

    pub fn listener_owner(&self, listener_id: ListenerId) -> Option<SessionId> {
        self.inner.lock().listeners.get(&listener_id).copied()
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.inner.lock().sessions.values().cloned().collect()
    }
}
