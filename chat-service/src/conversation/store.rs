//! In-memory session storage with lazy expiry eviction.
//!
//! All state lives in process memory and is lost on restart, which is the
//! intended lifecycle for conversation sessions.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::clock::Clock;
use super::context::ConversationContext;

/// Session map keyed by session id. Clones share the underlying map, so one
/// store can be handed to every handler that needs it.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, ConversationContext>>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Allocate and store a fresh session with the default expiry.
    pub fn create_session(&self, user_id: Option<Uuid>) -> ConversationContext {
        let context = ConversationContext::new(user_id, self.clock.clone());
        self.sessions.insert(context.session_id, context.clone());
        context
    }

    /// Look up a session. An expired session is evicted on access and
    /// reported as absent; there is no background sweep.
    pub fn get_session(&self, session_id: Uuid) -> Option<ConversationContext> {
        let context = self
            .sessions
            .get(&session_id)
            .map(|entry| entry.value().clone())?;
        if context.is_expired() {
            self.sessions.remove(&session_id);
            return None;
        }
        Some(context)
    }

    /// Overwrite the stored copy by identifier, last write wins.
    pub fn update_session(&self, context: ConversationContext) {
        self.sessions.insert(context.session_id, context);
    }

    /// Remove a session unconditionally; absent ids are ignored.
    pub fn delete_session(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
    }

    /// Drop every session whose expiry has passed, returning how many were
    /// evicted.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, context| !context.is_expired());
        before - self.sessions.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
