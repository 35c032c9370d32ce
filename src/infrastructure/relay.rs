//! Session change relay
//!
//! Fans session mutations out to subscribed views. One broadcast channel per
//! session id carries partial-record patches; one channel per developer id
//! announces newly created requests. Delivery is at-least-once and unordered
//! across distinct transitions; consumers reconcile through `SessionView`.

use crate::domain::session::aggregate::CallSession;
use crate::domain::session::event::SessionPatch;
use crate::domain::session::notifier::SessionNotifier;
use crate::domain::shared::value_objects::{SessionId, UserId};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 256;

/// In-process publish/subscribe hub for session changes
pub struct SessionRelay {
    sessions: Mutex<HashMap<SessionId, broadcast::Sender<SessionPatch>>>,
    developers: Mutex<HashMap<UserId, broadcast::Sender<CallSession>>>,
}

impl SessionRelay {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            developers: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to one session's mutations.
    ///
    /// Each session has its own channel; dropping the receiver releases the
    /// subscription.
    pub fn subscribe_session(&self, session_id: SessionId) -> broadcast::Receiver<SessionPatch> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Subscribe to new requests addressed to a developer
    pub fn subscribe_developer(&self, developer_id: UserId) -> broadcast::Receiver<CallSession> {
        let mut developers = self.developers.lock().unwrap();
        developers
            .entry(developer_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Get number of active subscribers on a session's channel
    pub fn session_subscriber_count(&self, session_id: &SessionId) -> usize {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(session_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop channels nobody listens to anymore
    pub fn release_idle_channels(&self) -> usize {
        let mut removed = 0;

        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, tx| tx.receiver_count() > 0);
        removed += before - sessions.len();

        let mut developers = self.developers.lock().unwrap();
        let before = developers.len();
        developers.retain(|_, tx| tx.receiver_count() > 0);
        removed += before - developers.len();

        removed
    }
}

impl Default for SessionRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionNotifier for SessionRelay {
    fn announce_request(&self, session: &CallSession) {
        let developers = self.developers.lock().unwrap();
        if let Some(tx) = developers.get(&session.developer_id) {
            // Ignore send errors (no receivers)
            let _ = tx.send(session.clone());
            debug!(session = %session.id, developer = %session.developer_id, "announced new request");
        }
    }

    fn publish(&self, session_id: SessionId, patch: &SessionPatch) {
        let sessions = self.sessions.lock().unwrap();
        if let Some(tx) = sessions.get(&session_id) {
            let _ = tx.send(patch.clone());
            debug!(session = %session_id, "published session patch");
        }
    }
}
