//! Session change notification interface

use crate::domain::session::aggregate::CallSession;
use crate::domain::session::event::SessionPatch;
use crate::domain::shared::value_objects::SessionId;

/// Port for propagating session mutations to interested views.
///
/// Delivery is at-least-once and unordered across distinct transitions;
/// consumers reconcile through `SessionView`. Implementations must never
/// fail the mutation that triggered the notification: a relay problem is
/// logged and swallowed.
pub trait SessionNotifier: Send + Sync {
    /// Announce a newly created request on the developer's channel
    fn announce_request(&self, session: &CallSession);

    /// Publish a partial update on the session's channel
    fn publish(&self, session_id: SessionId, patch: &SessionPatch);
}

/// Notifier that drops everything, for tests and offline tools
pub struct NullNotifier;

impl SessionNotifier for NullNotifier {
    fn announce_request(&self, _session: &CallSession) {}

    fn publish(&self, _session_id: SessionId, _patch: &SessionPatch) {}
}
