//! Local session projection for relay consumers

use crate::domain::session::aggregate::CallSession;
use crate::domain::session::event::SessionPatch;
use serde::{Deserialize, Serialize};

/// A participant's local copy of a session record, kept current by merging
/// relay patches.
///
/// Merging is a shallow per-field overwrite: a field absent from the patch is
/// left alone, so a late-arriving partial event cannot erase fields a newer
/// transition already set. `status` additionally only ever moves forward
/// along pending < accepted < terminal, and a terminal status is never
/// rewritten into a different one; redelivered duplicates are no-ops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    session: CallSession,
}

impl SessionView {
    pub fn new(session: CallSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    /// Merge an incoming partial record into the view
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(status) = patch.status {
            let current = self.session.status;
            let moves_forward = status.rank() > current.rank();
            if moves_forward && !current.is_terminal() {
                self.session.status = status;
            }
        }

        if let Some(started_at) = patch.started_at {
            self.session.started_at = Some(started_at);
        }
        if let Some(ended_at) = patch.ended_at {
            self.session.ended_at = Some(ended_at);
        }
        if let Some(duration_hours) = patch.duration_hours {
            self.session.duration_hours = Some(duration_hours);
        }
        if let Some(rate) = patch.rate_at_booking {
            self.session.rate_at_booking = Some(rate);
        }
        if let Some(amount) = patch.amount {
            self.session.amount = Some(amount);
        }
        if let Some(paid) = patch.paid {
            self.session.paid = paid;
        }
        if let Some(updated_at) = patch.updated_at {
            self.session.updated_at = updated_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::value_object::SessionStatus;
    use crate::domain::shared::value_objects::UserId;
    use chrono::{Duration, Utc};

    fn completed_view() -> SessionView {
        let mut session =
            CallSession::new(UserId::new(), UserId::new(), "debug prod issue".to_string()).unwrap();
        let client = session.client_id;
        let developer = session.developer_id;

        session.accept(developer).unwrap();
        let t0 = Utc::now();
        session.begin(client, t0).unwrap();
        session.complete(client, 0.4, t0 + Duration::minutes(90)).unwrap();
        session.take_events();
        SessionView::new(session)
    }

    #[test]
    fn test_late_accepted_event_cannot_downgrade_completed_view() {
        let mut view = completed_view();
        let amount = view.session().amount;

        // A reordered network delivers the earlier transition last
        let stale = SessionPatch {
            status: Some(SessionStatus::Accepted),
            updated_at: Some(Utc::now()),
            ..SessionPatch::default()
        };
        view.apply(&stale);

        assert_eq!(view.session().status, SessionStatus::Completed);
        assert_eq!(view.session().amount, amount);
    }

    #[test]
    fn test_forward_status_applies() {
        let session =
            CallSession::new(UserId::new(), UserId::new(), "code review".to_string()).unwrap();
        let mut view = SessionView::new(session);

        let patch = SessionPatch {
            status: Some(SessionStatus::Accepted),
            ..SessionPatch::default()
        };
        view.apply(&patch);
        assert_eq!(view.session().status, SessionStatus::Accepted);
    }

    #[test]
    fn test_duplicate_delivery_is_noop() {
        let session =
            CallSession::new(UserId::new(), UserId::new(), "pair on tests".to_string()).unwrap();
        let mut view = SessionView::new(session);

        let patch = SessionPatch {
            status: Some(SessionStatus::Accepted),
            ..SessionPatch::default()
        };
        view.apply(&patch);
        view.apply(&patch);
        assert_eq!(view.session().status, SessionStatus::Accepted);
    }

    #[test]
    fn test_terminal_status_never_rewritten() {
        let mut view = completed_view();

        let patch = SessionPatch {
            status: Some(SessionStatus::Cancelled),
            ..SessionPatch::default()
        };
        view.apply(&patch);
        assert_eq!(view.session().status, SessionStatus::Completed);
    }

    #[test]
    fn test_partial_patch_keeps_other_fields() {
        let mut view = completed_view();
        let started_at = view.session().started_at;

        let patch = SessionPatch {
            paid: Some(true),
            ..SessionPatch::default()
        };
        view.apply(&patch);

        assert!(view.session().paid);
        assert_eq!(view.session().started_at, started_at);
        assert_eq!(view.session().status, SessionStatus::Completed);
    }
}
