//! Call session aggregate root

use crate::domain::billing::{self, Fee};
use crate::domain::session::event::{self, SessionEvent};
use crate::domain::session::value_object::SessionStatus;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One consultation engagement between a client and a developer.
///
/// This is the aggregate that owns the lifecycle guards: every status change
/// goes through a method that checks the acting user and the transition
/// table. Two independent processes mutate the same record through the store,
/// so the guards are the only protection against illegal concurrent
/// transitions; races on `begin` resolve by idempotence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    pub id: SessionId,
    pub client_id: UserId,
    pub developer_id: UserId,
    pub task_description: String,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_hours: Option<f64>,
    pub rate_at_booking: Option<f64>,
    pub amount: Option<f64>,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Pending domain events
    #[serde(skip)]
    pub(crate) events: Vec<SessionEvent>,
}

impl CallSession {
    /// Create a new consultation request in `pending`
    pub fn new(client_id: UserId, developer_id: UserId, task_description: String) -> Result<Self> {
        if task_description.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "task description must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let id = SessionId::new();
        let mut session = Self {
            id,
            client_id,
            developer_id,
            task_description,
            status: SessionStatus::Pending,
            started_at: None,
            ended_at: None,
            duration_hours: None,
            rate_at_booking: None,
            amount: None,
            paid: false,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        };

        session.record_event(event::requested(id, client_id, developer_id));
        Ok(session)
    }

    /// Developer accepts the request.
    ///
    /// A scheduling decision only: the session does not start until a
    /// participant actually enters the room.
    pub fn accept(&mut self, actor: UserId) -> Result<()> {
        if actor != self.developer_id {
            return Err(DomainError::Unauthorized(format!(
                "only the developer may accept session {}",
                self.id
            )));
        }

        self.transition_to(SessionStatus::Accepted)?;
        self.record_event(event::accepted(self.id));
        Ok(())
    }

    /// Developer declines the request, terminally
    pub fn reject(&mut self, actor: UserId) -> Result<()> {
        if actor != self.developer_id {
            return Err(DomainError::Unauthorized(format!(
                "only the developer may reject session {}",
                self.id
            )));
        }

        self.transition_to(SessionStatus::Rejected)?;
        self.record_event(event::rejected(self.id));
        Ok(())
    }

    /// Client withdraws the request while it is still pending
    pub fn cancel(&mut self, actor: UserId) -> Result<()> {
        if actor != self.client_id {
            return Err(DomainError::Unauthorized(format!(
                "only the client may cancel session {}",
                self.id
            )));
        }

        self.transition_to(SessionStatus::Cancelled)?;
        self.record_event(event::cancelled(self.id));
        Ok(())
    }

    /// Mark the live session as started.
    ///
    /// Idempotent: only the first caller sets `started_at`; a second caller
    /// (the other participant racing to join) gets `Ok(false)` and the
    /// original timestamp stands. The status stays `accepted` until the
    /// call completes.
    pub fn begin(&mut self, actor: UserId, at: DateTime<Utc>) -> Result<bool> {
        self.require_participant(actor)?;

        if self.status != SessionStatus::Accepted {
            return Err(DomainError::InvalidStateTransition(format!(
                "cannot start session {} while {}",
                self.id,
                self.status.as_str()
            )));
        }

        if self.started_at.is_some() {
            return Ok(false);
        }

        self.started_at = Some(at);
        self.updated_at = at;
        self.record_event(event::started(self.id, at, actor));
        Ok(true)
    }

    /// Finish the call and compute the fee.
    ///
    /// `rate` is the developer's hourly rate as read at completion time.
    pub fn complete(&mut self, actor: UserId, rate: f64, at: DateTime<Utc>) -> Result<Fee> {
        self.require_participant(actor)?;

        if self.status != SessionStatus::Accepted {
            return Err(DomainError::InvalidStateTransition(format!(
                "cannot complete session {} while {}",
                self.id,
                self.status.as_str()
            )));
        }

        let started_at = self.started_at.ok_or_else(|| {
            DomainError::MissingStart(format!("session {} was never started", self.id))
        })?;

        let fee = billing::settle(started_at, at, rate)?;

        self.transition_to(SessionStatus::Completed)?;
        self.ended_at = Some(at);
        self.duration_hours = Some(fee.duration_hours);
        self.rate_at_booking = Some(rate);
        self.amount = Some(fee.amount);
        self.updated_at = at;
        self.record_event(event::completed(
            self.id,
            at,
            fee.duration_hours,
            rate,
            fee.amount,
        ));

        Ok(fee)
    }

    /// Record a successful payout of the fee
    pub fn mark_paid(&mut self, actor: UserId, tx_reference: String) -> Result<()> {
        if actor != self.client_id {
            return Err(DomainError::Unauthorized(format!(
                "only the client settles session {}",
                self.id
            )));
        }

        if self.status != SessionStatus::Completed {
            return Err(DomainError::InvalidStateTransition(format!(
                "cannot settle session {} while {}",
                self.id,
                self.status.as_str()
            )));
        }

        if self.paid {
            return Err(DomainError::InvalidStateTransition(format!(
                "session {} is already settled",
                self.id
            )));
        }

        self.paid = true;
        self.updated_at = Utc::now();
        self.record_event(event::settled(self.id, tx_reference));
        Ok(())
    }

    pub fn is_participant(&self, actor: UserId) -> bool {
        actor == self.client_id || actor == self.developer_id
    }

    fn require_participant(&self, actor: UserId) -> Result<()> {
        if self.is_participant(actor) {
            Ok(())
        } else {
            Err(DomainError::Unauthorized(format!(
                "{} is not a participant of session {}",
                actor, self.id
            )))
        }
    }

    /// Transition to a new status
    fn transition_to(&mut self, new_status: SessionStatus) -> Result<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(DomainError::InvalidStateTransition(format!(
                "cannot transition session {} from {} to {}",
                self.id,
                self.status.as_str(),
                new_status.as_str()
            )));
        }

        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a domain event
    fn record_event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_session() -> CallSession {
        CallSession::new(UserId::new(), UserId::new(), "fix bug".to_string()).unwrap()
    }

    #[test]
    fn test_new_session_is_pending() {
        let session = create_test_session();
        assert_eq!(session.status, SessionStatus::Pending);
        assert!(session.started_at.is_none());
        assert!(session.amount.is_none());
        assert!(!session.paid);
    }

    #[test]
    fn test_new_session_rejects_empty_task() {
        let result = CallSession::new(UserId::new(), UserId::new(), "   ".to_string());
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_full_lifecycle() {
        let mut session = create_test_session();
        let client = session.client_id;
        let developer = session.developer_id;

        session.accept(developer).unwrap();
        assert_eq!(session.status, SessionStatus::Accepted);
        assert!(session.started_at.is_none());

        let t0 = Utc::now();
        assert!(session.begin(client, t0).unwrap());
        assert_eq!(session.started_at, Some(t0));
        assert_eq!(session.status, SessionStatus::Accepted);

        // Other participant races in: no-op, timestamp stands
        assert!(!session.begin(developer, t0 + Duration::seconds(3)).unwrap());
        assert_eq!(session.started_at, Some(t0));

        let t1 = t0 + Duration::minutes(90);
        let fee = session.complete(client, 0.4, t1).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(fee.duration_hours, 1.5);
        assert_eq!(session.amount, Some(0.6));
        assert_eq!(session.rate_at_booking, Some(0.4));
        assert_eq!(session.ended_at, Some(t1));

        // requested, accepted, started, completed
        assert_eq!(session.take_events().len(), 4);
    }

    #[test]
    fn test_accept_requires_developer() {
        let mut session = create_test_session();
        let client = session.client_id;

        let result = session.accept(client);
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));

        let result = session.accept(UserId::new());
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn test_cancel_requires_client() {
        let mut session = create_test_session();
        let developer = session.developer_id;

        let result = session.cancel(developer);
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn test_accept_after_reject_fails() {
        let mut session = create_test_session();
        let developer = session.developer_id;

        session.reject(developer).unwrap();
        assert_eq!(session.status, SessionStatus::Rejected);

        let result = session.accept(developer);
        assert!(matches!(result, Err(DomainError::InvalidStateTransition(_))));
    }

    #[test]
    fn test_accept_after_cancel_fails() {
        let mut session = create_test_session();
        let client = session.client_id;
        let developer = session.developer_id;

        session.cancel(client).unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);

        let result = session.accept(developer);
        assert!(matches!(result, Err(DomainError::InvalidStateTransition(_))));
    }

    #[test]
    fn test_begin_requires_accepted() {
        let mut session = create_test_session();
        let client = session.client_id;

        let result = session.begin(client, Utc::now());
        assert!(matches!(result, Err(DomainError::InvalidStateTransition(_))));
    }

    #[test]
    fn test_begin_rejects_strangers() {
        let mut session = create_test_session();
        let developer = session.developer_id;
        session.accept(developer).unwrap();

        let result = session.begin(UserId::new(), Utc::now());
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn test_complete_without_begin_fails() {
        let mut session = create_test_session();
        let developer = session.developer_id;
        session.accept(developer).unwrap();

        let result = session.complete(developer, 0.4, Utc::now());
        assert!(matches!(result, Err(DomainError::MissingStart(_))));
    }

    #[test]
    fn test_complete_while_pending_fails() {
        let mut session = create_test_session();
        let client = session.client_id;

        let result = session.complete(client, 0.4, Utc::now());
        assert!(matches!(result, Err(DomainError::InvalidStateTransition(_))));
    }

    #[test]
    fn test_completed_session_has_settlement_fields() {
        let mut session = create_test_session();
        let client = session.client_id;
        let developer = session.developer_id;

        session.accept(developer).unwrap();
        let t0 = Utc::now();
        session.begin(developer, t0).unwrap();
        session.complete(client, 0.25, t0 + Duration::hours(2)).unwrap();

        assert!(session.started_at.is_some());
        assert!(session.ended_at.is_some());
        assert!(session.amount.unwrap() >= 0.0);
        assert_eq!(session.duration_hours, Some(2.0));
    }

    #[test]
    fn test_mark_paid_once() {
        let mut session = create_test_session();
        let client = session.client_id;
        let developer = session.developer_id;

        session.accept(developer).unwrap();
        let t0 = Utc::now();
        session.begin(client, t0).unwrap();
        session.complete(client, 0.4, t0 + Duration::hours(1)).unwrap();

        session.mark_paid(client, "tx-1".to_string()).unwrap();
        assert!(session.paid);

        let result = session.mark_paid(client, "tx-2".to_string());
        assert!(matches!(result, Err(DomainError::InvalidStateTransition(_))));
    }

    #[test]
    fn test_mark_paid_requires_completed() {
        let mut session = create_test_session();
        let client = session.client_id;

        let result = session.mark_paid(client, "tx-1".to_string());
        assert!(matches!(result, Err(DomainError::InvalidStateTransition(_))));
    }
}
