//! Session domain events and partial-record patches

use crate::domain::session::value_object::SessionStatus;
use crate::domain::shared::events::{DomainEvent, EventMetadata};
use crate::domain::shared::value_objects::{SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base struct for all session events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEventBase {
    pub metadata: EventMetadata,
    pub session_id: SessionId,
}

impl SessionEventBase {
    fn new(event_type: &str, session_id: SessionId) -> Self {
        Self {
            metadata: EventMetadata::new(event_type.to_string()),
            session_id,
        }
    }
}

/// Client created a consultation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequested {
    pub base: SessionEventBase,
    pub client_id: UserId,
    pub developer_id: UserId,
}

impl DomainEvent for SessionRequested {
    fn event_type(&self) -> &'static str {
        "session.requested"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// Developer accepted the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAccepted {
    pub base: SessionEventBase,
}

impl DomainEvent for SessionAccepted {
    fn event_type(&self) -> &'static str {
        "session.accepted"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// Developer rejected the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRejected {
    pub base: SessionEventBase,
}

impl DomainEvent for SessionRejected {
    fn event_type(&self) -> &'static str {
        "session.rejected"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// Client withdrew the request while it was still pending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCancelled {
    pub base: SessionEventBase,
}

impl DomainEvent for SessionCancelled {
    fn event_type(&self) -> &'static str {
        "session.cancelled"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// First participant entered the live room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStarted {
    pub base: SessionEventBase,
    pub started_at: DateTime<Utc>,
    pub started_by: UserId,
}

impl DomainEvent for SessionStarted {
    fn event_type(&self) -> &'static str {
        "session.started"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// Call ended and the fee was computed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCompleted {
    pub base: SessionEventBase,
    pub ended_at: DateTime<Utc>,
    pub duration_hours: f64,
    pub rate_at_booking: f64,
    pub amount: f64,
}

impl DomainEvent for SessionCompleted {
    fn event_type(&self) -> &'static str {
        "session.completed"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// Fee was paid out to the developer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettled {
    pub base: SessionEventBase,
    pub tx_reference: String,
}

impl DomainEvent for SessionSettled {
    fn event_type(&self) -> &'static str {
        "session.settled"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// Union of all session events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    Requested(SessionRequested),
    Accepted(SessionAccepted),
    Rejected(SessionRejected),
    Cancelled(SessionCancelled),
    Started(SessionStarted),
    Completed(SessionCompleted),
    Settled(SessionSettled),
}

impl SessionEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            SessionEvent::Requested(e) => &e.base.session_id,
            SessionEvent::Accepted(e) => &e.base.session_id,
            SessionEvent::Rejected(e) => &e.base.session_id,
            SessionEvent::Cancelled(e) => &e.base.session_id,
            SessionEvent::Started(e) => &e.base.session_id,
            SessionEvent::Completed(e) => &e.base.session_id,
            SessionEvent::Settled(e) => &e.base.session_id,
        }
    }

    /// The partial record this event implies for subscribed views
    pub fn to_patch(&self) -> SessionPatch {
        match self {
            SessionEvent::Requested(e) => SessionPatch {
                status: Some(SessionStatus::Pending),
                updated_at: Some(e.occurred_at()),
                ..SessionPatch::default()
            },
            SessionEvent::Accepted(e) => SessionPatch {
                status: Some(SessionStatus::Accepted),
                updated_at: Some(e.occurred_at()),
                ..SessionPatch::default()
            },
            SessionEvent::Rejected(e) => SessionPatch {
                status: Some(SessionStatus::Rejected),
                updated_at: Some(e.occurred_at()),
                ..SessionPatch::default()
            },
            SessionEvent::Cancelled(e) => SessionPatch {
                status: Some(SessionStatus::Cancelled),
                updated_at: Some(e.occurred_at()),
                ..SessionPatch::default()
            },
            SessionEvent::Started(e) => SessionPatch {
                started_at: Some(e.started_at),
                updated_at: Some(e.occurred_at()),
                ..SessionPatch::default()
            },
            SessionEvent::Completed(e) => SessionPatch {
                status: Some(SessionStatus::Completed),
                ended_at: Some(e.ended_at),
                duration_hours: Some(e.duration_hours),
                rate_at_booking: Some(e.rate_at_booking),
                amount: Some(e.amount),
                updated_at: Some(e.occurred_at()),
                ..SessionPatch::default()
            },
            SessionEvent::Settled(e) => SessionPatch {
                paid: Some(true),
                updated_at: Some(e.occurred_at()),
                ..SessionPatch::default()
            },
        }
    }
}

pub(crate) fn requested(session_id: SessionId, client_id: UserId, developer_id: UserId) -> SessionEvent {
    SessionEvent::Requested(SessionRequested {
        base: SessionEventBase::new("session.requested", session_id),
        client_id,
        developer_id,
    })
}

pub(crate) fn accepted(session_id: SessionId) -> SessionEvent {
    SessionEvent::Accepted(SessionAccepted {
        base: SessionEventBase::new("session.accepted", session_id),
    })
}

pub(crate) fn rejected(session_id: SessionId) -> SessionEvent {
    SessionEvent::Rejected(SessionRejected {
        base: SessionEventBase::new("session.rejected", session_id),
    })
}

pub(crate) fn cancelled(session_id: SessionId) -> SessionEvent {
    SessionEvent::Cancelled(SessionCancelled {
        base: SessionEventBase::new("session.cancelled", session_id),
    })
}

pub(crate) fn started(session_id: SessionId, started_at: DateTime<Utc>, started_by: UserId) -> SessionEvent {
    SessionEvent::Started(SessionStarted {
        base: SessionEventBase::new("session.started", session_id),
        started_at,
        started_by,
    })
}

pub(crate) fn completed(
    session_id: SessionId,
    ended_at: DateTime<Utc>,
    duration_hours: f64,
    rate_at_booking: f64,
    amount: f64,
) -> SessionEvent {
    SessionEvent::Completed(SessionCompleted {
        base: SessionEventBase::new("session.completed", session_id),
        ended_at,
        duration_hours,
        rate_at_booking,
        amount,
    })
}

pub(crate) fn settled(session_id: SessionId, tx_reference: String) -> SessionEvent {
    SessionEvent::Settled(SessionSettled {
        base: SessionEventBase::new("session.settled", session_id),
        tx_reference,
    })
}

/// Partial session record: only fields carried by a mutation.
///
/// Used both as the store's update payload and as the relay's wire payload;
/// a field that is `None` is left untouched by whoever applies the patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_hours: Option<f64>,
    pub rate_at_booking: Option<f64>,
    pub amount: Option<f64>,
    pub paid: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionPatch {
    /// Overwrite the record's fields with those present in the patch.
    ///
    /// This is the store-side merge: patches reaching the store were derived
    /// from guarded transitions, so fields apply as-is. Relay consumers go
    /// through `SessionView::apply` instead, which adds the status
    /// monotonicity rule for out-of-order delivery.
    pub fn apply_to(&self, session: &mut crate::domain::session::aggregate::CallSession) {
        if let Some(status) = self.status {
            session.status = status;
        }
        if let Some(started_at) = self.started_at {
            session.started_at = Some(started_at);
        }
        if let Some(ended_at) = self.ended_at {
            session.ended_at = Some(ended_at);
        }
        if let Some(duration_hours) = self.duration_hours {
            session.duration_hours = Some(duration_hours);
        }
        if let Some(rate) = self.rate_at_booking {
            session.rate_at_booking = Some(rate);
        }
        if let Some(amount) = self.amount {
            session.amount = Some(amount);
        }
        if let Some(paid) = self.paid {
            session.paid = paid;
        }
        if let Some(updated_at) = self.updated_at {
            session.updated_at = updated_at;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.started_at.is_none()
            && self.ended_at.is_none()
            && self.duration_hours.is_none()
            && self.rate_at_booking.is_none()
            && self.amount.is_none()
            && self.paid.is_none()
            && self.updated_at.is_none()
    }
}
