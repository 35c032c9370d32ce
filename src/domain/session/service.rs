//! Session lifecycle orchestration
//!
//! Wraps the aggregate's guarded transitions with persistence and change
//! notification: load, mutate, persist the implied patch, publish it.

use crate::domain::actor::{Actor, Role};
use crate::domain::availability::AvailabilityStatus;
use crate::domain::developer::DeveloperRepository;
use crate::domain::session::aggregate::CallSession;
use crate::domain::session::event::SessionEvent;
use crate::domain::session::notifier::SessionNotifier;
use crate::domain::session::repository::SessionRepository;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{SessionId, UserId};
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use std::sync::Arc;
use tracing::{info, warn};

pub struct SessionLifecycleService {
    sessions: Arc<dyn SessionRepository>,
    developers: Arc<dyn DeveloperRepository>,
    notifier: Arc<dyn SessionNotifier>,
}

impl SessionLifecycleService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        developers: Arc<dyn DeveloperRepository>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> Self {
        Self {
            sessions,
            developers,
            notifier,
        }
    }

    /// Client files a new consultation request.
    ///
    /// The developer's availability is consulted as an advisory signal only:
    /// a request against a busy or offline developer is logged and still
    /// created, matching how the marketplace behaves when availability
    /// flips mid-booking.
    pub async fn create(
        &self,
        actor: Actor,
        developer_id: UserId,
        task_description: String,
    ) -> Result<CallSession> {
        if actor.role != Role::Client {
            return Err(DomainError::Unauthorized(
                "only clients create call requests".to_string(),
            ));
        }

        let developer = self
            .developers
            .find_by_id(&developer_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("developer {}", developer_id)))?;

        if !developer.status.is_available() {
            warn!(
                developer = %developer_id,
                status = developer.status.as_str(),
                "creating call request against a developer who is not available"
            );
        }

        let mut session = CallSession::new(actor.id, developer_id, task_description)?;
        self.sessions.create(&session).await?;
        counter!("devpay_sessions_created_total").increment(1);
        info!(session = %session.id, client = %actor.id, developer = %developer_id, "call request created");

        for event in session.take_events() {
            if let SessionEvent::Requested(_) = event {
                self.notifier.announce_request(&session);
            }
        }

        Ok(session)
    }

    /// Developer accepts a pending request
    pub async fn accept(&self, actor: Actor, session_id: SessionId) -> Result<CallSession> {
        let mut session = self.load(&session_id).await?;
        session.accept(actor.id)?;
        self.persist_changes(&mut session).await?;
        info!(session = %session_id, "request accepted");
        Ok(session)
    }

    /// Developer declines a pending request
    pub async fn reject(&self, actor: Actor, session_id: SessionId) -> Result<CallSession> {
        let mut session = self.load(&session_id).await?;
        session.reject(actor.id)?;
        self.persist_changes(&mut session).await?;
        info!(session = %session_id, "request rejected");
        Ok(session)
    }

    /// Client withdraws a pending request
    pub async fn cancel(&self, actor: Actor, session_id: SessionId) -> Result<CallSession> {
        let mut session = self.load(&session_id).await?;
        session.cancel(actor.id)?;
        self.persist_changes(&mut session).await?;
        info!(session = %session_id, "request cancelled");
        Ok(session)
    }

    /// A participant entered the live room.
    ///
    /// Returns whether this call actually started the session; `false` means
    /// the other participant got there first, which is not an error.
    pub async fn begin(
        &self,
        actor: Actor,
        session_id: SessionId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut session = self.load(&session_id).await?;
        let started = session.begin(actor.id, at)?;

        if started {
            self.persist_changes(&mut session).await?;
            gauge!("devpay_sessions_active").increment(1.0);
            info!(session = %session_id, participant = %actor.id, "session started");
        }

        Ok(started)
    }

    /// A participant left the live room: settle the fee.
    ///
    /// The developer's hourly rate is read here, at completion time.
    pub async fn complete(
        &self,
        actor: Actor,
        session_id: SessionId,
        at: DateTime<Utc>,
    ) -> Result<CallSession> {
        let mut session = self.load(&session_id).await?;

        let developer = self
            .developers
            .find_by_id(&session.developer_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("developer {}", session.developer_id)))?;

        let fee = session.complete(actor.id, developer.hourly_rate, at)?;
        self.persist_changes(&mut session).await?;

        counter!("devpay_sessions_completed_total").increment(1);
        gauge!("devpay_sessions_active").decrement(1.0);
        info!(
            session = %session_id,
            duration_hours = fee.duration_hours,
            amount = fee.amount,
            "session completed"
        );

        if let Err(e) = self.developers.record_completed_call(&session.developer_id).await {
            warn!(developer = %session.developer_id, error = %e, "failed to bump completed-call counter");
        }

        Ok(session)
    }

    /// Record that the fee was paid out
    pub async fn record_settlement(
        &self,
        actor: Actor,
        session_id: SessionId,
        tx_reference: String,
    ) -> Result<CallSession> {
        let mut session = self.load(&session_id).await?;
        session.mark_paid(actor.id, tx_reference)?;
        self.persist_changes(&mut session).await?;
        info!(session = %session_id, "session settled");
        Ok(session)
    }

    /// Fetch a session, failing with `NotFound` for unknown ids
    pub async fn get(&self, session_id: SessionId) -> Result<CallSession> {
        self.load(&session_id).await
    }

    /// Pending requests addressed to the acting developer
    pub async fn pending_requests(&self, actor: Actor) -> Result<Vec<CallSession>> {
        if actor.role != Role::Developer {
            return Err(DomainError::Unauthorized(
                "only developers list incoming requests".to_string(),
            ));
        }
        self.sessions.find_pending_for_developer(&actor.id).await
    }

    /// Developer flips their availability
    pub async fn set_availability(&self, actor: Actor, status: AvailabilityStatus) -> Result<()> {
        if actor.role != Role::Developer {
            return Err(DomainError::Unauthorized(
                "only developers set their availability".to_string(),
            ));
        }
        self.developers.set_status(&actor.id, status).await?;
        info!(developer = %actor.id, status = status.as_str(), "availability updated");
        Ok(())
    }

    async fn load(&self, session_id: &SessionId) -> Result<CallSession> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("session {}", session_id)))
    }

    /// Persist the patches implied by the aggregate's pending events and
    /// publish them. Publication must not fail the mutation; the notifier
    /// swallows relay problems.
    async fn persist_changes(&self, session: &mut CallSession) -> Result<()> {
        for event in session.take_events() {
            let patch = event.to_patch();
            if patch.is_empty() {
                continue;
            }
            self.sessions.update(&session.id, &patch).await?;
            self.notifier.publish(session.id, &patch);
        }
        Ok(())
    }
}
