//! Join coordination
//!
//! Admits a participant into the live room at most once per session, gated on
//! the session being accepted, and drives the start/complete transitions
//! around the room's lifetime.

use crate::domain::actor::Actor;
use crate::domain::session::service::SessionLifecycleService;
use crate::domain::session::value_object::{PostCallRoute, SessionStatus};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{SessionId, UserId};
use crate::infrastructure::transport::{LeaveSignal, RoomTransport};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

type JoinedMap = Arc<Mutex<HashMap<SessionId, HashSet<UserId>>>>;

/// Outcome of a join attempt
pub enum JoinDecision {
    /// Participant entered the room; await `ActiveJoin::wait_leave`
    Admitted(ActiveJoin),
    /// This participant already holds a seat for the session
    AlreadyJoined,
    /// The session is not in a joinable state; terminal sessions stay put
    NotEligible { status: SessionStatus },
}

pub struct JoinCoordinator {
    service: Arc<SessionLifecycleService>,
    transport: Arc<dyn RoomTransport>,
    /// Explicit per-session join state: who currently holds a seat
    joined: JoinedMap,
}

impl JoinCoordinator {
    pub fn new(service: Arc<SessionLifecycleService>, transport: Arc<dyn RoomTransport>) -> Self {
        Self {
            service,
            transport,
            joined: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Try to enter the live room for a session.
    ///
    /// Eligible only when the session is `accepted` and the actor is one of
    /// its two participants; strangers get an authorization error. The
    /// session is started (idempotently) before the room is entered, so a
    /// duplicate start from the other participant is a no-op.
    pub async fn join_if_eligible(
        &self,
        session_id: SessionId,
        actor: Actor,
        display_name: &str,
    ) -> Result<JoinDecision> {
        let session = self.service.get(session_id).await?;

        if !session.is_participant(actor.id) {
            return Err(DomainError::Unauthorized(format!(
                "{} is not a participant of session {}",
                actor.id, session_id
            )));
        }

        if session.status != SessionStatus::Accepted {
            debug!(session = %session_id, status = session.status.as_str(), "join refused");
            return Ok(JoinDecision::NotEligible {
                status: session.status,
            });
        }

        {
            let mut joined = self.joined.lock().unwrap();
            let seats = joined.entry(session_id).or_default();
            if !seats.insert(actor.id) {
                return Ok(JoinDecision::AlreadyJoined);
            }
        }

        // Start the clock before entering the room; the first participant in
        // wins, the other's attempt is a no-op.
        if let Err(e) = self.service.begin(actor, session_id, Utc::now()).await {
            self.release_seat(session_id, actor.id);
            return Err(e);
        }

        let signal = match self
            .transport
            .join(session_id, actor.id, display_name)
            .await
        {
            Ok(signal) => signal,
            Err(e) => {
                self.release_seat(session_id, actor.id);
                return Err(e);
            }
        };

        let route = if actor.id == session.client_id {
            PostCallRoute::Settlement
        } else {
            PostCallRoute::Workspace
        };

        info!(session = %session_id, participant = %actor.id, "admitted to room");
        Ok(JoinDecision::Admitted(ActiveJoin {
            session_id,
            actor,
            route,
            signal,
            service: self.service.clone(),
            joined: self.joined.clone(),
        }))
    }

    /// Participants currently holding a seat for a session
    pub fn seated(&self, session_id: &SessionId) -> usize {
        let joined = self.joined.lock().unwrap();
        joined.get(session_id).map(|s| s.len()).unwrap_or(0)
    }

    fn release_seat(&self, session_id: SessionId, participant: UserId) {
        release_seat(&self.joined, session_id, participant);
    }
}

fn release_seat(joined: &JoinedMap, session_id: SessionId, participant: UserId) {
    let mut joined = joined.lock().unwrap();
    if let Some(seats) = joined.get_mut(&session_id) {
        seats.remove(&participant);
        if seats.is_empty() {
            joined.remove(&session_id);
        }
    }
}

/// A participant's seat in a live room
pub struct ActiveJoin {
    session_id: SessionId,
    actor: Actor,
    route: PostCallRoute,
    signal: LeaveSignal,
    service: Arc<SessionLifecycleService>,
    joined: JoinedMap,
}

impl ActiveJoin {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn route(&self) -> PostCallRoute {
        self.route
    }

    /// Wait for the transport-left event, settle the session and return
    /// where this participant goes next.
    ///
    /// Both participants drive `complete` when they leave; whoever is second
    /// finds the session already completed, which is benign.
    pub async fn wait_leave(self) -> Result<PostCallRoute> {
        self.signal.left().await;
        release_seat(&self.joined, self.session_id, self.actor.id);

        match self
            .service
            .complete(self.actor, self.session_id, Utc::now())
            .await
        {
            Ok(_) => {}
            Err(DomainError::InvalidStateTransition(_)) => {
                debug!(session = %self.session_id, "session already completed by the other side");
            }
            Err(e) => return Err(e),
        }

        Ok(self.route)
    }
}
