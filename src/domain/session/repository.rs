//! Session store interface

use crate::domain::session::aggregate::CallSession;
use crate::domain::session::event::SessionPatch;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{SessionId, UserId};
use async_trait::async_trait;

/// Repository interface for call sessions
///
/// This is defined in the domain layer as a trait (port),
/// and implemented in the infrastructure layer (adapter).
/// Sessions are never deleted; terminal statuses are archival.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a newly created session
    async fn create(&self, session: &CallSession) -> Result<()>;

    /// Find a session by its ID
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<CallSession>>;

    /// Apply a partial update and return the stored record
    async fn update(&self, id: &SessionId, patch: &SessionPatch) -> Result<CallSession>;

    /// Pending requests addressed to a developer
    async fn find_pending_for_developer(&self, developer_id: &UserId) -> Result<Vec<CallSession>>;
}
