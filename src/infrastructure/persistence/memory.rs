//! In-memory store adapters
//!
//! Back the repository ports with plain maps. Used by tests, the demo binary
//! and deployments without a database (feature `memory`).

use crate::domain::availability::AvailabilityStatus;
use crate::domain::developer::{Developer, DeveloperRepository};
use crate::domain::session::aggregate::CallSession;
use crate::domain::session::event::SessionPatch;
use crate::domain::session::repository::SessionRepository;
use crate::domain::session::value_object::SessionStatus;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{SessionId, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Map-backed session store
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<SessionId, CallSession>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &CallSession) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.id) {
            return Err(DomainError::Internal(format!(
                "session {} already exists",
                session.id
            )));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<CallSession>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.get(id).cloned())
    }

    async fn update(&self, id: &SessionId, patch: &SessionPatch) -> Result<CallSession> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("session {}", id)))?;

        patch.apply_to(session);
        Ok(session.clone())
    }

    async fn find_pending_for_developer(&self, developer_id: &UserId) -> Result<Vec<CallSession>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .values()
            .filter(|s| s.developer_id == *developer_id && s.status == SessionStatus::Pending)
            .cloned()
            .collect())
    }
}

/// Map-backed developer profile store
pub struct InMemoryDeveloperRepository {
    developers: Mutex<HashMap<UserId, Developer>>,
}

impl InMemoryDeveloperRepository {
    pub fn new() -> Self {
        Self {
            developers: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDeveloperRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeveloperRepository for InMemoryDeveloperRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Developer>> {
        let developers = self.developers.lock().unwrap();
        Ok(developers.get(id).cloned())
    }

    async fn save(&self, developer: &Developer) -> Result<()> {
        let mut developers = self.developers.lock().unwrap();
        developers.insert(developer.id, developer.clone());
        Ok(())
    }

    async fn set_status(&self, id: &UserId, status: AvailabilityStatus) -> Result<()> {
        let mut developers = self.developers.lock().unwrap();
        let developer = developers
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("developer {}", id)))?;
        developer.set_status(status);
        Ok(())
    }

    async fn record_completed_call(&self, id: &UserId) -> Result<()> {
        let mut developers = self.developers.lock().unwrap();
        let developer = developers
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("developer {}", id)))?;
        developer.record_completed_call();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_session() -> CallSession {
        CallSession::new(UserId::new(), UserId::new(), "help with sqlx".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemorySessionRepository::new();
        let session = test_session();

        repo.create(&session).await.unwrap();
        assert_eq!(repo.count(), 1);

        let found = repo.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found.status, SessionStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let repo = InMemorySessionRepository::new();
        let session = test_session();

        repo.create(&session).await.unwrap();
        assert!(repo.create(&session).await.is_err());
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let repo = InMemorySessionRepository::new();
        let session = test_session();
        repo.create(&session).await.unwrap();

        let patch = SessionPatch {
            status: Some(SessionStatus::Accepted),
            updated_at: Some(Utc::now()),
            ..SessionPatch::default()
        };
        let updated = repo.update(&session.id, &patch).await.unwrap();
        assert_eq!(updated.status, SessionStatus::Accepted);
        assert_eq!(updated.task_description, session.task_description);
    }

    #[tokio::test]
    async fn test_update_unknown_session() {
        let repo = InMemorySessionRepository::new();
        let result = repo.update(&SessionId::new(), &SessionPatch::default()).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_pending_for_developer() {
        let repo = InMemorySessionRepository::new();
        let developer_id = UserId::new();

        let first =
            CallSession::new(UserId::new(), developer_id, "task one".to_string()).unwrap();
        let second =
            CallSession::new(UserId::new(), developer_id, "task two".to_string()).unwrap();
        let unrelated = test_session();

        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();
        repo.create(&unrelated).await.unwrap();

        // One of them gets accepted and stops being pending
        let patch = SessionPatch {
            status: Some(SessionStatus::Accepted),
            ..SessionPatch::default()
        };
        repo.update(&second.id, &patch).await.unwrap();

        let pending = repo.find_pending_for_developer(&developer_id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, first.id);
    }

    #[tokio::test]
    async fn test_developer_repository_roundtrip() {
        let repo = InMemoryDeveloperRepository::new();
        let developer = Developer::new(UserId::new(), 0.4).unwrap();
        repo.save(&developer).await.unwrap();

        repo.set_status(&developer.id, AvailabilityStatus::Available)
            .await
            .unwrap();
        repo.record_completed_call(&developer.id).await.unwrap();

        let stored = repo.find_by_id(&developer.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AvailabilityStatus::Available);
        assert_eq!(stored.total_calls, 1);
    }

    #[tokio::test]
    async fn test_developer_repository_unknown_id() {
        let repo = InMemoryDeveloperRepository::new();
        let result = repo.set_status(&UserId::new(), AvailabilityStatus::Busy).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
