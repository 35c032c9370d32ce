//! Current actor identity
//!
//! Identity is an external collaborator: the engine only needs an opaque
//! actor id and its marketplace role.

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Marketplace role of an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Developer,
}

/// An authenticated user acting on a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

/// Port for resolving the current actor
#[async_trait]
pub trait ActorProvider: Send + Sync {
    /// Returns the acting user, or `Unauthenticated` when no one is signed in
    async fn current_actor(&self) -> Result<Actor>;
}

/// Provider pinned to a single actor, used by tests and the demo binary
pub struct FixedActor(pub Actor);

#[async_trait]
impl ActorProvider for FixedActor {
    async fn current_actor(&self) -> Result<Actor> {
        Ok(self.0)
    }
}

/// Provider representing a signed-out process
pub struct NoActor;

#[async_trait]
impl ActorProvider for NoActor {
    async fn current_actor(&self) -> Result<Actor> {
        Err(DomainError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_actor_resolves() {
        let actor = Actor::new(UserId::new(), Role::Client);
        let provider = FixedActor(actor);
        assert_eq!(provider.current_actor().await.unwrap(), actor);
    }

    #[tokio::test]
    async fn test_no_actor_is_unauthenticated() {
        let result = NoActor.current_actor().await;
        assert!(matches!(result, Err(DomainError::Unauthenticated)));
    }
}
