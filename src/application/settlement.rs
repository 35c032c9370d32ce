//! Post-session settlement
//!
//! Pays the computed fee out to the developer's wallet. Only the client
//! settles, only completed sessions settle, and a session settles once.

use crate::domain::actor::Actor;
use crate::domain::billing::{PaymentGateway, PaymentReceipt};
use crate::domain::developer::DeveloperRepository;
use crate::domain::session::service::SessionLifecycleService;
use crate::domain::session::value_object::SessionStatus;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::SessionId;
use std::sync::Arc;
use tracing::info;

pub struct SettlementService {
    sessions: Arc<SessionLifecycleService>,
    developers: Arc<dyn DeveloperRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl SettlementService {
    pub fn new(
        sessions: Arc<SessionLifecycleService>,
        developers: Arc<dyn DeveloperRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            sessions,
            developers,
            gateway,
        }
    }

    /// Transfer the session's fee to the developer and mark it paid
    pub async fn pay(&self, actor: Actor, session_id: SessionId) -> Result<PaymentReceipt> {
        let session = self.sessions.get(session_id).await?;

        if actor.id != session.client_id {
            return Err(DomainError::Unauthorized(format!(
                "only the client settles session {}",
                session_id
            )));
        }

        if session.status != SessionStatus::Completed {
            return Err(DomainError::InvalidStateTransition(format!(
                "cannot settle session {} while {}",
                session_id,
                session.status.as_str()
            )));
        }

        if session.paid {
            return Err(DomainError::InvalidStateTransition(format!(
                "session {} is already settled",
                session_id
            )));
        }

        let amount = session.amount.ok_or_else(|| {
            DomainError::Internal(format!("completed session {} has no amount", session_id))
        })?;

        let developer = self
            .developers
            .find_by_id(&session.developer_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("developer {}", session.developer_id)))?;

        let wallet = developer.wallet_address.ok_or_else(|| {
            DomainError::ValidationError(format!(
                "developer {} has no payout wallet",
                developer.id
            ))
        })?;

        let receipt = self.gateway.send(&wallet, amount).await?;

        self.sessions
            .record_settlement(actor, session_id, receipt.tx_reference.clone())
            .await?;

        info!(session = %session_id, amount, tx = %receipt.tx_reference, "fee settled");
        Ok(receipt)
    }
}
