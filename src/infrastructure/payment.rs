//! Payment gateway adapter

use crate::domain::billing::{PaymentGateway, PaymentReceipt};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::WalletAddress;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::sync::Mutex;
use tracing::info;

/// A recorded transfer
#[derive(Debug, Clone)]
pub struct Transfer {
    pub destination: WalletAddress,
    pub amount: f64,
    pub tx_reference: String,
    pub processed_at: DateTime<Utc>,
}

/// In-process gateway that records transfers in a ledger.
///
/// Stands in for the on-chain transfer in tests and the demo binary; a
/// configured failure lets tests exercise the collaborator-failure path.
pub struct LedgerGateway {
    transfers: Mutex<Vec<Transfer>>,
    fail_with: Mutex<Option<String>>,
}

impl LedgerGateway {
    pub fn new() -> Self {
        Self {
            transfers: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        }
    }

    /// Make every subsequent transfer fail with the given message
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn total_sent_to(&self, destination: &WalletAddress) -> f64 {
        self.transfers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.destination == destination)
            .map(|t| t.amount)
            .sum()
    }
}

impl Default for LedgerGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for LedgerGateway {
    async fn send(&self, destination: &WalletAddress, amount: f64) -> Result<PaymentReceipt> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(DomainError::ValidationError(format!(
                "invalid payment amount {}",
                amount
            )));
        }

        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(DomainError::CollaboratorFailure(message));
        }

        let mut tx_hash = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut tx_hash);
        let tx_reference = format!("0x{}", hex::encode(tx_hash));

        self.transfers.lock().unwrap().push(Transfer {
            destination: destination.clone(),
            amount,
            tx_reference: tx_reference.clone(),
            processed_at: Utc::now(),
        });

        info!(destination = %destination, amount, tx = %tx_reference, "transfer recorded");
        Ok(PaymentReceipt { tx_reference })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x52908400098527886e0f7030069857d2e4169ee7").unwrap()
    }

    #[tokio::test]
    async fn test_send_records_transfer() {
        let gateway = LedgerGateway::new();
        let receipt = gateway.send(&wallet(), 0.6).await.unwrap();

        assert!(receipt.tx_reference.starts_with("0x"));
        assert_eq!(gateway.transfers().len(), 1);
        assert_eq!(gateway.total_sent_to(&wallet()), 0.6);
    }

    #[tokio::test]
    async fn test_send_rejects_non_positive_amount() {
        let gateway = LedgerGateway::new();
        assert!(matches!(
            gateway.send(&wallet(), 0.0).await,
            Err(DomainError::ValidationError(_))
        ));
        assert!(matches!(
            gateway.send(&wallet(), -1.0).await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let gateway = LedgerGateway::new();
        gateway.fail_with("chain congested");

        let result = gateway.send(&wallet(), 0.5).await;
        assert!(matches!(result, Err(DomainError::CollaboratorFailure(_))));
        assert!(gateway.transfers().is_empty());
    }
}
