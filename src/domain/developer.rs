//! Developer profile domain model

use crate::domain::availability::AvailabilityStatus;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{UserId, WalletAddress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A developer offering paid consultations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Developer {
    pub id: UserId,
    pub title: Option<String>,
    pub skills: Vec<String>,
    /// Billing units per hour
    pub hourly_rate: f64,
    pub wallet_address: Option<WalletAddress>,
    pub status: AvailabilityStatus,
    pub rating: Option<f64>,
    pub total_calls: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Developer {
    pub fn new(id: UserId, hourly_rate: f64) -> Result<Self> {
        if hourly_rate < 0.0 {
            return Err(DomainError::InvalidRate(format!(
                "hourly rate {} is negative",
                hourly_rate
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id,
            title: None,
            skills: Vec::new(),
            hourly_rate,
            wallet_address: None,
            status: AvailabilityStatus::Offline,
            rating: None,
            total_calls: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_wallet(mut self, wallet_address: WalletAddress) -> Self {
        self.wallet_address = Some(wallet_address);
        self
    }

    pub fn set_rate(&mut self, hourly_rate: f64) -> Result<()> {
        if hourly_rate < 0.0 {
            return Err(DomainError::InvalidRate(format!(
                "hourly rate {} is negative",
                hourly_rate
            )));
        }
        self.hourly_rate = hourly_rate;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_status(&mut self, status: AvailabilityStatus) {
        if self.status != status {
            self.status = status;
            self.updated_at = Utc::now();
        }
    }

    /// Bump the completed-call counter
    pub fn record_completed_call(&mut self) {
        self.total_calls += 1;
        self.updated_at = Utc::now();
    }
}

/// Repository interface for developer profiles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeveloperRepository: Send + Sync {
    /// Find a developer by their ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Developer>>;

    /// Insert or update a profile
    async fn save(&self, developer: &Developer) -> Result<()>;

    /// Update only the availability status
    async fn set_status(&self, id: &UserId, status: AvailabilityStatus) -> Result<()>;

    /// Bump the completed-call counter
    async fn record_completed_call(&self, id: &UserId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_developer() {
        let developer = Developer::new(UserId::new(), 0.4)
            .unwrap()
            .with_title("Senior Rust Engineer".to_string())
            .with_skills(vec!["rust".to_string(), "tokio".to_string()]);

        assert_eq!(developer.hourly_rate, 0.4);
        assert_eq!(developer.status, AvailabilityStatus::Offline);
        assert_eq!(developer.total_calls, 0);
        assert_eq!(developer.skills.len(), 2);
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(matches!(
            Developer::new(UserId::new(), -1.0),
            Err(DomainError::InvalidRate(_))
        ));

        let mut developer = Developer::new(UserId::new(), 0.1).unwrap();
        assert!(matches!(
            developer.set_rate(-0.5),
            Err(DomainError::InvalidRate(_))
        ));
        assert_eq!(developer.hourly_rate, 0.1);
    }

    #[test]
    fn test_record_completed_call() {
        let mut developer = Developer::new(UserId::new(), 0.4).unwrap();
        developer.record_completed_call();
        developer.record_completed_call();
        assert_eq!(developer.total_calls, 2);
    }
}
