//! PostgreSQL implementation of the developer repository

use crate::domain::availability::AvailabilityStatus;
use crate::domain::developer::{Developer, DeveloperRepository};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{UserId, WalletAddress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

#[derive(FromRow)]
struct DeveloperRow {
    id: Uuid,
    title: Option<String>,
    skills: Vec<String>,
    hourly_rate: f64,
    wallet_address: Option<String>,
    status: String,
    rating: Option<f64>,
    total_calls: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DeveloperRow> for Developer {
    fn from(r: DeveloperRow) -> Self {
        Developer {
            id: UserId::from_uuid(r.id),
            title: r.title,
            skills: r.skills,
            hourly_rate: r.hourly_rate,
            wallet_address: r
                .wallet_address
                .as_deref()
                .and_then(|a| WalletAddress::parse(a).ok()),
            status: AvailabilityStatus::from_str(&r.status)
                .unwrap_or(AvailabilityStatus::Offline),
            rating: r.rating,
            total_calls: r.total_calls.max(0) as u32,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub struct PgDeveloperRepository {
    pool: PgPool,
}

impl PgDeveloperRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeveloperRepository for PgDeveloperRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Developer>> {
        let row = sqlx::query_as::<_, DeveloperRow>(
            "SELECT * FROM developers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::CollaboratorFailure(e.to_string()))?;

        Ok(row.map(Developer::from))
    }

    async fn save(&self, developer: &Developer) -> Result<()> {
        debug!("Saving developer profile {}", developer.id);

        sqlx::query(
            r#"
            INSERT INTO developers (
                id, title, skills, hourly_rate, wallet_address,
                status, rating, total_calls, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                skills = EXCLUDED.skills,
                hourly_rate = EXCLUDED.hourly_rate,
                wallet_address = EXCLUDED.wallet_address,
                status = EXCLUDED.status,
                rating = EXCLUDED.rating,
                total_calls = EXCLUDED.total_calls,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(developer.id.as_uuid())
        .bind(&developer.title)
        .bind(&developer.skills)
        .bind(developer.hourly_rate)
        .bind(developer.wallet_address.as_ref().map(|w| w.as_str()))
        .bind(developer.status.as_str())
        .bind(developer.rating)
        .bind(developer.total_calls as i32)
        .bind(developer.created_at)
        .bind(developer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::CollaboratorFailure(e.to_string()))?;

        Ok(())
    }

    async fn set_status(&self, id: &UserId, status: AvailabilityStatus) -> Result<()> {
        let result = sqlx::query(
            "UPDATE developers SET status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::CollaboratorFailure(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("developer {}", id)));
        }
        Ok(())
    }

    async fn record_completed_call(&self, id: &UserId) -> Result<()> {
        let result = sqlx::query(
            "UPDATE developers SET total_calls = total_calls + 1, updated_at = now() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::CollaboratorFailure(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("developer {}", id)));
        }
        Ok(())
    }
}
