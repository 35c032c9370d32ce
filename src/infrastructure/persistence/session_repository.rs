//! PostgreSQL implementation of the session repository

use crate::domain::session::aggregate::CallSession;
use crate::domain::session::event::SessionPatch;
use crate::domain::session::repository::SessionRepository;
use crate::domain::session::value_object::SessionStatus;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{SessionId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    client_id: Uuid,
    developer_id: Uuid,
    task_description: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    duration_hours: Option<f64>,
    rate_at_booking: Option<f64>,
    amount: Option<f64>,
    paid: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRow> for CallSession {
    fn from(r: SessionRow) -> Self {
        CallSession {
            id: SessionId::from_uuid(r.id),
            client_id: UserId::from_uuid(r.client_id),
            developer_id: UserId::from_uuid(r.developer_id),
            task_description: r.task_description,
            status: SessionStatus::from_str(&r.status).unwrap_or(SessionStatus::Pending),
            started_at: r.started_at,
            ended_at: r.ended_at,
            duration_hours: r.duration_hours,
            rate_at_booking: r.rate_at_booking,
            amount: r.amount,
            paid: r.paid,
            created_at: r.created_at,
            updated_at: r.updated_at,
            events: Vec::new(),
        }
    }
}

pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &CallSession) -> Result<()> {
        debug!("Creating call session {}", session.id);

        sqlx::query(
            r#"
            INSERT INTO call_sessions (
                id, client_id, developer_id, task_description, status,
                started_at, ended_at, duration_hours, rate_at_booking, amount,
                paid, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(session.client_id.as_uuid())
        .bind(session.developer_id.as_uuid())
        .bind(&session.task_description)
        .bind(session.status.as_str())
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session.duration_hours)
        .bind(session.rate_at_booking)
        .bind(session.amount)
        .bind(session.paid)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::CollaboratorFailure(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<CallSession>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM call_sessions WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::CollaboratorFailure(e.to_string()))?;

        Ok(row.map(CallSession::from))
    }

    async fn update(&self, id: &SessionId, patch: &SessionPatch) -> Result<CallSession> {
        debug!("Updating call session {}", id);

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE call_sessions SET
                status = COALESCE($2, status),
                started_at = COALESCE($3, started_at),
                ended_at = COALESCE($4, ended_at),
                duration_hours = COALESCE($5, duration_hours),
                rate_at_booking = COALESCE($6, rate_at_booking),
                amount = COALESCE($7, amount),
                paid = COALESCE($8, paid),
                updated_at = COALESCE($9, updated_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.started_at)
        .bind(patch.ended_at)
        .bind(patch.duration_hours)
        .bind(patch.rate_at_booking)
        .bind(patch.amount)
        .bind(patch.paid)
        .bind(patch.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::CollaboratorFailure(e.to_string()))?;

        row.map(CallSession::from)
            .ok_or_else(|| DomainError::NotFound(format!("session {}", id)))
    }

    async fn find_pending_for_developer(&self, developer_id: &UserId) -> Result<Vec<CallSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT * FROM call_sessions
            WHERE developer_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(developer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::CollaboratorFailure(e.to_string()))?;

        Ok(rows.into_iter().map(CallSession::from).collect())
    }
}
