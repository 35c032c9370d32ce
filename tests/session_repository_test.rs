//! Session Repository Integration Tests
#![cfg(feature = "postgres")]

use chrono::{Duration, Utc};
use devpay::domain::availability::AvailabilityStatus;
use devpay::domain::developer::{Developer, DeveloperRepository};
use devpay::domain::session::repository::SessionRepository;
use devpay::domain::session::{CallSession, SessionPatch, SessionStatus};
use devpay::domain::shared::value_objects::{UserId, WalletAddress};
use devpay::infrastructure::persistence::{
    connect, run_migrations, PgDeveloperRepository, PgSessionRepository, PoolSettings,
};
use sqlx::PgPool;

async fn setup_database() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost/devpay".to_string());
    let pool = connect(&url, &PoolSettings::default())
        .await
        .expect("Failed to create pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

async fn insert_developer(pool: &PgPool, rate: f64) -> Developer {
    let repo = PgDeveloperRepository::new(pool.clone());
    let mut developer = Developer::new(UserId::new(), rate)
        .unwrap()
        .with_title("Backend Engineer".to_string())
        .with_wallet(
            WalletAddress::parse("0x52908400098527886e0f7030069857d2e4169ee7").unwrap(),
        );
    developer.set_status(AvailabilityStatus::Available);
    repo.save(&developer).await.expect("Failed to save developer");
    developer
}

#[tokio::test]
#[ignore] // Requires database
async fn test_session_create_and_get() {
    let pool = setup_database().await;
    let repo = PgSessionRepository::new(pool.clone());
    let developer = insert_developer(&pool, 0.4).await;

    let session =
        CallSession::new(UserId::new(), developer.id, "test-task".to_string()).unwrap();
    repo.create(&session).await.expect("Failed to create session");

    let retrieved = repo
        .find_by_id(&session.id)
        .await
        .expect("Failed to get session")
        .expect("Session not found");

    assert_eq!(retrieved.id, session.id);
    assert_eq!(retrieved.client_id, session.client_id);
    assert_eq!(retrieved.developer_id, developer.id);
    assert_eq!(retrieved.status, SessionStatus::Pending);
    assert_eq!(retrieved.task_description, "test-task");
    assert!(!retrieved.paid);
}

#[tokio::test]
#[ignore] // Requires database
async fn test_session_patch_update() {
    let pool = setup_database().await;
    let repo = PgSessionRepository::new(pool.clone());
    let developer = insert_developer(&pool, 0.4).await;

    let session =
        CallSession::new(UserId::new(), developer.id, "patch-me".to_string()).unwrap();
    repo.create(&session).await.expect("Failed to create session");

    let t0 = Utc::now();
    let patch = SessionPatch {
        status: Some(SessionStatus::Accepted),
        updated_at: Some(t0),
        ..SessionPatch::default()
    };
    let updated = repo.update(&session.id, &patch).await.expect("Failed to update");
    assert_eq!(updated.status, SessionStatus::Accepted);

    // Settlement fields land in one partial update
    let patch = SessionPatch {
        status: Some(SessionStatus::Completed),
        started_at: Some(t0),
        ended_at: Some(t0 + Duration::minutes(90)),
        duration_hours: Some(1.5),
        rate_at_booking: Some(0.4),
        amount: Some(0.6),
        updated_at: Some(t0 + Duration::minutes(90)),
        ..SessionPatch::default()
    };
    let updated = repo.update(&session.id, &patch).await.expect("Failed to update");
    assert_eq!(updated.status, SessionStatus::Completed);
    assert_eq!(updated.duration_hours, Some(1.5));
    assert_eq!(updated.amount, Some(0.6));
    assert_eq!(updated.task_description, "patch-me");
}

#[tokio::test]
#[ignore] // Requires database
async fn test_find_pending_for_developer() {
    let pool = setup_database().await;
    let repo = PgSessionRepository::new(pool.clone());
    let developer = insert_developer(&pool, 0.2).await;

    let first =
        CallSession::new(UserId::new(), developer.id, "first task".to_string()).unwrap();
    let second =
        CallSession::new(UserId::new(), developer.id, "second task".to_string()).unwrap();
    repo.create(&first).await.expect("Failed to create");
    repo.create(&second).await.expect("Failed to create");

    let patch = SessionPatch {
        status: Some(SessionStatus::Rejected),
        ..SessionPatch::default()
    };
    repo.update(&second.id, &patch).await.expect("Failed to update");

    let pending = repo
        .find_pending_for_developer(&developer.id)
        .await
        .expect("Failed to query");
    assert!(pending.iter().any(|s| s.id == first.id));
    assert!(pending.iter().all(|s| s.id != second.id));
}

#[tokio::test]
#[ignore] // Requires database
async fn test_developer_status_and_counter() {
    let pool = setup_database().await;
    let repo = PgDeveloperRepository::new(pool.clone());
    let developer = insert_developer(&pool, 0.3).await;

    repo.set_status(&developer.id, AvailabilityStatus::Busy)
        .await
        .expect("Failed to set status");
    repo.record_completed_call(&developer.id)
        .await
        .expect("Failed to bump counter");

    let stored = repo
        .find_by_id(&developer.id)
        .await
        .expect("Failed to get developer")
        .expect("Developer not found");
    assert_eq!(stored.status, AvailabilityStatus::Busy);
    assert_eq!(stored.total_calls, 1);
    assert!(stored.wallet_address.is_some());
}
