//! Persistence implementations

pub mod memory;

#[cfg(feature = "postgres")]
pub mod database;
#[cfg(feature = "postgres")]
pub mod session_repository;
#[cfg(feature = "postgres")]
pub mod developer_repository;

pub use memory::{InMemoryDeveloperRepository, InMemorySessionRepository};

#[cfg(feature = "postgres")]
pub use database::{connect, run_migrations, PoolSettings};
#[cfg(feature = "postgres")]
pub use developer_repository::PgDeveloperRepository;
#[cfg(feature = "postgres")]
pub use session_repository::PgSessionRepository;
