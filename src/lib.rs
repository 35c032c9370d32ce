//! DevPay - call-session lifecycle and billing engine
//!
//! Connects clients and developers for on-demand, billed video
//! consultations: a request moves from `pending` through acceptance and a
//! live session to settlement, where elapsed time and the developer's hourly
//! rate produce the payable amount.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
