//! Infrastructure layer - Adapters for external collaborators

pub mod payment;
pub mod persistence;
pub mod relay;
pub mod transport;
