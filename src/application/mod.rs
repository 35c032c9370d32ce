//! Application layer - Flows coordinating the domain with collaborators

pub mod join;
pub mod settlement;

pub use join::{ActiveJoin, JoinCoordinator, JoinDecision};
pub use settlement::SettlementService;
