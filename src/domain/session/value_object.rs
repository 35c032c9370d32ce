//! Session value objects

use serde::{Deserialize, Serialize};

/// Call session status
///
/// Lifecycle: `pending -> {accepted, rejected, cancelled}`,
/// `accepted -> completed`. Rejected, completed and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Request created by the client, waiting for the developer
    Pending,
    /// Developer agreed to take the call
    Accepted,
    /// Developer declined the request
    Rejected,
    /// Call took place and the fee was computed
    Completed,
    /// Client withdrew the request before it was handled
    Cancelled,
}

impl SessionStatus {
    /// Check if a state transition is valid
    pub fn can_transition_to(&self, new_status: SessionStatus) -> bool {
        use SessionStatus::*;

        match (self, new_status) {
            // From Pending
            (Pending, Accepted) => true,
            (Pending, Rejected) => true,
            (Pending, Cancelled) => true,

            // From Accepted
            (Accepted, Completed) => true,

            // Terminal states never transition
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Rejected | SessionStatus::Completed | SessionStatus::Cancelled
        )
    }

    /// Position along the lifecycle, used by the merge policy: a session view
    /// never moves to a status with a lower rank than its current one.
    pub fn rank(&self) -> u8 {
        match self {
            SessionStatus::Pending => 0,
            SessionStatus::Accepted => 1,
            SessionStatus::Rejected | SessionStatus::Completed | SessionStatus::Cancelled => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Accepted => "accepted",
            SessionStatus::Rejected => "rejected",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SessionStatus::Pending),
            "accepted" => Some(SessionStatus::Accepted),
            "rejected" => Some(SessionStatus::Rejected),
            "completed" => Some(SessionStatus::Completed),
            "cancelled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }
}

/// Where a participant is sent after leaving the live room
///
/// The client goes to settlement (only the client pays); the developer goes
/// back to their workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostCallRoute {
    Settlement,
    Workspace,
}
