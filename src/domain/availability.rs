//! Developer availability tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::value_objects::UserId;

/// Whether a developer can take calls right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    /// Open for new call requests
    Available,
    /// Currently in a session
    Busy,
    /// Not taking calls
    Offline,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Busy => "busy",
            AvailabilityStatus::Offline => "offline",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(AvailabilityStatus::Available),
            "busy" => Some(AvailabilityStatus::Busy),
            "offline" => Some(AvailabilityStatus::Offline),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AvailabilityStatus::Available)
    }
}

/// A developer's availability record.
///
/// Mutated only by the developer themselves; session creation reads it as an
/// advisory signal, not a hard gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeveloperAvailability {
    pub developer_id: UserId,
    pub status: AvailabilityStatus,
    pub last_changed: DateTime<Utc>,
}

impl DeveloperAvailability {
    pub fn new(developer_id: UserId) -> Self {
        Self {
            developer_id,
            status: AvailabilityStatus::Offline,
            last_changed: Utc::now(),
        }
    }

    pub fn update_status(&mut self, status: AvailabilityStatus) {
        if self.status != status {
            self.status = status;
            self.last_changed = Utc::now();
        }
    }

    /// Check if the record has not changed for too long
    pub fn is_stale(&self, threshold_seconds: i64) -> bool {
        (Utc::now() - self.last_changed).num_seconds() > threshold_seconds
    }
}
