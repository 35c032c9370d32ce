//! Duration-based fee settlement
//!
//! Converts the elapsed time of a completed call and the developer's hourly
//! rate into a payable amount.

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::WalletAddress;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds per billable hour
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Fee amounts are quoted at three decimal places of the billing unit
const FEE_SCALE: f64 = 1_000.0;

/// Outcome of a settlement computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    /// Elapsed time in hours
    pub duration_hours: f64,
    /// `duration_hours * rate`, rounded to the fee precision
    pub amount: f64,
}

/// Round an amount to the fee precision
pub fn round_fee(amount: f64) -> f64 {
    (amount * FEE_SCALE).round() / FEE_SCALE
}

/// Compute the fee for a completed call.
///
/// Pure and deterministic: recomputing with the same inputs yields the same
/// fee, so settlements can be re-derived for reconciliation.
pub fn settle(
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    rate: f64,
) -> Result<Fee> {
    if ended_at <= started_at {
        return Err(DomainError::InvalidInterval(format!(
            "ended_at {} is not after started_at {}",
            ended_at, started_at
        )));
    }

    if rate < 0.0 {
        return Err(DomainError::InvalidRate(format!(
            "hourly rate {} is negative",
            rate
        )));
    }

    let elapsed_ms = (ended_at - started_at).num_milliseconds() as f64;
    let duration_hours = elapsed_ms / MS_PER_HOUR;
    let amount = round_fee(duration_hours * rate);

    Ok(Fee {
        duration_hours,
        amount,
    })
}

/// Receipt returned by a successful fund transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub tx_reference: String,
}

/// Port for executing fund transfers
///
/// Defined here as a trait and implemented in the infrastructure layer;
/// failures surface as `CollaboratorFailure`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Transfer `amount` of the billing unit to `destination`
    async fn send(&self, destination: &WalletAddress, amount: f64) -> Result<PaymentReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_settle_hour_and_a_half() {
        let started = ts(0);
        let ended = ts(90 * 60 * 1000);

        let fee = settle(started, ended, 0.4).unwrap();
        assert_eq!(fee.duration_hours, 1.5);
        assert_eq!(fee.amount, 0.6);
    }

    #[test]
    fn test_settle_is_deterministic() {
        let started = ts(1_000);
        let ended = ts(7_543_211);

        let first = settle(started, ended, 0.137).unwrap();
        let second = settle(started, ended, 0.137).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_settle_rounds_to_fee_precision() {
        // 40 minutes at 0.1/h = 0.0666..., rounds to 0.067
        let fee = settle(ts(0), ts(40 * 60 * 1000), 0.1).unwrap();
        assert_eq!(fee.amount, 0.067);
    }

    #[test]
    fn test_settle_zero_rate() {
        let fee = settle(ts(0), ts(3_600_000), 0.0).unwrap();
        assert_eq!(fee.duration_hours, 1.0);
        assert_eq!(fee.amount, 0.0);
    }

    #[test]
    fn test_settle_rejects_empty_interval() {
        let at = ts(5_000);
        let result = settle(at, at, 0.4);
        assert!(matches!(result, Err(DomainError::InvalidInterval(_))));

        let result = settle(ts(10_000), ts(5_000), 0.4);
        assert!(matches!(result, Err(DomainError::InvalidInterval(_))));
    }

    #[test]
    fn test_settle_rejects_negative_rate() {
        let result = settle(ts(0), ts(1_000), -0.1);
        assert!(matches!(result, Err(DomainError::InvalidRate(_))));
    }

    #[test]
    fn test_round_fee() {
        assert_eq!(round_fee(0.0666666), 0.067);
        assert_eq!(round_fee(1.2344), 1.234);
        assert_eq!(round_fee(0.6000000000000001), 0.6);
    }
}
