//! Calculation logic for Tip Steward.
//!
//! This module contains the tip pool arithmetic: the hourly rate derived from
//! the pool and total hours, per-partner payouts rounded to whole bills, the
//! greedy cash-denomination breakdown, and the combined distribution.

use crate::error::StewardError;

mod bill_breakdown;
mod distribution;
mod hourly_rate;
mod payout;

pub use bill_breakdown::{DEFAULT_DENOMINATIONS, bill_breakdown, total_bills};
pub use distribution::{DistributionInput, calculate_distribution};
pub use hourly_rate::calculate_hourly_rate;
pub use payout::{calculate_payout, round_payout};

/// The error for an amount that cannot be represented without overflow.
pub(crate) fn too_large(field: &str) -> StewardError {
    StewardError::InvalidDistribution {
        field: field.to_string(),
        message: "value is too large to distribute".to_string(),
    }
}
