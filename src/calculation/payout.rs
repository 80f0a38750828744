//! Per-partner payout calculation.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::StewardResult;
use crate::models::{PartnerHours, PartnerPayout};

use super::{bill_breakdown, too_large};

/// Rounds `hours × hourly_rate` to a whole currency amount.
///
/// Midpoints round away from zero, so a payout of $12.50 becomes $13.
///
/// # Errors
///
/// Returns `InvalidDistribution` when the product overflows a `Decimal`.
///
/// # Examples
///
/// ```
/// use tip_steward::calculation::round_payout;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let rounded = round_payout(
///     Decimal::from_str("32.5").unwrap(),
///     Decimal::from_str("4.16").unwrap(),
/// )
/// .unwrap();
/// // 32.5 × 4.16 = 135.20
/// assert_eq!(rounded, Decimal::from(135));
/// ```
pub fn round_payout(hours: Decimal, hourly_rate: Decimal) -> StewardResult<Decimal> {
    hours
        .checked_mul(hourly_rate)
        .map(|amount| amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| too_large("partnerHours"))
}

/// Builds the payout for one partner, including the bills to hand over.
pub fn calculate_payout(
    partner: &PartnerHours,
    hourly_rate: Decimal,
    denominations: &[u32],
) -> StewardResult<PartnerPayout> {
    let rounded = round_payout(partner.hours, hourly_rate)?;

    Ok(PartnerPayout {
        name: partner.name.trim().to_string(),
        hours: partner.hours,
        rounded,
        bill_breakdown: bill_breakdown(rounded, denominations)?,
    })
}
