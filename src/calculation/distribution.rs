//! Tip distribution calculation.
//!
//! Combines the hourly rate, payout rounding and bill breakdown into a
//! complete [`DistributionData`] for a set of partners.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StewardError, StewardResult};
use crate::models::{DistributionData, PartnerHours, PartnerPayout};

use super::{calculate_hourly_rate, calculate_payout, too_large, total_bills};

/// How far a client-supplied figure may drift from the server's before it is logged.
const CLIENT_FIGURE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The inputs of one distribution calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionInput {
    /// Hours per partner.
    pub partners: Vec<PartnerHours>,
    /// The tip pool to distribute.
    pub total_amount: Decimal,
    /// Total hours as computed by the client, if it sent one.
    pub claimed_total_hours: Option<Decimal>,
    /// Hourly rate as computed by the client, if it sent one.
    pub claimed_hourly_rate: Option<Decimal>,
}

impl DistributionInput {
    /// Creates an input with no client-side figures.
    pub fn new(partners: Vec<PartnerHours>, total_amount: Decimal) -> Self {
        Self {
            partners,
            total_amount,
            claimed_total_hours: None,
            claimed_hourly_rate: None,
        }
    }

    fn validate(&self) -> StewardResult<()> {
        if self.partners.is_empty() {
            return Err(StewardError::InvalidDistribution {
                field: "partnerHours".to_string(),
                message: "at least one partner is required".to_string(),
            });
        }

        if self.total_amount < Decimal::ZERO {
            return Err(StewardError::InvalidDistribution {
                field: "totalAmount".to_string(),
                message: "must not be negative".to_string(),
            });
        }

        for (index, partner) in self.partners.iter().enumerate() {
            if partner.name.trim().is_empty() {
                return Err(StewardError::InvalidDistribution {
                    field: format!("partnerHours[{}].name", index),
                    message: "must not be empty".to_string(),
                });
            }
            if partner.hours < Decimal::ZERO {
                return Err(StewardError::InvalidDistribution {
                    field: format!("partnerHours[{}].hours", index),
                    message: format!("must not be negative (got {})", partner.hours),
                });
            }
        }

        Ok(())
    }
}

/// Calculates the payout for every partner in the pool.
///
/// The server's own totals are authoritative: client-supplied total hours or
/// hourly rate that disagree are logged and ignored.
///
/// # Errors
///
/// Returns `InvalidDistribution` when there are no partners, the pool is
/// negative, a partner has an empty name or negative hours, or the figures
/// are too large to calculate without overflow.
///
/// # Examples
///
/// ```
/// use tip_steward::calculation::{calculate_distribution, DistributionInput, DEFAULT_DENOMINATIONS};
/// use tip_steward::models::PartnerHours;
/// use rust_decimal::Decimal;
///
/// let input = DistributionInput::new(
///     vec![
///         PartnerHours::new("Avery", Decimal::from(30)),
///         PartnerHours::new("Blake", Decimal::from(10)),
///     ],
///     Decimal::from(200),
/// );
///
/// let result = calculate_distribution(&input, &DEFAULT_DENOMINATIONS).unwrap();
/// assert_eq!(result.hourly_rate, Decimal::from(5));
/// assert_eq!(result.partner_payouts[0].rounded, Decimal::from(150));
/// assert_eq!(result.partner_payouts[1].rounded, Decimal::from(50));
/// ```
pub fn calculate_distribution(
    input: &DistributionInput,
    denominations: &[u32],
) -> StewardResult<DistributionData> {
    input.validate()?;

    let total_hours = checked_sum(input.partners.iter().map(|p| p.hours))
        .ok_or_else(|| too_large("partnerHours"))?;
    let hourly_rate = calculate_hourly_rate(input.total_amount, total_hours)?;

    if let Some(claimed) = input.claimed_total_hours {
        if disagrees(claimed, total_hours) {
            warn!(
                claimed = %claimed,
                computed = %total_hours,
                "Client total hours disagree with partner hours; using computed value"
            );
        }
    }
    if let Some(claimed) = input.claimed_hourly_rate {
        if disagrees(claimed, hourly_rate) {
            warn!(
                claimed = %claimed,
                computed = %hourly_rate,
                "Client hourly rate disagrees with computed rate; using computed value"
            );
        }
    }

    let partner_payouts: Vec<PartnerPayout> = input
        .partners
        .iter()
        .map(|partner| calculate_payout(partner, hourly_rate, denominations))
        .collect::<StewardResult<_>>()?;

    let total_rounded = checked_sum(partner_payouts.iter().map(|p| p.rounded))
        .ok_or_else(|| too_large("totalRounded"))?;
    let bill_totals = total_bills(&partner_payouts)?;

    debug!(
        partners = partner_payouts.len(),
        total_hours = %total_hours,
        hourly_rate = %hourly_rate,
        total_rounded = %total_rounded,
        "Distribution calculated"
    );

    Ok(DistributionData {
        calculation_id: Uuid::new_v4(),
        calculated_at: Utc::now(),
        partner_payouts,
        hourly_rate,
        total_amount: input.total_amount,
        total_hours,
        total_rounded,
        bill_totals,
    })
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
}

fn disagrees(claimed: Decimal, computed: Decimal) -> bool {
    claimed
        .checked_sub(computed)
        .is_none_or(|diff| diff.abs() > CLIENT_FIGURE_TOLERANCE)
}
