//! The result of one tip distribution calculation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BillCount, PartnerPayout};

/// The computed result of one calculation request.
///
/// A `DistributionData` is never edited in place; recalculating produces a
/// new value that replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionData {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub calculated_at: DateTime<Utc>,
    /// One payout per partner, in request order.
    pub partner_payouts: Vec<PartnerPayout>,
    /// Tip amount per hour, truncated to cents.
    pub hourly_rate: Decimal,
    /// The tip pool being distributed.
    pub total_amount: Decimal,
    /// Sum of all partner hours.
    pub total_hours: Decimal,
    /// Sum of all rounded payouts.
    pub total_rounded: Decimal,
    /// Bills needed across every partner, largest denomination first.
    pub bill_totals: Vec<BillCount>,
}
