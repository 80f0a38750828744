//! Partner models: hours extracted from a report and the payouts derived from them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hours worked by one partner, as read from an hours report or entered by hand.
///
/// # Example
///
/// ```
/// use tip_steward::models::PartnerHours;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let partner = PartnerHours::new("Avery Johnson", Decimal::from_str("32.5").unwrap());
/// assert_eq!(partner.name, "Avery Johnson");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerHours {
    /// The partner's name as it appears on the report.
    pub name: String,
    /// Total tippable hours for the period.
    pub hours: Decimal,
}

impl PartnerHours {
    /// Creates a new partner hours record.
    pub fn new(name: impl Into<String>, hours: Decimal) -> Self {
        Self {
            name: name.into(),
            hours,
        }
    }
}

/// A number of bills of a single denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillCount {
    /// Face value of the bill in whole currency units.
    pub denomination: u32,
    /// How many bills of this denomination.
    pub quantity: u64,
}

impl BillCount {
    /// The cash value represented by this entry.
    pub fn value(&self) -> Decimal {
        Decimal::from(self.denomination) * Decimal::from(self.quantity)
    }
}

/// The cash payout for one partner.
///
/// `rounded` is always a whole amount, and the bills in `bill_breakdown`
/// add up to exactly that amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPayout {
    /// The partner's name.
    pub name: String,
    /// Hours the payout was calculated from.
    pub hours: Decimal,
    /// The payout rounded to whole currency units.
    pub rounded: Decimal,
    /// Bills to hand over, largest denomination first.
    pub bill_breakdown: Vec<BillCount>,
}

impl PartnerPayout {
    /// Total value of the bills in the breakdown.
    pub fn bills_value(&self) -> Decimal {
        self.bill_breakdown.iter().map(BillCount::value).sum()
    }
}
