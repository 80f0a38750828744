//! Cash denomination breakdown.
//!
//! Payouts are handed over as cash, so every rounded payout is split into
//! bills using a greedy largest-first decomposition.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::StewardResult;
use crate::models::{BillCount, PartnerPayout};

use super::too_large;

/// The bills available in the till, largest first.
pub const DEFAULT_DENOMINATIONS: [u32; 4] = [20, 10, 5, 1];

/// Splits a whole amount into bills, largest denomination first.
///
/// Only denominations with a non-zero quantity are listed. Any fractional
/// part of `amount` is ignored; callers pass already-rounded payouts. With a
/// denomination of 1 available the bills always add up to `amount`.
///
/// # Errors
///
/// Returns `InvalidDistribution` when `amount` is negative or too large to
/// count in bills.
///
/// # Examples
///
/// ```
/// use tip_steward::calculation::{bill_breakdown, DEFAULT_DENOMINATIONS};
/// use rust_decimal::Decimal;
///
/// let bills = bill_breakdown(Decimal::from(67), &DEFAULT_DENOMINATIONS).unwrap();
/// let described: Vec<(u32, u64)> = bills
///     .iter()
///     .map(|b| (b.denomination, b.quantity))
///     .collect();
/// assert_eq!(described, vec![(20, 3), (5, 1), (1, 2)]);
/// ```
pub fn bill_breakdown(amount: Decimal, denominations: &[u32]) -> StewardResult<Vec<BillCount>> {
    let mut remaining = amount
        .trunc()
        .to_u64()
        .ok_or_else(|| too_large("billBreakdown"))?;

    let mut sorted: Vec<u32> = denominations.iter().copied().filter(|d| *d > 0).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();

    let mut bills = Vec::new();
    for denomination in sorted {
        let quantity = remaining / u64::from(denomination);
        if quantity == 0 {
            continue;
        }
        remaining -= quantity * u64::from(denomination);
        bills.push(BillCount {
            denomination,
            quantity,
        });
    }

    Ok(bills)
}

/// Totals the bills needed to pay every partner, largest denomination first.
///
/// # Errors
///
/// Returns `InvalidDistribution` if a per-denomination count overflows.
pub fn total_bills(payouts: &[PartnerPayout]) -> StewardResult<Vec<BillCount>> {
    let mut totals: BTreeMap<u32, u64> = BTreeMap::new();
    for bill in payouts.iter().flat_map(|p| p.bill_breakdown.iter()) {
        let total = totals.entry(bill.denomination).or_default();
        *total = total
            .checked_add(bill.quantity)
            .ok_or_else(|| too_large("billTotals"))?;
    }

    Ok(totals
        .into_iter()
        .rev()
        .map(|(denomination, quantity)| BillCount {
            denomination,
            quantity,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StewardError;
    use proptest::prelude::*;

    fn pairs(bills: &[BillCount]) -> Vec<(u32, u64)> {
        bills.iter().map(|b| (b.denomination, b.quantity)).collect()
    }

    #[test]
    fn test_zero_amount_has_no_bills() {
        assert!(bill_breakdown(Decimal::ZERO, &DEFAULT_DENOMINATIONS).unwrap().is_empty());
    }

    #[test]
    fn test_exact_twenties() {
        let bills = bill_breakdown(Decimal::from(60), &DEFAULT_DENOMINATIONS).unwrap();
        assert_eq!(pairs(&bills), vec![(20, 3)]);
    }

    #[test]
    fn test_every_denomination_used() {
        let bills = bill_breakdown(Decimal::from(36), &DEFAULT_DENOMINATIONS).unwrap();
        assert_eq!(pairs(&bills), vec![(20, 1), (10, 1), (5, 1), (1, 1)]);
    }

    #[test]
    fn test_unsorted_denominations_are_handled() {
        let bills = bill_breakdown(Decimal::from(27), &[1, 5, 20, 10]).unwrap();
        assert_eq!(pairs(&bills), vec![(20, 1), (5, 1), (1, 2)]);
    }

    #[test]
    fn test_custom_denominations() {
        let bills = bill_breakdown(Decimal::from(153), &[100, 50, 2, 1]).unwrap();
        assert_eq!(pairs(&bills), vec![(100, 1), (50, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn test_total_bills_sums_across_partners() {
        let payouts = vec![
            PartnerPayout {
                name: "A".to_string(),
                hours: Decimal::from(10),
                rounded: Decimal::from(26),
                bill_breakdown: bill_breakdown(Decimal::from(26), &DEFAULT_DENOMINATIONS).unwrap(),
            },
            PartnerPayout {
                name: "B".to_string(),
                hours: Decimal::from(10),
                rounded: Decimal::from(41),
                bill_breakdown: bill_breakdown(Decimal::from(41), &DEFAULT_DENOMINATIONS).unwrap(),
            },
        ];

        // 26 = 20 + 5 + 1, 41 = 20 + 20 + 1
        assert_eq!(pairs(&total_bills(&payouts).unwrap()), vec![(20, 3), (5, 1), (1, 2)]);
    }

    #[test]
    fn test_large_amount_is_not_capped() {
        // More twenties than fit in a u32
        let amount = Decimal::from(200_000_000_000u64);
        let bills = bill_breakdown(amount, &DEFAULT_DENOMINATIONS).unwrap();
        assert_eq!(pairs(&bills), vec![(20, 10_000_000_000)]);
        assert_eq!(bills.iter().map(BillCount::value).sum::<Decimal>(), amount);
    }

    #[test]
    fn test_amount_beyond_u64_is_rejected() {
        let amount = Decimal::from(u64::MAX) + Decimal::ONE;
        assert!(bill_breakdown(amount, &DEFAULT_DENOMINATIONS).is_err());
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        assert!(bill_breakdown(Decimal::from(-5), &DEFAULT_DENOMINATIONS).is_err());
    }

    #[test]
    fn test_total_bills_overflow_is_rejected() {
        let payout = PartnerPayout {
            name: "A".to_string(),
            hours: Decimal::ONE,
            rounded: Decimal::from(u64::MAX),
            bill_breakdown: vec![BillCount {
                denomination: 1,
                quantity: u64::MAX,
            }],
        };
        let err = total_bills(&[payout.clone(), payout]).unwrap_err();
        assert!(matches!(err, StewardError::InvalidDistribution { ref field, .. } if field == "billTotals"));
    }

    proptest! {
        #[test]
        fn prop_bills_add_up_to_amount(amount in 0u32..100_000) {
            let amount = Decimal::from(amount);
            let bills = bill_breakdown(amount, &DEFAULT_DENOMINATIONS).unwrap();
            let value: Decimal = bills.iter().map(BillCount::value).sum();
            prop_assert_eq!(value, amount);
        }

        #[test]
        fn prop_bills_are_strictly_descending(amount in 0u32..100_000) {
            let bills = bill_breakdown(Decimal::from(amount), &DEFAULT_DENOMINATIONS).unwrap();
            for pair in bills.windows(2) {
                prop_assert!(pair[0].denomination > pair[1].denomination);
            }
            prop_assert!(bills.iter().all(|b| b.quantity > 0));
        }
    }
}
