//! Hourly rate calculation.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::StewardResult;

use super::too_large;

/// Calculates the tip amount per hour.
///
/// The rate is truncated to whole cents rather than rounded, so that
/// `rate × total_hours` never exceeds the pool. Returns zero when no hours
/// were worked.
///
/// # Errors
///
/// Returns `InvalidDistribution` when the quotient does not fit in a
/// `Decimal`, as happens for a very large pool over a tiny number of hours.
///
/// # Examples
///
/// ```
/// use tip_steward::calculation::calculate_hourly_rate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let rate = calculate_hourly_rate(
///     Decimal::from_str("500.00").unwrap(),
///     Decimal::from_str("120").unwrap(),
/// )
/// .unwrap();
/// // 500 / 120 = 4.1666...
/// assert_eq!(rate, Decimal::from_str("4.16").unwrap());
/// ```
pub fn calculate_hourly_rate(total_amount: Decimal, total_hours: Decimal) -> StewardResult<Decimal> {
    if total_hours <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    total_amount
        .checked_div(total_hours)
        .map(|rate| rate.round_dp_with_strategy(2, RoundingStrategy::ToZero))
        .ok_or_else(|| too_large("hourlyRate"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StewardError;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_exact_division() {
        assert_eq!(calculate_hourly_rate(dec("300"), dec("100")).unwrap(), dec("3.00"));
    }

    #[test]
    fn test_truncates_instead_of_rounding() {
        // 100 / 3 = 33.333...
        assert_eq!(calculate_hourly_rate(dec("100"), dec("3")).unwrap(), dec("33.33"));
        // 2 / 3 = 0.666... would round up to 0.67
        assert_eq!(calculate_hourly_rate(dec("2"), dec("3")).unwrap(), dec("0.66"));
    }

    #[test]
    fn test_zero_hours_gives_zero_rate() {
        assert_eq!(calculate_hourly_rate(dec("250"), Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_pool_gives_zero_rate() {
        assert_eq!(calculate_hourly_rate(Decimal::ZERO, dec("40")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_rate_never_over_distributes() {
        let total = dec("1234.56");
        let hours = dec("287.25");
        let rate = calculate_hourly_rate(total, hours).unwrap();
        assert!(rate * hours <= total);
    }

    #[test]
    fn test_overflowing_quotient_is_rejected() {
        let err = calculate_hourly_rate(Decimal::MAX, dec("0.0000001")).unwrap_err();
        assert!(matches!(err, StewardError::InvalidDistribution { ref field, .. } if field == "hourlyRate"));
    }
}
