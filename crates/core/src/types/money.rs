//! Money formatting helpers.
//!
//! Two renderings are used across the shop:
//! - [`format_usd`] for display (`$1,234.50`), matching `en-US` currency style
//! - [`format_amount`] for plain-text order messages (`1234.5`), with trailing
//!   zeros stripped

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as US currency, e.g. `$1,234.56`.
///
/// Rounds half away from zero to whole cents.
///
/// ```
/// use mustafo_core::format_usd;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_usd(Decimal::new(2997, 2)), "$29.97");
/// assert_eq!(format_usd(Decimal::from(1_000_000)), "$1,000,000.00");
/// ```
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    format!("{sign}${}.{cents}", group_thousands(whole))
}

/// Format an amount without a currency symbol or trailing zeros.
///
/// `10.00` renders as `10`, `29.970` as `29.97`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Insert `,` between every group of three digits, counting from the right.
///
/// `digits` must be ASCII; positions are counted in bytes.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, byte) in digits.bytes().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(char::from(byte));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd_small_amounts() {
        assert_eq!(format_usd(Decimal::ZERO), "$0.00");
        assert_eq!(format_usd(Decimal::new(5, 2)), "$0.05");
        assert_eq!(format_usd(Decimal::from(10)), "$10.00");
    }

    #[test]
    fn test_format_usd_groups_thousands() {
        assert_eq!(format_usd(Decimal::new(123_456, 2)), "$1,234.56");
        assert_eq!(format_usd(Decimal::new(12_345_678, 2)), "$123,456.78");
        assert_eq!(format_usd(Decimal::from(1_000_000)), "$1,000,000.00");
    }

    #[test]
    fn test_format_usd_groups_largest_totals() {
        assert_eq!(group_thousands("1000000000000"), "1,000,000,000,000");
        assert_eq!(
            format_usd(Decimal::from(1_000_000_000_010_u64)),
            "$1,000,000,000,010.00"
        );
    }

    #[test]
    fn test_format_usd_rounds_half_away_from_zero() {
        assert_eq!(format_usd(Decimal::new(1005, 3)), "$1.01");
        assert_eq!(format_usd(Decimal::new(1004, 3)), "$1.00");
    }

    #[test]
    fn test_format_usd_negative() {
        assert_eq!(format_usd(Decimal::new(-1250, 2)), "-$12.50");
    }

    #[test]
    fn test_format_amount_strips_trailing_zeros() {
        assert_eq!(format_amount(Decimal::new(1000, 2)), "10");
        assert_eq!(format_amount(Decimal::new(29_970, 3)), "29.97");
        assert_eq!(format_amount(Decimal::new(999, 2)), "9.99");
        assert_eq!(format_amount(Decimal::ZERO), "0");
    }
}
