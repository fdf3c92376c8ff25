//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as [`Decimal`] so that line totals and subtotals are exact
//! (`9.99 * 3 == 29.97`, never `29.969999999999995`). On the wire a price is a
//! plain JSON number, which is how product feeds and stored carts encode it.

use core::fmt;
use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::money::format_usd;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),

    /// The amount is above [`Price::MAX`].
    #[error("price cannot exceed {max} (got {0})", max = Price::MAX)]
    TooLarge(Decimal),
}

/// A unit price in US dollars, between zero and [`Price::MAX`].
///
/// ## Examples
///
/// ```
/// use std::num::NonZeroU32;
///
/// use mustafo_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(999, 2)).unwrap();
/// let three = NonZeroU32::new(3).unwrap();
/// assert_eq!(price.times(three), Some(Decimal::new(2997, 2)));
///
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// assert!(Price::new(Decimal::from(2_000_000_000)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The highest accepted unit price, $1,000,000,000.
    pub const MAX: Self = Self(Decimal::from_parts(1_000_000_000, 0, 0, false, 0));

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero and
    /// [`PriceError::TooLarge`] if it is above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Get the amount in dollars.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, or `None` if it overflows.
    #[must_use]
    pub fn times(&self, quantity: NonZeroU32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity.get()))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_usd(self.0))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-5, 1)),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_new_accepts_zero() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_times_is_exact() {
        let price = Price::from_cents(999);
        let quantity = NonZeroU32::new(3).unwrap();
        assert_eq!(price.times(quantity), Some(Decimal::new(2997, 2)));
    }

    #[test]
    fn test_times_at_limits_does_not_overflow() {
        assert_eq!(
            Price::MAX.times(NonZeroU32::MAX),
            Some(Decimal::from(1_000_000_000u64) * Decimal::from(u32::MAX))
        );
    }

    #[test]
    fn test_new_rejects_above_max() {
        assert_eq!(Price::new(Price::MAX.amount()), Ok(Price::MAX));
        assert!(matches!(
            Price::new(Price::MAX.amount() + Decimal::new(1, 2)),
            Err(PriceError::TooLarge(_))
        ));
    }

    #[test]
    fn test_serializes_as_json_number() {
        let price = Price::from_cents(1050);
        assert_eq!(serde_json::to_string(&price).unwrap(), "10.5");
    }

    #[test]
    fn test_deserializes_integer_and_decimal_numbers() {
        let whole: Price = serde_json::from_str("10").unwrap();
        assert_eq!(whole.amount(), Decimal::from(10));

        let fractional: Price = serde_json::from_str("109.95").unwrap();
        assert_eq!(fractional.amount(), Decimal::new(10995, 2));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Price>("-3.5").is_err());
    }

    #[test]
    fn test_deserialize_rejects_huge_amounts() {
        assert!(serde_json::from_str::<Price>("6e28").is_err());
        assert!(serde_json::from_str::<Price>("1000000000.01").is_err());
        assert!(serde_json::from_str::<Price>("1e300").is_err());
    }

    #[test]
    fn test_display_uses_usd_format() {
        assert_eq!(Price::from_cents(123_456).to_string(), "$1,234.56");
    }
}
