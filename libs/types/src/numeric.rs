//! Fixed-point decimal amounts
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Every monetary value in a funding process (pool, transfer, match) is an
//! `Amount`, which can never be negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Non-negative monetary amount.
///
/// Serialized as a decimal string so no precision is lost on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create an amount, returning None if the value is negative
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Create from a whole number
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse from a decimal string, rejecting negatives
    pub fn from_str(s: &str) -> Option<Self> {
        Decimal::from_str(s).ok().and_then(Self::try_new)
    }

    /// Get the underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.0.is_zero()
    }

    /// Subtract, flooring at zero
    pub fn saturating_sub(&self, other: Amount) -> Amount {
        if other.0 >= self.0 {
            Amount::ZERO
        } else {
            Amount(self.0 - other.0)
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::ZERO
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::try_new(value).ok_or_else(|| format!("negative amount: {}", value))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Amount;

    /// Saturates at `Decimal::MAX` instead of overflowing.
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn amount() -> impl Strategy<Value = Amount> {
        (0u64..=u64::MAX, 0u32..=28).prop_map(|(mantissa, scale)| {
            Amount::try_new(Decimal::from_i128_with_scale(mantissa as i128 * 4_000_000_000, scale)).unwrap()
        })
    }

    proptest! {
        #[test]
        fn prop_sum_never_panics_and_dominates_terms(values in prop::collection::vec(amount(), 0..20)) {
            let total: Amount = values.iter().sum();
            for v in &values {
                prop_assert!(total >= *v);
            }
        }

        #[test]
        fn prop_sign_decides_acceptance(mantissa in any::<i64>(), scale in 0u32..=28) {
            let value = Decimal::new(mantissa, scale);
            prop_assert_eq!(Amount::try_new(value).is_some(), mantissa >= 0);
        }
    }
}
