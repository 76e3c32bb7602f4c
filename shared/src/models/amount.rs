//! Monetary amount in minor currency units
//!
//! Amounts never cross the API boundary as binary floating point. They are
//! serialized as integers (minor units) and may be supplied either that way or
//! as an exact-decimal string such as `"120.50"`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits carried by one minor unit (paise / cents)
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Largest magnitude accepted from outside, in minor units (10^13 major units)
///
/// Thousands of bounded amounts can be summed without leaving `i64`.
pub const MAX_MINOR: i64 = 1_000_000_000_000_000;

/// Amount parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a decimal number")]
    NotDecimal(String),

    #[error("'{0}' has more than two fractional digits")]
    TooPrecise(String),

    #[error("'{0}' is out of range")]
    OutOfRange(String),
}

/// Signed amount in minor currency units
///
/// Signed so that corrective adjustments can be represented; fee amounts are
/// validated non-negative where they are created.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Amount(minor)
    }

    /// Minor units from an untrusted source, bounded by [`MAX_MINOR`]
    pub fn try_from_minor(minor: i64) -> Result<Self, AmountError> {
        if minor.unsigned_abs() > MAX_MINOR.unsigned_abs() {
            return Err(AmountError::OutOfRange(minor.to_string()));
        }
        Ok(Amount(minor))
    }

    #[inline]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Sum that reports overflow instead of saturating
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(iter: I) -> Option<Amount> {
        iter.into_iter().try_fold(Amount::ZERO, Amount::checked_add)
    }

    /// `max(self, 0)`
    #[inline]
    pub fn clamp_non_negative(self) -> Self {
        Amount(self.0.max(0))
    }

    /// Exact decimal representation in major units (e.g. `12050` → `120.50`)
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    /// Convert a decimal in major units into minor units, refusing to round
    pub fn from_decimal(value: Decimal) -> Result<Self, AmountError> {
        let normalized = value.normalize();
        if normalized.scale() > MINOR_UNIT_SCALE {
            return Err(AmountError::TooPrecise(value.to_string()));
        }
        let minor = value
            .checked_mul(Decimal::from(10_i64.pow(MINOR_UNIT_SCALE)))
            .ok_or_else(|| AmountError::OutOfRange(value.to_string()))?;
        let minor = minor.normalize();
        let minor = i64::try_from(minor).map_err(|_| AmountError::OutOfRange(value.to_string()))?;
        Amount::try_from_minor(minor).map_err(|_| AmountError::OutOfRange(value.to_string()))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = Decimal::from_str_exact(trimmed)
            .map_err(|_| AmountError::NotDecimal(trimmed.to_string()))?;
        Amount::from_decimal(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

// Operators saturate: a result pinned at the i64 limit can never equal a
// bounded amount, so invariant checks downstream still fail loudly.

impl Add for Amount {
    type Output = Amount;
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        *self = *self - rhs;
    }
}

impl Neg for Amount {
    type Output = Amount;
    fn neg(self) -> Amount {
        Amount(self.0.saturating_neg())
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

/// Amount as accepted in request bodies: integer minor units or exact-decimal string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Minor(i64),
    Decimal(String),
}

impl AmountInput {
    pub fn into_amount(self) -> Result<Amount, AmountError> {
        match self {
            AmountInput::Minor(minor) => Amount::try_from_minor(minor),
            AmountInput::Decimal(text) => text.parse(),
        }
    }
}

impl From<Amount> for AmountInput {
    fn from(amount: Amount) -> Self {
        AmountInput::Minor(amount.minor())
    }
}
