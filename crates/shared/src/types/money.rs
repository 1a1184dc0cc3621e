//! Monetary amounts stored as integer minor units.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Ledger rows hold `i64` minor units (kobo, cents); `Decimal` is only used at
//! the edges when converting from or to major units.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places of the minor unit for every supported currency.
pub const DEFAULT_SCALE: u32 = 2;

/// Errors raised while converting amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The value does not fit in 64-bit minor units.
    #[error("Amount is out of range")]
    Overflow,
}

/// A signed amount of money in minor units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero minor units.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Converts a major-unit decimal into minor units, rounding half to even.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Overflow` if the result does not fit in `i64`.
    pub fn from_major(major: Decimal, scale: u32) -> Result<Self, AmountError> {
        let rounded = major.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
        let factor = Decimal::from(10_i64.checked_pow(scale).ok_or(AmountError::Overflow)?);
        let minor = rounded
            .checked_mul(factor)
            .and_then(|m| m.to_i64())
            .ok_or(AmountError::Overflow)?;
        Ok(Self(minor))
    }

    /// Converts to a major-unit decimal with the given scale.
    #[must_use]
    pub fn to_major(self, scale: u32) -> Decimal {
        Decimal::new(self.0, scale)
    }

    /// Checked addition.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute difference between two amounts, in minor units.
    #[must_use]
    pub const fn abs_diff(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl From<i64> for Amount {
    fn from(minor: i64) -> Self {
        Self(minor)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_major(DEFAULT_SCALE))
    }
}
