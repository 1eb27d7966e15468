use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const KZT_CURRENCY_CODE: &str = "KZT";
pub const CURRENCY_SIGN: &str = "₸";

//--------------------------------------        Tenge        ---------------------------------------------------------
/// An amount of money in whole tenge. Prices, order totals and cashback are all integer amounts.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Tenge(i64);

op!(binary Tenge, Add, add);
op!(binary Tenge, Sub, sub);
op!(inplace Tenge, AddAssign, add_assign);
op!(inplace Tenge, SubAssign, sub_assign);
op!(unary Tenge, Neg, neg);

impl Mul<i64> for Tenge {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Tenge {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in tenge: {0}")]
pub struct TengeConversionError(String);

impl From<i64> for Tenge {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Tenge {
    type Error = TengeConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| TengeConversionError(format!("Value {value} is too large to convert to Tenge")))
    }
}

impl Display for Tenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {CURRENCY_SIGN}", self.0)
    }
}

impl Tenge {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Takes `percent`% of this amount, rounding half-way cases up to the next whole tenge.
    ///
    /// Negative amounts are rounded symmetrically (away from zero on the half).
    pub fn percent_rounded(&self, percent: i64) -> Self {
        let scaled = self.0 * percent;
        let rounded = if scaled >= 0 { (scaled + 50) / 100 } else { -((-scaled + 50) / 100) };
        Self(rounded)
    }
}
