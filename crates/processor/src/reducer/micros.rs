//! Fixed-point amounts
//!
//! Sums of money and speed are kept as integer micro-units so that the total
//! of a window does not depend on the order its records arrived in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Amount scaled by 10^6 and stored as an integer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Micros(i64);

impl Micros {
    pub const SCALE: i64 = 1_000_000;
    pub const ZERO: Micros = Micros(0);

    /// Round a decimal amount to the nearest micro-unit
    ///
    /// Returns `None` for NaN, infinities and values outside the range of
    /// the representation.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * Self::SCALE as f64).round();
        if scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return None;
        }
        Some(Micros(scaled as i64))
    }

    pub fn from_raw(raw: i64) -> Self {
        Micros(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn checked_mul(self, factor: i64) -> Option<Self> {
        self.0.checked_mul(factor).map(Micros)
    }

    pub fn checked_add(self, other: Micros) -> Option<Self> {
        self.0.checked_add(other.0).map(Micros)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

impl Add for Micros {
    type Output = Micros;

    /// Saturates at the bounds of the representation
    fn add(self, other: Micros) -> Micros {
        Micros(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Micros {
    fn add_assign(&mut self, other: Micros) {
        *self = *self + other;
    }
}

impl Sum for Micros {
    fn sum<I: Iterator<Item = Micros>>(iter: I) -> Self {
        iter.fold(Micros::ZERO, Add::add)
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}
