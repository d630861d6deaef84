//! Korean won amounts.
//!
//! Prices travel as whole won (no minor unit), so a plain `i64` is exact.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// An amount of money in Korean won.
///
/// Displays with thousands separators and the `원` suffix:
///
/// ```
/// use shopbag_core::Won;
///
/// assert_eq!(Won::new(12345).to_string(), "12,345원");
/// assert_eq!(Won::new(-2500).to_string(), "-2,500원");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Won(i64);

impl Won {
    /// Zero won.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// Multiply by a quantity, saturating on overflow.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// The smaller of two amounts.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }

    /// Digits grouped by thousands, without the currency suffix.
    #[must_use]
    pub fn grouped(self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        if self.0 < 0 {
            out.push('-');
        }
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Display for Won {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}원", self.grouped())
    }
}

impl From<i64> for Won {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl Add for Won {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Won {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Won {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping() {
        assert_eq!(Won::new(0).to_string(), "0원");
        assert_eq!(Won::new(999).to_string(), "999원");
        assert_eq!(Won::new(1000).to_string(), "1,000원");
        assert_eq!(Won::new(20000).to_string(), "20,000원");
        assert_eq!(Won::new(1_234_567).to_string(), "1,234,567원");
    }

    #[test]
    fn test_negative() {
        assert_eq!(Won::new(-1500).grouped(), "-1,500");
    }

    #[test]
    fn test_arithmetic() {
        let total: Won = [Won::new(1000), Won::new(2500)].into_iter().sum();
        assert_eq!(total, Won::new(3500));
        assert_eq!(Won::new(3000).times(3), Won::new(9000));
        assert_eq!(Won::new(5000) - Won::new(1200), Won::new(3800));
    }
}
