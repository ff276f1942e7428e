//! This module contains the monetary amount type shared by the ledger and the
//! user registry.

use std::ops::{Add, AddAssign};

/// A payout amount in the payout currency. Stored as a double in the database,
/// matching the precision the upstream payment networks report.
#[derive(Debug, Clone, Copy, Default, PartialOrd, PartialEq)]
pub struct Amount(pub f64);

impl Amount {
    /// Returns true for amounts a ledger entry may carry. Zero, negative and
    /// NaN amounts are all rejected.
    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

#[cfg(test)]
mod tests {
    use super::Amount;

    #[test]
    fn positivity() {
        assert!(Amount(0.01).is_positive());
        assert!(!Amount(0.0).is_positive());
        assert!(!Amount(-5.0).is_positive());
        assert!(!Amount(f64::NAN).is_positive());
    }

    #[test]
    fn accumulation() {
        let mut total = Amount(50.0);
        total += Amount(25.0);
        assert_eq!(total, Amount(75.0));
    }
}
