//! Integer amounts in an asset's smallest unit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A non-negative quantity of some asset, in base units.
///
/// Arithmetic is explicit and checked; there are no `Add`/`Sub` impls so an
/// overflow can never slip through silently.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Split into `parts` equal shares, truncating the remainder.
    ///
    /// Returns `None` when `parts` is zero.
    #[must_use]
    pub fn split(self, parts: usize) -> Option<Self> {
        let parts = u128::try_from(parts).ok()?;
        self.0.checked_div(parts).map(Self)
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(u128::from(units))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_truncates() {
        assert_eq!(Amount(400).split(4), Some(Amount(100)));
        assert_eq!(Amount(401).split(4), Some(Amount(100)));
        assert_eq!(Amount(3).split(4), Some(Amount::ZERO));
        assert_eq!(Amount(10).split(0), None);
    }

    #[test]
    fn checked_arithmetic() {
        assert_eq!(Amount(u128::MAX).checked_add(Amount(1)), None);
        assert_eq!(Amount(5).checked_sub(Amount(6)), None);
        assert_eq!(Amount(5).saturating_sub(Amount(6)), Amount::ZERO);
        assert_eq!(Amount(5).checked_add(Amount(6)), Some(Amount(11)));
    }
}
