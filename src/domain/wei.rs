//! Native-unit amounts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EscrowError;

/// Amount in the smallest native unit (10^-18 of the whole unit).
///
/// Serialized as a decimal string so that `u128` values survive JSON
/// clients that only have 64-bit floats. All arithmetic is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Wei(u128);

impl Wei {
    /// Zero value.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw amount.
    #[must_use]
    pub const fn new(amount: u128) -> Self {
        Self(amount)
    }

    /// Returns the raw amount.
    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::ArithmeticOverflow`] if the sum exceeds `u128`.
    pub fn checked_add(self, rhs: Self) -> Result<Self, EscrowError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(EscrowError::ArithmeticOverflow)
    }

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::ArithmeticOverflow`] if `rhs > self`.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, EscrowError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(EscrowError::ArithmeticOverflow)
    }
}

impl FromStr for Wei {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|_| EscrowError::InvalidRequest(format!("invalid amount: {s}")))
    }
}

impl TryFrom<String> for Wei {
    type Error = EscrowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Wei> for String {
    fn from(wei: Wei) -> Self {
        wei.0.to_string()
    }
}

impl From<u128> for Wei {
    fn from(amount: u128) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn add_overflow_is_rejected() {
        let max = Wei::new(u128::MAX);
        assert!(matches!(
            max.checked_add(Wei::new(1)),
            Err(EscrowError::ArithmeticOverflow)
        ));
    }

    #[test]
    fn sub_underflow_is_rejected() {
        let result = Wei::new(1).checked_sub(Wei::new(2));
        assert!(matches!(result, Err(EscrowError::ArithmeticOverflow)));
    }

    #[test]
    fn parses_decimal_strings() {
        let Ok(wei) = "200000000000000".parse::<Wei>() else {
            panic!("valid amount");
        };
        assert_eq!(wei.get(), 200_000_000_000_000);
        assert!("-1".parse::<Wei>().is_err());
        assert!("0.0002".parse::<Wei>().is_err());
    }

    #[test]
    fn json_uses_strings() {
        let json = serde_json::to_string(&Wei::new(600)).unwrap_or_default();
        assert_eq!(json, "\"600\"");
    }
}
