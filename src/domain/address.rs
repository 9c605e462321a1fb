//! Type-safe account identity.
//!
//! [`Address`] is a 20-byte account identifier written as `0x` followed by
//! 40 hex digits. It identifies stakers, the ledger owner, and payout
//! recipients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EscrowError;

/// Length of the textual form: `0x` prefix plus 40 hex digits.
const ADDRESS_STR_LEN: usize = 42;

/// Account identity of a participant, owner, or recipient.
///
/// Parsing is case-insensitive; [`fmt::Display`] always renders lowercase
/// hex. Serialized as a JSON string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    /// The null identity. Never a valid payout recipient.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an `Address` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns `true` for [`Address::ZERO`].
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Address {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EscrowError::InvalidAddress(s.to_string());

        if s.len() != ADDRESS_STR_LEN {
            return Err(invalid());
        }
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 20];
        for (slot, pair) in bytes.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
            let digits = std::str::from_utf8(pair).map_err(|_| invalid())?;
            *slot = u8::from_str_radix(digits, 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = EscrowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const ALICE: &str = "0x00000000000000000000000000000000000a11ce";

    #[test]
    fn parses_and_displays_lowercase() {
        let Ok(addr) = "0xAbCdEf0000000000000000000000000000000001".parse::<Address>() else {
            panic!("valid address");
        };
        assert_eq!(
            addr.to_string(),
            "0xabcdef0000000000000000000000000000000001"
        );
    }

    #[test]
    fn rejects_missing_prefix() {
        let result = "0000000000000000000000000000000000000a11ce".parse::<Address>();
        assert!(matches!(result, Err(EscrowError::InvalidAddress(_))));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!(format!("{ALICE}00").parse::<Address>().is_err());
    }

    #[test]
    fn rejects_non_hex_digits() {
        let result = "0x00000000000000000000000000000000000zzzzz".parse::<Address>();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_sign_characters() {
        let s = format!("0x+f{}", "0".repeat(38));
        assert!(s.parse::<Address>().is_err());
    }

    #[test]
    fn rejects_multibyte_characters() {
        // 42 bytes long, but not ASCII hex.
        let s = format!("0x{}é", "0".repeat(38));
        assert_eq!(s.len(), 42);
        assert!(s.parse::<Address>().is_err());
    }

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        let Ok(alice) = ALICE.parse::<Address>() else {
            panic!("valid address");
        };
        assert!(!alice.is_zero());
    }

    #[test]
    fn serializes_as_json_string() {
        let Ok(alice) = ALICE.parse::<Address>() else {
            panic!("valid address");
        };
        let json = serde_json::to_string(&alice).unwrap_or_default();
        assert_eq!(json, format!("\"{ALICE}\""));

        let Ok(back) = serde_json::from_str::<Address>(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, alice);
    }

    #[test]
    fn deserialize_rejects_garbage() {
        let result = serde_json::from_str::<Address>("\"not-an-address\"");
        assert!(result.is_err());
    }
}
