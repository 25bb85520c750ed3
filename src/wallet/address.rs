//! EVM account addresses.
//!
//! An address is `0x` followed by 40 hex digits. All-lowercase input is
//! accepted as-is; any other casing must carry a valid EIP-55 checksum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::ValidationError;

const ADDRESS_HEX_LEN: usize = 40;

/// A syntactically valid EVM address, stored exactly as the user typed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if is_valid_address(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidAddress(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// EIP-55 mixed-case form of this address.
    pub fn to_checksum(&self) -> String {
        checksum_address(&self.0[2..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// Returns true when `raw` is a well-formed address with a consistent checksum.
pub fn is_valid_address(raw: &str) -> bool {
    let Some(hex) = raw.strip_prefix("0x") else {
        return false;
    };
    if hex.len() != ADDRESS_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return false;
    }
    if hex.bytes().all(|b| !b.is_ascii_uppercase()) {
        return true;
    }
    checksum_address(hex) == raw
}

/// Apply EIP-55 casing to 40 hex digits (without the `0x` prefix).
fn checksum_address(hex: &str) -> String {
    let lower = hex.to_ascii_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(ADDRESS_HEX_LEN + 2);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &[&str] = &[
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn accepts_eip55_vectors() {
        for addr in CHECKSUMMED {
            assert!(is_valid_address(addr), "{addr} should be valid");
        }
    }

    #[test]
    fn accepts_all_lowercase() {
        for addr in CHECKSUMMED {
            assert!(is_valid_address(&addr.to_ascii_lowercase()));
        }
    }

    #[test]
    fn rejects_broken_checksum() {
        assert!(!is_valid_address(
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD"
        ));
        assert!(!is_valid_address(
            "0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"
        ));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("0x"));
        assert!(!is_valid_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(!is_valid_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beae"));
        assert!(!is_valid_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaedd"));
        assert!(!is_valid_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beagd"));
        assert!(!is_valid_address(" 0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(!is_valid_address("send 1 eth"));
    }

    #[test]
    fn checksum_roundtrips_lowercase_input() {
        for addr in CHECKSUMMED {
            let parsed = Address::parse(&addr.to_ascii_lowercase()).unwrap();
            assert_eq!(parsed.to_checksum(), *addr);
        }
    }

    #[test]
    fn parse_keeps_original_text() {
        let addr = Address::parse(CHECKSUMMED[0]).unwrap();
        assert_eq!(addr.as_str(), CHECKSUMMED[0]);
        assert_eq!(addr.to_string(), CHECKSUMMED[0]);
        assert_eq!(
            Address::parse("0xnothex").unwrap_err(),
            ValidationError::InvalidAddress("0xnothex".to_string())
        );
    }
}
