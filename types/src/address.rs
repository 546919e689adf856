//! Member and insured-contract identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a pool member.
///
/// The pool never interprets the string; membership validity is decided by
/// the membership collaborator.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Address of an insured smart contract / protocol that members stake against.
///
/// Stored lower-cased so that `0xAbC…` and `0xabc…` name the same contract.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContractAddress(String);

impl ContractAddress {
    /// The conventional hex prefix for contract addresses.
    pub const PREFIX: &'static str = "0x";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a well-formed 20-byte hex address.
    pub fn is_valid(&self) -> bool {
        match self.0.strip_prefix(Self::PREFIX) {
            Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => false,
        }
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContractAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
