//! Ledger-facing value types: wallet addresses, transaction references and
//! the outcome of a ticket issuance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownValue;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerValueError {
    #[error("wallet address must be 0x followed by 40 hex characters")]
    WalletAddress,
    #[error("transaction reference must be 0x followed by 64 hex characters")]
    TransactionReference,
}

fn is_prefixed_hex(s: &str, digits: usize) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == digits && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Account address on the ledger, stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(s: &str) -> Result<Self, LedgerValueError> {
        let s = s.trim();
        if !is_prefixed_hex(s, 40) {
            return Err(LedgerValueError::WalletAddress);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for WalletAddress {
    type Err = LedgerValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = LedgerValueError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction hash recorded for an issued ticket: `0x` + 64 lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionReference(String);

impl TransactionReference {
    pub fn parse(s: &str) -> Result<Self, LedgerValueError> {
        if !is_prefixed_hex(s, 64) {
            return Err(LedgerValueError::TransactionReference);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Build from a 32-byte digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(format!("0x{}", hex::encode(digest)))
    }

    /// Parse only the exact stored form, rejecting uppercase hex digits.
    pub fn parse_canonical(s: &str) -> Result<Self, LedgerValueError> {
        let reference = Self::parse(s)?;
        if reference.0 != s {
            return Err(LedgerValueError::TransactionReference);
        }
        Ok(reference)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TransactionReference {
    type Err = LedgerValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TransactionReference {
    type Error = LedgerValueError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TransactionReference> for String {
    fn from(r: TransactionReference) -> Self {
        r.0
    }
}

impl fmt::Display for TransactionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuanceKind {
    Real,
    Simulated,
}

impl IssuanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Simulated => "simulated",
        }
    }
}

impl fmt::Display for IssuanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssuanceKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real" => Ok(Self::Real),
            "simulated" => Ok(Self::Simulated),
            other => Err(UnknownValue {
                kind: "issuance kind",
                value: other.to_owned(),
            }),
        }
    }
}

/// Result of issuing a ticket on the ledger.
///
/// A simulated issuance never touched a real ledger and is always reported
/// as such, never passed off as a real one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reference", rename_all = "snake_case")]
pub enum Issuance {
    Real(TransactionReference),
    Simulated(TransactionReference),
}

impl Issuance {
    pub fn new(kind: IssuanceKind, reference: TransactionReference) -> Self {
        match kind {
            IssuanceKind::Real => Self::Real(reference),
            IssuanceKind::Simulated => Self::Simulated(reference),
        }
    }

    pub fn reference(&self) -> &TransactionReference {
        match self {
            Self::Real(r) | Self::Simulated(r) => r,
        }
    }

    pub fn kind(&self) -> IssuanceKind {
        match self {
            Self::Real(_) => IssuanceKind::Real,
            Self::Simulated(_) => IssuanceKind::Simulated,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated(_))
    }
}
