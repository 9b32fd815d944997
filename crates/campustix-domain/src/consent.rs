//! Consent request lifecycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownValue;

/// Persisted status column of a consent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    Pending,
    Approved,
    Rejected,
}

impl ConsentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownValue {
                kind: "consent status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Workflow state derived from the status column and the two verification flags.
///
/// ```text
/// Created ──verify──▶ EmailVerified ──issue──▶ Approved
///    │                     │
///    └──────reject─────────┴──────▶ Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentState {
    Created,
    EmailVerified,
    Approved,
    Rejected,
}

impl ConsentState {
    pub fn from_flags(status: ConsentStatus, email_verified: bool) -> Self {
        match status {
            ConsentStatus::Pending if email_verified => Self::EmailVerified,
            ConsentStatus::Pending => Self::Created,
            ConsentStatus::Approved => Self::Approved,
            ConsentStatus::Rejected => Self::Rejected,
        }
    }

    /// `Approved` and `Rejected` have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::EmailVerified)
                | (Self::EmailVerified, Self::Approved)
                | (Self::Created, Self::Rejected)
                | (Self::EmailVerified, Self::Rejected)
        )
    }
}

impl fmt::Display for ConsentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::EmailVerified => "email_verified",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        })
    }
}
