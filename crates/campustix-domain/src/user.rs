//! User domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownValue;

/// Role of a user account.
///
/// Wire format in identity headers: `u8` (0 = Student, 1 = ClubAdmin).
/// Storage and JSON format: `"student"` / `"club_admin"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student = 0,
    ClubAdmin = 1,
}

impl UserRole {
    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Student),
            1 => Some(Self::ClubAdmin),
            _ => None,
        }
    }

    /// Convert to `u8` wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::ClubAdmin => "club_admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "club_admin" => Ok(Self::ClubAdmin),
            other => Err(UnknownValue {
                kind: "user role",
                value: other.to_owned(),
            }),
        }
    }
}

/// Normalize an email address for storage and comparison.
///
/// Emails are compared case-insensitively; surrounding whitespace is ignored.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
