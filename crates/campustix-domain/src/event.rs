//! Event domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownValue;

/// Lifecycle of an event.
///
/// `Upcoming` moves to `Past` (time-driven) or `Cancelled` (explicit).
/// Both of those are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Upcoming,
    Past,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Past => "past",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether consent requests and tickets may still be issued for the event.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Upcoming)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Upcoming, Self::Past) | (Self::Upcoming, Self::Cancelled)
        )
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "past" => Ok(Self::Past),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownValue {
                kind: "event status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Category tag shown on event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    #[default]
    General,
    Tech,
    Cultural,
    Sports,
    Academic,
    Workshop,
}

impl EventCategory {
    pub const ALL: [Self; 6] = [
        Self::General,
        Self::Tech,
        Self::Cultural,
        Self::Sports,
        Self::Academic,
        Self::Workshop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Tech => "tech",
            Self::Cultural => "cultural",
            Self::Sports => "sports",
            Self::Academic => "academic",
            Self::Workshop => "workshop",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownValue {
                kind: "event category",
                value: s.to_owned(),
            })
    }
}
