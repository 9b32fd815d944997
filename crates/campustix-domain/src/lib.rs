//! Domain types shared across Campustix crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers of services and in tools.

pub mod consent;
pub mod event;
pub mod id;
pub mod ledger;
pub mod ticket;
pub mod user;

/// Error returned when parsing a stored or wire string into a domain enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}
