//! Seed file format and loader.
//!
//! A seed file lists user accounts and the events their club administrators
//! organize. Events reference their organizer by email.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;

use campustix_domain::event::EventCategory;
use campustix_domain::user::{UserRole, normalize_email};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub events: Vec<SeedEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub department: Option<String>,
    #[serde(default = "default_verified")]
    pub verified: bool,
}

fn default_verified() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEvent {
    pub name: String,
    pub date: NaiveDate,
    /// `HH:MM`, `HH:MM:SS` or `H:MM AM/PM`.
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    /// Email of the organizing club administrator.
    pub organizer_email: String,
    /// Display name; defaults to the organizer's name.
    pub organizer: Option<String>,
    pub capacity: u32,
    #[serde(default)]
    pub category: EventCategory,
    pub image: Option<String>,
}

impl SeedFile {
    /// Structural checks that do not need the store.
    pub fn validate(&self) -> Result<()> {
        for user in &self.users {
            if !normalize_email(&user.email).contains('@') {
                bail!("user {:?} has a malformed email", user.name);
            }
        }
        for event in &self.events {
            let organizer = normalize_email(&event.organizer_email);
            let declared_non_admin = self
                .users
                .iter()
                .any(|u| normalize_email(&u.email) == organizer && u.role != UserRole::ClubAdmin);
            if declared_non_admin {
                bail!("event {:?} is organized by non-admin {organizer}", event.name);
            }
            if event.capacity == 0 {
                bail!("event {:?} has zero capacity", event.name);
            }
        }
        Ok(())
    }
}

pub fn load(path: &Path) -> Result<SeedFile> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let seed: SeedFile = serde_json::from_str(&content)
        .with_context(|| format!("invalid seed JSON in {}", path.display()))?;
    seed.validate()?;
    Ok(seed)
}
