//! Seed tool: provisions user accounts and events from a JSON file.
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/campustix \
//!     cargo run -p campustix-seed -- --migrate tools/seed/fixtures/dev.json
//! ```
//!
//! Users are matched by email and events by (organizer, name, date); existing
//! rows are left untouched, so re-running a seed file is harmless.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use sea_orm::Database;
use tracing::info;

use campustix_core::tracing::init_tracing;
use campustix_domain::id::UserId;
use campustix_domain::user::{UserRole, normalize_email};
use campustix_ticketing::domain::repository::{EventRepository, UserRepository};
use campustix_ticketing::domain::types::{EventFilter, User};
use campustix_ticketing::infra::db::{DbEventRepository, DbUserRepository};
use campustix_ticketing::usecase::event::{CreateEventInput, CreateEventUseCase};
use campustix_ticketing_migration::{Migrator, MigratorTrait};

mod fixture;

use fixture::{SeedEvent, SeedFile, SeedUser};

#[derive(Parser)]
#[command(about = "Provision users and events for the ticketing service")]
struct Args {
    /// Seed file (JSON with `users` and `events` arrays)
    path: PathBuf,

    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Apply pending migrations before seeding
    #[arg(long)]
    migrate: bool,
}

#[derive(Debug, Default)]
struct Summary {
    users_created: usize,
    users_skipped: usize,
    events_created: usize,
    events_skipped: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let seed = fixture::load(&args.path)?;
    let db = Database::connect(&args.database_url)
        .await
        .context("failed to connect to database")?;
    if args.migrate {
        Migrator::up(&db, None)
            .await
            .context("failed to apply migrations")?;
    }

    let users = DbUserRepository { db: db.clone() };
    let events = DbEventRepository { db };
    let summary = apply(&seed, &users, &events).await?;

    info!(
        users_created = summary.users_created,
        users_skipped = summary.users_skipped,
        events_created = summary.events_created,
        events_skipped = summary.events_skipped,
        "seed applied"
    );
    Ok(())
}

async fn apply<U, E>(seed: &SeedFile, users: &U, events: &E) -> Result<Summary>
where
    U: UserRepository + Clone,
    E: EventRepository + Clone,
{
    let mut summary = Summary::default();
    for user in &seed.users {
        if seed_user(users, user).await? {
            summary.users_created += 1;
        } else {
            summary.users_skipped += 1;
        }
    }
    for event in &seed.events {
        if seed_event(users, events, event).await? {
            summary.events_created += 1;
        } else {
            summary.events_skipped += 1;
        }
    }
    Ok(summary)
}

async fn seed_user<U: UserRepository>(users: &U, seed: &SeedUser) -> Result<bool> {
    let email = normalize_email(&seed.email);
    if users.find_by_email(&email).await?.is_some() {
        info!(%email, "user exists, skipping");
        return Ok(false);
    }
    let user = User {
        id: UserId::new(),
        email,
        name: seed.name.trim().to_owned(),
        role: seed.role,
        wallet_address: None,
        department: seed.department.clone(),
        verified: seed.verified,
        created_at: Utc::now(),
    };
    users
        .create(&user)
        .await
        .with_context(|| format!("create user {}", user.email))?;
    info!(user_id = %user.id, email = %user.email, role = %user.role, "user created");
    Ok(true)
}

async fn seed_event<U, E>(users: &U, events: &E, seed: &SeedEvent) -> Result<bool>
where
    U: UserRepository + Clone,
    E: EventRepository + Clone,
{
    let organizer_email = normalize_email(&seed.organizer_email);
    let organizer = users
        .find_by_email(&organizer_email)
        .await?
        .with_context(|| format!("organizer {organizer_email} of {:?} not found", seed.name))?;
    if organizer.role != UserRole::ClubAdmin {
        anyhow::bail!("organizer {organizer_email} is not a club admin");
    }

    let existing = events
        .list(&EventFilter {
            organizer_id: Some(organizer.id),
            ..Default::default()
        })
        .await?;
    if existing
        .iter()
        .any(|e| e.name == seed.name.trim() && e.date == seed.date)
    {
        info!(name = %seed.name, date = %seed.date, "event exists, skipping");
        return Ok(false);
    }

    let usecase = CreateEventUseCase {
        users: users.clone(),
        events: events.clone(),
    };
    let input = CreateEventInput {
        name: seed.name.clone(),
        date: seed.date,
        time: seed.time.clone(),
        location: seed.location.clone(),
        description: seed.description.clone(),
        organizer: seed.organizer.clone(),
        capacity: seed.capacity,
        category: seed.category,
        image: seed.image.clone(),
    };
    usecase
        .execute(organizer.id, input)
        .await
        .with_context(|| format!("create event {:?}", seed.name))?;
    Ok(true)
}
