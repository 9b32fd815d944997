use chrono::{NaiveDate, Utc};
use tracing::info;

use campustix_domain::event::{EventCategory, EventStatus};
use campustix_domain::id::{EventId, UserId};
use campustix_domain::user::UserRole;

use crate::domain::repository::{EventRepository, TicketRepository, UserRepository};
use crate::domain::types::{Event, EventFilter, parse_event_time};
use crate::error::TicketingError;

/// Largest capacity the events table can store.
pub const MAX_CAPACITY: u32 = i32::MAX as u32;

fn required(value: String, field: &str) -> Result<String, TicketingError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TicketingError::invalid_input(format!("{field} is required")));
    }
    Ok(value.to_owned())
}

// ── CreateEvent ──────────────────────────────────────────────────────────────

pub struct CreateEventInput {
    pub name: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub description: String,
    /// Display name; defaults to the admin's name.
    pub organizer: Option<String>,
    pub capacity: u32,
    pub category: EventCategory,
    pub image: Option<String>,
}

pub struct CreateEventUseCase<U: UserRepository, E: EventRepository> {
    pub users: U,
    pub events: E,
}

impl<U: UserRepository, E: EventRepository> CreateEventUseCase<U, E> {
    pub async fn execute(
        &self,
        organizer_id: UserId,
        input: CreateEventInput,
    ) -> Result<Event, TicketingError> {
        let admin = self
            .users
            .find_by_id(organizer_id)
            .await?
            .ok_or(TicketingError::UserNotFound)?;
        if admin.role != UserRole::ClubAdmin {
            return Err(TicketingError::Forbidden);
        }

        let name = required(input.name, "name")?;
        let location = required(input.location, "location")?;
        let organizer = required(input.organizer.unwrap_or(admin.name), "organizer")?;
        let time = parse_event_time(&input.time)
            .ok_or_else(|| TicketingError::invalid_input(format!("bad time {}", input.time)))?;
        if input.capacity == 0 || input.capacity > MAX_CAPACITY {
            return Err(TicketingError::invalid_input(format!(
                "capacity must be between 1 and {MAX_CAPACITY}"
            )));
        }

        let event = Event {
            id: EventId::new(),
            name,
            date: input.date,
            time,
            location,
            description: input.description.trim().to_owned(),
            organizer,
            organizer_id: admin.id,
            capacity: input.capacity,
            category: input.category,
            image: input.image.filter(|i| !i.trim().is_empty()),
            status: EventStatus::Upcoming,
            created_at: Utc::now(),
        };
        self.events.create(&event).await?;
        info!(event_id = %event.id, organizer_id = %admin.id, "event created");
        Ok(event)
    }
}

// ── ListEvents ───────────────────────────────────────────────────────────────

pub struct ListEventsUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> ListEventsUseCase<E> {
    pub async fn execute(&self, filter: EventFilter) -> Result<Vec<Event>, TicketingError> {
        self.events.list(&filter).await
    }
}

// ── GetEvent ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct EventDetails {
    pub event: Event,
    pub tickets_issued: u64,
}

impl EventDetails {
    pub fn seats_left(&self) -> u64 {
        u64::from(self.event.capacity).saturating_sub(self.tickets_issued)
    }
}

pub struct GetEventUseCase<E: EventRepository, T: TicketRepository> {
    pub events: E,
    pub tickets: T,
}

impl<E: EventRepository, T: TicketRepository> GetEventUseCase<E, T> {
    pub async fn execute(&self, event_id: EventId) -> Result<EventDetails, TicketingError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(TicketingError::EventNotFound)?;
        let tickets_issued = self.tickets.count_issued(event.id).await?;
        Ok(EventDetails {
            event,
            tickets_issued,
        })
    }
}

// ── CancelEvent ──────────────────────────────────────────────────────────────

pub struct CancelEventUseCase<E: EventRepository> {
    pub events: E,
}

impl<E: EventRepository> CancelEventUseCase<E> {
    pub async fn execute(
        &self,
        actor_id: UserId,
        event_id: EventId,
    ) -> Result<(), TicketingError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(TicketingError::EventNotFound)?;
        if event.organizer_id != actor_id {
            return Err(TicketingError::Forbidden);
        }
        let cancelled = self
            .events
            .update_status(event.id, EventStatus::Upcoming, EventStatus::Cancelled)
            .await?;
        if !cancelled {
            return Err(TicketingError::EventNotOpen);
        }
        info!(event_id = %event.id, "event cancelled");
        Ok(())
    }
}
