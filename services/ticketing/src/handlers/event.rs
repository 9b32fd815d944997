use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campustix_auth_types::IdentityHeaders;
use campustix_domain::event::{EventCategory, EventStatus};
use campustix_domain::id::{EventId, UserId};

use crate::domain::types::{Event, EventFilter, EventSummary};
use crate::error::TicketingError;
use crate::handlers::require_club_admin;
use crate::state::AppState;
use crate::usecase::event::{
    CancelEventUseCase, CreateEventInput, CreateEventUseCase, GetEventUseCase, ListEventsUseCase,
};

/// Event start times are rendered as `HH:MM`.
pub(crate) fn format_time(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: EventId,
    pub name: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub description: String,
    pub organizer: String,
    pub organizer_id: UserId,
    pub capacity: u32,
    pub category: EventCategory,
    pub image: Option<String>,
    pub status: EventStatus,
    #[serde(serialize_with = "campustix_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            date: event.date,
            time: format_time(&event.time),
            location: event.location,
            description: event.description,
            organizer: event.organizer,
            organizer_id: event.organizer_id,
            capacity: event.capacity,
            category: event.category,
            image: event.image,
            status: event.status,
            created_at: event.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetailsResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub tickets_issued: u64,
    pub seats_left: u64,
}

/// Event fields embedded in consent request and ticket listings.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummaryResponse {
    pub name: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub organizer: String,
}

impl From<EventSummary> for EventSummaryResponse {
    fn from(summary: EventSummary) -> Self {
        Self {
            name: summary.name,
            date: summary.date,
            time: format_time(&summary.time),
            location: summary.location,
            organizer: summary.organizer,
        }
    }
}

// ── POST /events ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub organizer: Option<String>,
    pub capacity: u32,
    #[serde(default)]
    pub category: EventCategory,
    pub image: Option<String>,
}

pub async fn create_event(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), TicketingError> {
    require_club_admin(&identity)?;
    let usecase = CreateEventUseCase {
        users: state.user_repo(),
        events: state.event_repo(),
    };
    let input = CreateEventInput {
        name: body.name,
        date: body.date,
        time: body.time,
        location: body.location,
        description: body.description,
        organizer: body.organizer,
        capacity: body.capacity,
        category: body.category,
        image: body.image,
    };
    let event = usecase.execute(identity.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

// ── GET /events ──────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub organizer_id: Option<Uuid>,
}

impl EventListQuery {
    fn into_filter(self) -> Result<EventFilter, TicketingError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<EventStatus>)
            .transpose()
            .map_err(|e| TicketingError::invalid_input(e.to_string()))?;
        let category = self
            .category
            .as_deref()
            .map(str::parse::<EventCategory>)
            .transpose()
            .map_err(|e| TicketingError::invalid_input(e.to_string()))?;
        Ok(EventFilter {
            status,
            category,
            organizer_id: self.organizer_id.map(UserId),
        })
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<EventResponse>>, TicketingError> {
    let usecase = ListEventsUseCase {
        events: state.event_repo(),
    };
    let events = usecase.execute(query.into_filter()?).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

// ── GET /events/{event_id} ───────────────────────────────────────────────────

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDetailsResponse>, TicketingError> {
    let usecase = GetEventUseCase {
        events: state.event_repo(),
        tickets: state.ticket_repo(),
    };
    let details = usecase.execute(EventId(event_id)).await?;
    let seats_left = details.seats_left();
    Ok(Json(EventDetailsResponse {
        tickets_issued: details.tickets_issued,
        seats_left,
        event: details.event.into(),
    }))
}

// ── POST /events/{event_id}/cancel ───────────────────────────────────────────

pub async fn cancel_event(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<StatusCode, TicketingError> {
    require_club_admin(&identity)?;
    let usecase = CancelEventUseCase {
        events: state.event_repo(),
    };
    usecase.execute(identity.user_id, EventId(event_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
