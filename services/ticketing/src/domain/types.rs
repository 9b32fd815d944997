use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use campustix_domain::consent::{ConsentState, ConsentStatus};
use campustix_domain::event::{EventCategory, EventStatus};
use campustix_domain::id::{ConsentRequestId, EventId, TicketId, UserId};
use campustix_domain::ledger::{Issuance, WalletAddress};
use campustix_domain::ticket::TicketStatus;
use campustix_domain::user::UserRole;

/// Verification token time-to-live in hours.
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// `purpose` claim carried by every verification token.
pub const EMAIL_VERIFICATION_PURPOSE: &str = "email-verification";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Lowercased.
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub wallet_address: Option<WalletAddress>,
    pub department: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub description: String,
    /// Organizer display name.
    pub organizer: String,
    pub organizer_id: UserId,
    pub capacity: u32,
    pub category: EventCategory,
    pub image: Option<String>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            name: self.name.clone(),
            date: self.date,
            time: self.time,
            location: self.location.clone(),
            organizer: self.organizer.clone(),
        }
    }
}

/// Event details rendered into confirmation emails and enriched listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub organizer: String,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub category: Option<EventCategory>,
    pub organizer_id: Option<UserId>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.status.is_none_or(|s| s == event.status)
            && self.category.is_none_or(|c| c == event.category)
            && self.organizer_id.is_none_or(|o| o == event.organizer_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRequest {
    pub id: ConsentRequestId,
    pub event_id: EventId,
    pub student_id: UserId,
    pub requested_at: DateTime<Utc>,
    pub status: ConsentStatus,
    pub email_verified: bool,
    pub blockchain_verified: bool,
    /// The single active verification token.
    pub verification_token: String,
    pub token_expires_at: DateTime<Utc>,
    pub token_consumed_at: Option<DateTime<Utc>>,
    /// Reserved on the first issuance attempt and reused by every retry.
    pub issuance_ticket_id: Option<TicketId>,
    pub updated_at: DateTime<Utc>,
}

impl ConsentRequest {
    /// A fresh request in the `Created` state.
    pub fn new(
        id: ConsentRequestId,
        event_id: EventId,
        student_id: UserId,
        token: String,
        token_expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            event_id,
            student_id,
            requested_at: now,
            status: ConsentStatus::Pending,
            email_verified: false,
            blockchain_verified: false,
            verification_token: token,
            token_expires_at,
            token_consumed_at: None,
            issuance_ticket_id: None,
            updated_at: now,
        }
    }

    pub fn state(&self) -> ConsentState {
        ConsentState::from_flags(self.status, self.email_verified)
    }

    pub fn is_token_consumed(&self) -> bool {
        self.token_consumed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: TicketId,
    pub event_id: EventId,
    pub student_id: UserId,
    pub consent_request_id: ConsentRequestId,
    pub issued_at: DateTime<Utc>,
    pub status: TicketStatus,
    pub qr_reference: String,
    pub issuance: Issuance,
    pub used_at: Option<DateTime<Utc>>,
}

/// Outcome of the atomic approve-and-insert-ticket store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved,
    /// The request was no longer `EmailVerified`.
    NotPending,
    /// An active ticket already exists for the (event, student) pair.
    TicketExists,
    /// Every seat of the event is taken by an active or used ticket.
    EventFull,
}

/// QR payload for a ticket: `<appBaseUrl>/tickets/<ticketId>`.
pub fn qr_reference(app_base_url: &str, ticket_id: TicketId) -> String {
    format!("{}/tickets/{ticket_id}", app_base_url.trim_end_matches('/'))
}

/// Extract the ticket id from a scanned QR payload. Bare ids are accepted.
pub fn parse_qr_reference(value: &str) -> Option<TicketId> {
    let value = value.trim().trim_end_matches('/');
    let id = match value.rsplit_once("/tickets/") {
        Some((_, id)) => id,
        None => value,
    };
    id.parse().ok()
}

/// Parse an event start time: `HH:MM`, `HH:MM:SS` or `H:MM AM/PM`.
pub fn parse_event_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    ["%H:%M", "%H:%M:%S", "%I:%M %p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}
