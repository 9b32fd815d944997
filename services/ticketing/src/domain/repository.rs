#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use campustix_domain::event::EventStatus;
use campustix_domain::id::{ConsentRequestId, EventId, TicketId, UserId};
use campustix_domain::ledger::WalletAddress;

use crate::domain::types::{
    ApprovalOutcome, ConsentRequest, Event, EventFilter, Ticket, User,
};
use crate::error::TicketingError;

// Conditional mutations return `true` when a row changed. `false` means the
// guard did not hold (a concurrent writer won, or the state moved on).

pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, TicketingError>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, TicketingError>;

    async fn create(&self, user: &User) -> Result<(), TicketingError>;

    async fn update_wallet_address(
        &self,
        id: UserId,
        address: &WalletAddress,
    ) -> Result<(), TicketingError>;
}

pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, TicketingError>;

    /// Ordered by date, then time.
    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, TicketingError>;

    async fn create(&self, event: &Event) -> Result<(), TicketingError>;

    async fn update_status(
        &self,
        id: EventId,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<bool, TicketingError>;
}

pub trait ConsentRequestRepository: Send + Sync {
    async fn create(&self, request: &ConsentRequest) -> Result<(), TicketingError>;

    async fn find_by_id(
        &self,
        id: ConsentRequestId,
    ) -> Result<Option<ConsentRequest>, TicketingError>;

    /// Newest first.
    async fn list_by_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<ConsentRequest>, TicketingError>;

    async fn list_by_event(&self, event_id: EventId)
    -> Result<Vec<ConsentRequest>, TicketingError>;

    /// The pending request for the pair, if any.
    async fn find_open(
        &self,
        event_id: EventId,
        student_id: UserId,
    ) -> Result<Option<ConsentRequest>, TicketingError>;

    /// Consume `token`: only while it is the stored, unconsumed token of a
    /// pending request whose email is not yet verified.
    async fn mark_email_verified(
        &self,
        id: ConsentRequestId,
        token: &str,
    ) -> Result<bool, TicketingError>;

    /// Replace the active token. Only while the request is `Created`.
    async fn replace_token(
        &self,
        id: ConsentRequestId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, TicketingError>;

    /// Set the issuance idempotency key. Only when none is reserved yet.
    async fn reserve_issuance_ticket_id(
        &self,
        id: ConsentRequestId,
        ticket_id: TicketId,
    ) -> Result<bool, TicketingError>;

    /// Only while the request is pending.
    async fn reject(&self, id: ConsentRequestId) -> Result<bool, TicketingError>;

    /// In one transaction: move the request from `EmailVerified` to approved
    /// (blockchain verified) and insert the ticket. Refused once the event
    /// holds `capacity` issued tickets; approvals for one event serialize on
    /// the event row.
    async fn approve_with_ticket(
        &self,
        id: ConsentRequestId,
        ticket: &Ticket,
        capacity: u32,
    ) -> Result<ApprovalOutcome, TicketingError>;
}

pub trait TicketRepository: Send + Sync {
    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, TicketingError>;

    /// Newest first.
    async fn list_by_student(&self, student_id: UserId) -> Result<Vec<Ticket>, TicketingError>;

    async fn find_active(
        &self,
        event_id: EventId,
        student_id: UserId,
    ) -> Result<Option<Ticket>, TicketingError>;

    /// Tickets issued for the event that still hold a seat (active or used).
    async fn count_issued(&self, event_id: EventId) -> Result<u64, TicketingError>;

    /// `active → used`.
    async fn mark_used(&self, id: TicketId) -> Result<bool, TicketingError>;
}
