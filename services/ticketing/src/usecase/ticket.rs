use std::collections::HashMap;

use anyhow::Context as _;
use tracing::{info, warn};

use campustix_domain::event::EventStatus;
use campustix_domain::id::{EventId, TicketId, UserId};
use campustix_domain::user::UserRole;

use crate::domain::gateway::{LedgerGateway, NotificationGateway};
use crate::domain::repository::{EventRepository, TicketRepository, UserRepository};
use crate::domain::types::{EventSummary, Ticket, parse_qr_reference};
use crate::error::TicketingError;

/// Caller of a ticket operation, as identified by the gateway.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: UserId,
    pub role: UserRole,
}

impl Actor {
    fn can_view(&self, ticket: &Ticket) -> bool {
        self.role == UserRole::ClubAdmin || ticket.student_id == self.id
    }
}

async fn load_visible<T: TicketRepository>(
    tickets: &T,
    actor: Actor,
    ticket_id: TicketId,
) -> Result<Ticket, TicketingError> {
    let ticket = tickets
        .find_by_id(ticket_id)
        .await?
        .ok_or(TicketingError::TicketNotFound)?;
    if !actor.can_view(&ticket) {
        return Err(TicketingError::Forbidden);
    }
    Ok(ticket)
}

// ── ListStudentTickets ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TicketView {
    pub ticket: Ticket,
    pub event: EventSummary,
}

pub struct ListStudentTicketsUseCase<E: EventRepository, T: TicketRepository> {
    pub events: E,
    pub tickets: T,
}

impl<E: EventRepository, T: TicketRepository> ListStudentTicketsUseCase<E, T> {
    pub async fn execute(&self, student_id: UserId) -> Result<Vec<TicketView>, TicketingError> {
        let tickets = self.tickets.list_by_student(student_id).await?;
        let mut summaries: HashMap<EventId, EventSummary> = HashMap::new();
        let mut views = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let event = match summaries.get(&ticket.event_id) {
                Some(summary) => summary.clone(),
                None => {
                    let summary = self
                        .events
                        .find_by_id(ticket.event_id)
                        .await?
                        .with_context(|| {
                            format!("ticket {} references a missing event", ticket.id)
                        })?
                        .summary();
                    summaries.insert(ticket.event_id, summary.clone());
                    summary
                }
            };
            views.push(TicketView { ticket, event });
        }
        Ok(views)
    }
}

// ── GetTicket ────────────────────────────────────────────────────────────────

pub struct GetTicketUseCase<T: TicketRepository> {
    pub tickets: T,
}

impl<T: TicketRepository> GetTicketUseCase<T> {
    pub async fn execute(
        &self,
        actor: Actor,
        ticket_id: TicketId,
    ) -> Result<Ticket, TicketingError> {
        load_visible(&self.tickets, actor, ticket_id).await
    }
}

// ── VerifyTicket ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct TicketVerification {
    pub ticket: Ticket,
    pub valid: bool,
}

pub struct VerifyTicketUseCase<T: TicketRepository, L: LedgerGateway> {
    pub tickets: T,
    pub ledger: L,
}

impl<T: TicketRepository, L: LedgerGateway> VerifyTicketUseCase<T, L> {
    /// Check the stored transaction reference against the ledger.
    pub async fn execute(
        &self,
        actor: Actor,
        ticket_id: TicketId,
    ) -> Result<TicketVerification, TicketingError> {
        let ticket = load_visible(&self.tickets, actor, ticket_id).await?;
        let valid = self
            .ledger
            .verify_ticket(ticket.id, ticket.issuance.reference().as_str())
            .await;
        if !valid {
            warn!(ticket_id = %ticket.id, "ledger did not confirm ticket reference");
        }
        Ok(TicketVerification { ticket, valid })
    }
}

// ── RedeemTicket ─────────────────────────────────────────────────────────────

pub struct RedeemTicketUseCase<E, T>
where
    E: EventRepository,
    T: TicketRepository,
{
    pub events: E,
    pub tickets: T,
}

impl<E, T> RedeemTicketUseCase<E, T>
where
    E: EventRepository,
    T: TicketRepository,
{
    /// Admit the holder: `active → used`. A ticket redeems once, and never
    /// for a cancelled event.
    pub async fn execute(&self, qr_reference: &str) -> Result<Ticket, TicketingError> {
        let ticket_id = parse_qr_reference(qr_reference)
            .ok_or_else(|| TicketingError::invalid_input("unrecognized QR reference"))?;
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketingError::TicketNotFound)?;
        let event = self
            .events
            .find_by_id(ticket.event_id)
            .await?
            .ok_or(TicketingError::EventNotFound)?;
        if event.status == EventStatus::Cancelled {
            return Err(TicketingError::EventNotOpen);
        }
        if !self.tickets.mark_used(ticket.id).await? {
            return Err(TicketingError::TicketNotActive);
        }
        info!(ticket_id = %ticket.id, event_id = %ticket.event_id, "ticket redeemed");
        self.tickets
            .find_by_id(ticket.id)
            .await?
            .ok_or(TicketingError::TicketNotFound)
    }
}

// ── ResendConfirmation ───────────────────────────────────────────────────────

pub struct ResendConfirmationUseCase<U, E, T, M>
where
    U: UserRepository,
    E: EventRepository,
    T: TicketRepository,
    M: NotificationGateway,
{
    pub users: U,
    pub events: E,
    pub tickets: T,
    pub mailer: M,
}

impl<U, E, T, M> ResendConfirmationUseCase<U, E, T, M>
where
    U: UserRepository,
    E: EventRepository,
    T: TicketRepository,
    M: NotificationGateway,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        ticket_id: TicketId,
    ) -> Result<(), TicketingError> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketingError::TicketNotFound)?;
        if ticket.student_id != actor_id {
            return Err(TicketingError::Forbidden);
        }
        let event = self
            .events
            .find_by_id(ticket.event_id)
            .await?
            .ok_or(TicketingError::EventNotFound)?;
        let student = self
            .users
            .find_by_id(ticket.student_id)
            .await?
            .ok_or(TicketingError::UserNotFound)?;

        let delivery = self
            .mailer
            .send_ticket_confirmation(
                &student.email,
                &event.summary(),
                ticket.id,
                &ticket.qr_reference,
            )
            .await;
        if !delivery.success {
            warn!(
                ticket_id = %ticket.id,
                error = delivery.error.as_deref().unwrap_or_default(),
                "ticket confirmation not delivered"
            );
            return Err(TicketingError::DeliveryFailed);
        }
        Ok(())
    }
}
