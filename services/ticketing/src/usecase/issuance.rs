use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use campustix_domain::consent::ConsentState;
use campustix_domain::id::{ConsentRequestId, TicketId, UserId};
use campustix_domain::ledger::{Issuance, WalletAddress};
use campustix_domain::ticket::TicketStatus;

use crate::domain::gateway::{LedgerError, LedgerGateway, NotificationGateway};
use crate::domain::repository::{ConsentRequestRepository, EventRepository, UserRepository};
use crate::domain::types::{ApprovalOutcome, ConsentRequest, Ticket, qr_reference};
use crate::error::TicketingError;
use crate::locks::KeyedLocks;

// ── CompleteIssuance ─────────────────────────────────────────────────────────

pub struct CompleteIssuanceInput {
    pub request_id: ConsentRequestId,
    /// Only the student who received the request may complete it.
    pub student_id: UserId,
    pub wallet_address: Option<String>,
}

#[derive(Debug)]
pub struct CompleteIssuanceOutput {
    pub ticket: Ticket,
    pub confirmation_sent: bool,
}

pub struct CompleteIssuanceUseCase<U, E, C, L, M>
where
    U: UserRepository,
    E: EventRepository,
    C: ConsentRequestRepository,
    L: LedgerGateway,
    M: NotificationGateway,
{
    pub users: U,
    pub events: E,
    pub requests: C,
    pub ledger: L,
    pub mailer: M,
    pub request_locks: KeyedLocks<ConsentRequestId>,
    pub ledger_timeout: Duration,
    pub app_base_url: String,
}

impl<U, E, C, L, M> CompleteIssuanceUseCase<U, E, C, L, M>
where
    U: UserRepository,
    E: EventRepository,
    C: ConsentRequestRepository,
    L: LedgerGateway,
    M: NotificationGateway,
{
    /// Issue the ticket on the ledger and approve the request.
    ///
    /// The request lock is held across the ledger call, so two concurrent
    /// completions of one request issue at most one ticket. A ledger failure
    /// leaves the request `EmailVerified`; the retry reuses the reserved
    /// ticket id as idempotency key.
    pub async fn execute(
        &self,
        input: CompleteIssuanceInput,
    ) -> Result<CompleteIssuanceOutput, TicketingError> {
        let wallet = input
            .wallet_address
            .as_deref()
            .map(WalletAddress::parse)
            .transpose()
            .map_err(|e| TicketingError::invalid_input(e.to_string()))?;

        let _guard = self.request_locks.lock(input.request_id).await;

        let request = self
            .requests
            .find_by_id(input.request_id)
            .await?
            .ok_or(TicketingError::ConsentRequestNotFound)?;
        if request.student_id != input.student_id {
            return Err(TicketingError::Forbidden);
        }
        if request.state() != ConsentState::EmailVerified {
            return Err(TicketingError::RequestNotPending);
        }
        let event = self
            .events
            .find_by_id(request.event_id)
            .await?
            .ok_or(TicketingError::EventNotFound)?;
        if !event.status.is_open() {
            return Err(TicketingError::EventNotOpen);
        }
        let student = self
            .users
            .find_by_id(request.student_id)
            .await?
            .ok_or(TicketingError::UserNotFound)?;

        if let Some(wallet) = &wallet {
            self.users.update_wallet_address(student.id, wallet).await?;
        }

        let ticket_id = self.reserve_ticket_id(&request).await?;

        let attempt = tokio::time::timeout(self.ledger_timeout, self.issue(&request, ticket_id));
        let issuance = match attempt.await {
            Ok(Ok(issuance)) => issuance,
            Ok(Err(e)) => {
                warn!(request_id = %request.id, %ticket_id, error = %e, "ledger issuance failed");
                return Err(TicketingError::IssuanceFailed);
            }
            Err(_) => {
                warn!(
                    request_id = %request.id,
                    %ticket_id,
                    timeout_ms = self.ledger_timeout.as_millis() as u64,
                    "ledger issuance timed out"
                );
                return Err(TicketingError::IssuanceFailed);
            }
        };

        let ticket = Ticket {
            id: ticket_id,
            event_id: request.event_id,
            student_id: request.student_id,
            consent_request_id: request.id,
            issued_at: Utc::now(),
            status: TicketStatus::Active,
            qr_reference: qr_reference(&self.app_base_url, ticket_id),
            issuance,
            used_at: None,
        };
        let outcome = self
            .requests
            .approve_with_ticket(request.id, &ticket, event.capacity)
            .await?;
        match outcome {
            ApprovalOutcome::Approved => {}
            ApprovalOutcome::NotPending => return Err(TicketingError::RequestNotPending),
            ApprovalOutcome::TicketExists => return Err(TicketingError::TicketAlreadyIssued),
            ApprovalOutcome::EventFull => {
                warn!(
                    request_id = %request.id,
                    %ticket_id,
                    capacity = event.capacity,
                    "event filled before approval, issued ticket not recorded"
                );
                return Err(TicketingError::EventFull);
            }
        }
        info!(
            request_id = %request.id,
            ticket_id = %ticket.id,
            issuance = %ticket.issuance.kind(),
            reference = %ticket.issuance.reference(),
            state = %ConsentState::Approved,
            "ticket issued"
        );

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
        }

        Ok(CompleteIssuanceOutput {
            ticket,
            confirmation_sent: delivery.success,
        })
    }

    async fn reserve_ticket_id(
        &self,
        request: &ConsentRequest,
    ) -> Result<TicketId, TicketingError> {
        if let Some(ticket_id) = request.issuance_ticket_id {
            return Ok(ticket_id);
        }
        let ticket_id = TicketId::new();
        if self
            .requests
            .reserve_issuance_ticket_id(request.id, ticket_id)
            .await?
        {
            return Ok(ticket_id);
        }
        // Reserved by another process since the request was loaded.
        self.requests
            .find_by_id(request.id)
            .await?
            .and_then(|r| r.issuance_ticket_id)
            .ok_or(TicketingError::RequestNotPending)
    }

    async fn issue(
        &self,
        request: &ConsentRequest,
        ticket_id: TicketId,
    ) -> Result<Issuance, LedgerError> {
        if let Some(issuance) = self.ledger.lookup_issuance(ticket_id).await? {
            info!(request_id = %request.id, %ticket_id, "reusing recorded issuance");
            return Ok(issuance);
        }
        self.ledger
            .issue_ticket(request.event_id, request.student_id, ticket_id)
            .await
    }
}
