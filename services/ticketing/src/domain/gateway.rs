#![allow(async_fn_in_trait)]

use campustix_domain::id::{EventId, TicketId, UserId};
use campustix_domain::ledger::{Issuance, WalletAddress};

use crate::domain::types::EventSummary;

/// Outcome of a single email delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn delivered(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.to_string()),
        }
    }
}

/// Outbound email. Implementations never fail; a failed delivery is
/// reported through `DeliveryResult::success`.
pub trait NotificationGateway: Send + Sync {
    async fn send_verification_email(
        &self,
        to: &str,
        subject: &str,
        verification_url: &str,
        event_name: &str,
    ) -> DeliveryResult;

    async fn send_ticket_confirmation(
        &self,
        to: &str,
        event: &EventSummary,
        ticket_id: TicketId,
        qr_reference: &str,
    ) -> DeliveryResult;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger request timed out")]
    Timeout,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("ledger rejected the request: {0}")]
    Rejected(String),
    #[error("malformed ledger response: {0}")]
    InvalidResponse(String),
}

/// Ticket issuance ledger.
pub trait LedgerGateway: Send + Sync {
    /// `None` when no account is available or the user refused.
    async fn connect_wallet(&self) -> Option<WalletAddress>;

    async fn sign_message(&self, message: &str, address: &WalletAddress) -> Option<String>;

    /// Probe for an issuance already recorded under `ticket_id`.
    async fn lookup_issuance(&self, ticket_id: TicketId) -> Result<Option<Issuance>, LedgerError>;

    /// `ticket_id` is the idempotency key: repeating the call for the same
    /// ticket must not issue twice.
    async fn issue_ticket(
        &self,
        event_id: EventId,
        student_id: UserId,
        ticket_id: TicketId,
    ) -> Result<Issuance, LedgerError>;

    /// `false` for unknown tickets and malformed references.
    async fn verify_ticket(&self, ticket_id: TicketId, reference: &str) -> bool;
}
