use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campustix_auth_types::IdentityHeaders;
use campustix_domain::id::{ConsentRequestId, EventId, TicketId, UserId};
use campustix_domain::ledger::{Issuance, IssuanceKind};
use campustix_domain::ticket::TicketStatus;

use crate::domain::types::Ticket;
use crate::error::TicketingError;
use crate::handlers::event::EventSummaryResponse;
use crate::handlers::{require_club_admin, require_student};
use crate::state::AppState;
use crate::usecase::ticket::{
    Actor, GetTicketUseCase, ListStudentTicketsUseCase, RedeemTicketUseCase,
    ResendConfirmationUseCase, TicketView, VerifyTicketUseCase,
};

fn actor(identity: &IdentityHeaders) -> Actor {
    Actor {
        id: identity.user_id,
        role: identity.role,
    }
}

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: TicketId,
    pub event_id: EventId,
    pub student_id: UserId,
    pub consent_request_id: ConsentRequestId,
    #[serde(serialize_with = "campustix_core::serde::to_rfc3339_ms")]
    pub issued_at: DateTime<Utc>,
    pub status: TicketStatus,
    pub qr_reference: String,
    /// `{ "kind": "real" | "simulated", "reference": "0x..." }`
    pub issuance: Issuance,
    #[serde(serialize_with = "campustix_core::serde::to_rfc3339_ms_opt")]
    pub used_at: Option<DateTime<Utc>>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            event_id: ticket.event_id,
            student_id: ticket.student_id,
            consent_request_id: ticket.consent_request_id,
            issued_at: ticket.issued_at,
            status: ticket.status,
            qr_reference: ticket.qr_reference,
            issuance: ticket.issuance,
            used_at: ticket.used_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketWithEventResponse {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub event: EventSummaryResponse,
}

impl From<TicketView> for TicketWithEventResponse {
    fn from(view: TicketView) -> Self {
        Self {
            ticket: view.ticket.into(),
            event: view.event.into(),
        }
    }
}

// ── GET /tickets/@me ─────────────────────────────────────────────────────────

pub async fn list_my_tickets(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<Vec<TicketWithEventResponse>>, TicketingError> {
    require_student(&identity)?;
    let usecase = ListStudentTicketsUseCase {
        events: state.event_repo(),
        tickets: state.ticket_repo(),
    };
    let views = usecase.execute(identity.user_id).await?;
    Ok(Json(
        views.into_iter().map(TicketWithEventResponse::from).collect(),
    ))
}

// ── GET /tickets/{id} ────────────────────────────────────────────────────────

pub async fn get_ticket(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketResponse>, TicketingError> {
    let usecase = GetTicketUseCase {
        tickets: state.ticket_repo(),
    };
    let ticket = usecase.execute(actor(&identity), TicketId(ticket_id)).await?;
    Ok(Json(ticket.into()))
}

// ── GET /tickets/{id}/verification ───────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketVerificationResponse {
    pub ticket_id: TicketId,
    pub reference: String,
    pub kind: IssuanceKind,
    pub valid: bool,
}

pub async fn verify_ticket(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketVerificationResponse>, TicketingError> {
    let usecase = VerifyTicketUseCase {
        tickets: state.ticket_repo(),
        ledger: state.ledger.clone(),
    };
    let verification = usecase.execute(actor(&identity), TicketId(ticket_id)).await?;
    let issuance = &verification.ticket.issuance;
    Ok(Json(TicketVerificationResponse {
        ticket_id: verification.ticket.id,
        reference: issuance.reference().to_string(),
        kind: issuance.kind(),
        valid: verification.valid,
    }))
}

// ── POST /tickets/{id}/confirmation ──────────────────────────────────────────

pub async fn resend_confirmation(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<StatusCode, TicketingError> {
    let usecase = ResendConfirmationUseCase {
        users: state.user_repo(),
        events: state.event_repo(),
        tickets: state.ticket_repo(),
        mailer: state.mailer.clone(),
    };
    usecase.execute(identity.user_id, TicketId(ticket_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /tickets/redeem ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemTicketRequest {
    pub qr_reference: String,
}

pub async fn redeem_ticket(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<RedeemTicketRequest>,
) -> Result<Json<TicketResponse>, TicketingError> {
    require_club_admin(&identity)?;
    let usecase = RedeemTicketUseCase {
        events: state.event_repo(),
        tickets: state.ticket_repo(),
    };
    let ticket = usecase.execute(&body.qr_reference).await?;
    Ok(Json(ticket.into()))
}
