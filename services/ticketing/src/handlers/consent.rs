use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campustix_auth_types::IdentityHeaders;
use campustix_domain::consent::{ConsentState, ConsentStatus};
use campustix_domain::id::{ConsentRequestId, EventId, UserId};

use crate::error::TicketingError;
use crate::handlers::event::EventSummaryResponse;
use crate::handlers::ticket::TicketResponse;
use crate::handlers::{require_club_admin, require_student};
use crate::state::AppState;
use crate::usecase::consent::{
    ConsentRequestView, ListStudentConsentsUseCase, RejectConsentInput, RejectConsentUseCase,
    RequestConsentInput, RequestConsentUseCase, ResendVerificationUseCase, VerifyEmailUseCase,
};
use crate::usecase::issuance::{CompleteIssuanceInput, CompleteIssuanceUseCase};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRequestResponse {
    pub id: ConsentRequestId,
    pub event_id: EventId,
    pub student_id: UserId,
    #[serde(serialize_with = "campustix_core::serde::to_rfc3339_ms")]
    pub requested_at: DateTime<Utc>,
    pub status: ConsentStatus,
    pub state: ConsentState,
    pub email_verified: bool,
    pub blockchain_verified: bool,
    #[serde(serialize_with = "campustix_core::serde::to_rfc3339_ms")]
    pub token_expires_at: DateTime<Utc>,
    pub event: EventSummaryResponse,
}

impl From<ConsentRequestView> for ConsentRequestResponse {
    fn from(view: ConsentRequestView) -> Self {
        let request = view.request;
        Self {
            id: request.id,
            event_id: request.event_id,
            student_id: request.student_id,
            requested_at: request.requested_at,
            status: request.status,
            state: request.state(),
            email_verified: request.email_verified,
            blockchain_verified: request.blockchain_verified,
            token_expires_at: request.token_expires_at,
            event: view.event.into(),
        }
    }
}

// ── POST /events/{event_id}/consent-requests ─────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsentRequest {
    pub student_id: Option<Uuid>,
    pub student_email: String,
    #[serde(default)]
    pub event_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsentResponse {
    pub request_id: ConsentRequestId,
    pub message_id: Option<String>,
}

pub async fn request_consent(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<CreateConsentRequest>,
) -> Result<(StatusCode, Json<CreateConsentResponse>), TicketingError> {
    require_club_admin(&identity)?;
    let usecase = RequestConsentUseCase {
        users: state.user_repo(),
        events: state.event_repo(),
        requests: state.consent_repo(),
        tickets: state.ticket_repo(),
        mailer: state.mailer.clone(),
        enrollment_locks: state.enrollment_locks.clone(),
        token_secret: state.token_secret.clone(),
        app_base_url: state.app_base_url.clone(),
    };
    let output = usecase
        .execute(RequestConsentInput {
            event_id: EventId(event_id),
            student_id: body.student_id.map(UserId),
            student_email: body.student_email,
            event_name: body.event_name,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateConsentResponse {
            request_id: output.request_id,
            message_id: output.message_id,
        }),
    ))
}

// ── GET /consent-requests/@me ────────────────────────────────────────────────

pub async fn list_my_consent_requests(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<Vec<ConsentRequestResponse>>, TicketingError> {
    require_student(&identity)?;
    let usecase = ListStudentConsentsUseCase {
        events: state.event_repo(),
        requests: state.consent_repo(),
    };
    let views = usecase.execute(identity.user_id).await?;
    Ok(Json(
        views.into_iter().map(ConsentRequestResponse::from).collect(),
    ))
}

// ── POST /consent-requests/verify-email ──────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailResponse {
    pub request_id: ConsentRequestId,
    pub event_id: EventId,
    pub state: ConsentState,
}

/// Public: the token is the credential.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Json<VerifyEmailResponse>, TicketingError> {
    let usecase = VerifyEmailUseCase {
        requests: state.consent_repo(),
        request_locks: state.request_locks.clone(),
        token_secret: state.token_secret.clone(),
    };
    let output = usecase.execute(body.token.trim()).await?;
    Ok(Json(VerifyEmailResponse {
        request_id: output.request_id,
        event_id: output.event_id,
        state: ConsentState::EmailVerified,
    }))
}

// ── POST /consent-requests/{id}/resend ───────────────────────────────────────

pub async fn resend_verification(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<StatusCode, TicketingError> {
    require_club_admin(&identity)?;
    let usecase = ResendVerificationUseCase {
        users: state.user_repo(),
        events: state.event_repo(),
        requests: state.consent_repo(),
        mailer: state.mailer.clone(),
        request_locks: state.request_locks.clone(),
        token_secret: state.token_secret.clone(),
        app_base_url: state.app_base_url.clone(),
    };
    usecase.execute(ConsentRequestId(request_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /consent-requests/{id}/reject ───────────────────────────────────────

pub async fn reject_consent(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<StatusCode, TicketingError> {
    let usecase = RejectConsentUseCase {
        requests: state.consent_repo(),
        request_locks: state.request_locks.clone(),
    };
    usecase
        .execute(RejectConsentInput {
            request_id: ConsentRequestId(request_id),
            actor_id: identity.user_id,
            actor_role: identity.role,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /consent-requests/{id}/complete ─────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompleteIssuanceRequest {
    pub wallet_address: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteIssuanceResponse {
    pub ticket: TicketResponse,
    pub confirmation_sent: bool,
}

pub async fn complete_issuance(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<CompleteIssuanceRequest>,
) -> Result<(StatusCode, Json<CompleteIssuanceResponse>), TicketingError> {
    require_student(&identity)?;
    let usecase = CompleteIssuanceUseCase {
        users: state.user_repo(),
        events: state.event_repo(),
        requests: state.consent_repo(),
        ledger: state.ledger.clone(),
        mailer: state.mailer.clone(),
        request_locks: state.request_locks.clone(),
        ledger_timeout: state.ledger_timeout,
        app_base_url: state.app_base_url.clone(),
    };
    let output = usecase
        .execute(CompleteIssuanceInput {
            request_id: ConsentRequestId(request_id),
            student_id: identity.user_id,
            wallet_address: body.wallet_address,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CompleteIssuanceResponse {
            ticket: output.ticket.into(),
            confirmation_sent: output.confirmation_sent,
        }),
    ))
}
