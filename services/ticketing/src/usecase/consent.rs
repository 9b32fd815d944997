use std::collections::HashMap;

use anyhow::Context as _;
use tracing::{info, warn};
use url::Url;
use validator::ValidateEmail;

use campustix_domain::consent::ConsentState;
use campustix_domain::id::{ConsentRequestId, EventId, UserId};
use campustix_domain::user::{UserRole, normalize_email};

use crate::domain::gateway::NotificationGateway;
use crate::domain::repository::{
    ConsentRequestRepository, EventRepository, TicketRepository, UserRepository,
};
use crate::domain::types::{ConsentRequest, EventSummary};
use crate::error::TicketingError;
use crate::locks::KeyedLocks;
use crate::usecase::token::{issue_verification_token, validate_verification_token};

/// `<appBaseUrl>/verify-email?token=<token>`, with the token query-encoded.
pub fn verification_url(app_base_url: &str, token: &str) -> Result<String, TicketingError> {
    let base = format!("{}/verify-email", app_base_url.trim_end_matches('/'));
    let mut url = Url::parse(&base).with_context(|| format!("invalid app base url {base}"))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.into())
}

pub fn consent_subject(event_name: &str) -> String {
    format!("Ticket Consent Request for {event_name}")
}

// ── RequestConsent ───────────────────────────────────────────────────────────

pub struct RequestConsentInput {
    pub event_id: EventId,
    /// Resolved from `student_email` when absent.
    pub student_id: Option<UserId>,
    pub student_email: String,
    /// Subject line name; empty means the event's own name.
    pub event_name: String,
}

#[derive(Debug)]
pub struct RequestConsentOutput {
    pub request_id: ConsentRequestId,
    pub message_id: Option<String>,
}

pub struct RequestConsentUseCase<U, E, C, T, M>
where
    U: UserRepository,
    E: EventRepository,
    C: ConsentRequestRepository,
    T: TicketRepository,
    M: NotificationGateway,
{
    pub users: U,
    pub events: E,
    pub requests: C,
    pub tickets: T,
    pub mailer: M,
    pub enrollment_locks: KeyedLocks<(EventId, UserId)>,
    pub token_secret: String,
    pub app_base_url: String,
}

impl<U, E, C, T, M> RequestConsentUseCase<U, E, C, T, M>
where
    U: UserRepository,
    E: EventRepository,
    C: ConsentRequestRepository,
    T: TicketRepository,
    M: NotificationGateway,
{
    pub async fn execute(
        &self,
        input: RequestConsentInput,
    ) -> Result<RequestConsentOutput, TicketingError> {
        let email = normalize_email(&input.student_email);
        if !email.validate_email() {
            return Err(TicketingError::invalid_input("malformed student email"));
        }

        let event = self
            .events
            .find_by_id(input.event_id)
            .await?
            .ok_or(TicketingError::EventNotFound)?;
        if !event.status.is_open() {
            return Err(TicketingError::EventNotOpen);
        }

        let student = match input.student_id {
            Some(id) => self.users.find_by_id(id).await?,
            None => self.users.find_by_email(&email).await?,
        }
        .ok_or(TicketingError::UserNotFound)?;
        if student.role != UserRole::Student {
            return Err(TicketingError::invalid_input("user is not a student"));
        }
        if student.email != email {
            return Err(TicketingError::invalid_input(
                "email does not match the student's account",
            ));
        }

        let _guard = self.enrollment_locks.lock((event.id, student.id)).await;

        if self.requests.find_open(event.id, student.id).await?.is_some()
            || self.tickets.find_active(event.id, student.id).await?.is_some()
        {
            return Err(TicketingError::ConsentAlreadyExists);
        }
        if self.tickets.count_issued(event.id).await? >= u64::from(event.capacity) {
            return Err(TicketingError::EventFull);
        }

        let request_id = ConsentRequestId::new();
        let issued =
            issue_verification_token(&student.email, request_id, event.id, &self.token_secret)?;
        let request = ConsentRequest::new(
            request_id,
            event.id,
            student.id,
            issued.token.clone(),
            issued.expires_at,
        );
        self.requests.create(&request).await?;
        info!(
            request_id = %request_id,
            event_id = %event.id,
            student_id = %student.id,
            state = %ConsentState::Created,
            "consent request created"
        );

        let event_name = if input.event_name.trim().is_empty() {
            event.name.clone()
        } else {
            input.event_name.trim().to_owned()
        };
        let url = verification_url(&self.app_base_url, &issued.token)?;
        let delivery = self
            .mailer
            .send_verification_email(
                &student.email,
                &consent_subject(&event_name),
                &url,
                &event_name,
            )
            .await;
        if !delivery.success {
            warn!(
                request_id = %request_id,
                error = delivery.error.as_deref().unwrap_or_default(),
                "verification email not delivered"
            );
            return Err(TicketingError::DeliveryFailed);
        }

        Ok(RequestConsentOutput {
            request_id,
            message_id: delivery.message_id,
        })
    }
}

// ── ResendVerification ───────────────────────────────────────────────────────

pub struct ResendVerificationUseCase<U, E, C, M>
where
    U: UserRepository,
    E: EventRepository,
    C: ConsentRequestRepository,
    M: NotificationGateway,
{
    pub users: U,
    pub events: E,
    pub requests: C,
    pub mailer: M,
    pub request_locks: KeyedLocks<ConsentRequestId>,
    pub token_secret: String,
    pub app_base_url: String,
}

impl<U, E, C, M> ResendVerificationUseCase<U, E, C, M>
where
    U: UserRepository,
    E: EventRepository,
    C: ConsentRequestRepository,
    M: NotificationGateway,
{
    /// Mint a fresh token, replacing the stored one, and mail it again.
    pub async fn execute(&self, request_id: ConsentRequestId) -> Result<(), TicketingError> {
        let _guard = self.request_locks.lock(request_id).await;

        let request = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(TicketingError::ConsentRequestNotFound)?;
        if request.state() != ConsentState::Created {
            return Err(TicketingError::RequestNotPending);
        }
        let event = self
            .events
            .find_by_id(request.event_id)
            .await?
            .ok_or(TicketingError::EventNotFound)?;
        let student = self
            .users
            .find_by_id(request.student_id)
            .await?
            .ok_or(TicketingError::UserNotFound)?;

        let issued =
            issue_verification_token(&student.email, request.id, event.id, &self.token_secret)?;
        if !self
            .requests
            .replace_token(request.id, &issued.token, issued.expires_at)
            .await?
        {
            return Err(TicketingError::RequestNotPending);
        }
        info!(request_id = %request.id, "verification token replaced");

        let url = verification_url(&self.app_base_url, &issued.token)?;
        let delivery = self
            .mailer
            .send_verification_email(
                &student.email,
                &consent_subject(&event.name),
                &url,
                &event.name,
            )
            .await;
        if !delivery.success {
            warn!(
                request_id = %request.id,
                error = delivery.error.as_deref().unwrap_or_default(),
                "verification email not delivered"
            );
            return Err(TicketingError::DeliveryFailed);
        }
        Ok(())
    }
}

// ── VerifyEmail ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct VerifyEmailOutput {
    pub request_id: ConsentRequestId,
    pub event_id: EventId,
}

pub struct VerifyEmailUseCase<C: ConsentRequestRepository> {
    pub requests: C,
    pub request_locks: KeyedLocks<ConsentRequestId>,
    pub token_secret: String,
}

impl<C: ConsentRequestRepository> VerifyEmailUseCase<C> {
    /// Consume a verification token. Each token verifies at most once.
    pub async fn execute(&self, token: &str) -> Result<VerifyEmailOutput, TicketingError> {
        let claims = validate_verification_token(token, &self.token_secret)?;
        let _guard = self.request_locks.lock(claims.request_id).await;

        let request = self
            .requests
            .find_by_id(claims.request_id)
            .await?
            .ok_or(TicketingError::ConsentRequestNotFound)?;
        if request.event_id != claims.event_id {
            return Err(TicketingError::InvalidToken);
        }
        if request.verification_token != token {
            // Superseded by a resend.
            return Err(TicketingError::InvalidToken);
        }
        if request.is_token_consumed() {
            return Err(TicketingError::AlreadyConsumed);
        }
        if request.state() != ConsentState::Created {
            return Err(TicketingError::RequestNotPending);
        }
        if !self.requests.mark_email_verified(request.id, token).await? {
            return Err(TicketingError::AlreadyConsumed);
        }
        info!(
            request_id = %request.id,
            event_id = %request.event_id,
            state = %ConsentState::EmailVerified,
            "email verified"
        );
        Ok(VerifyEmailOutput {
            request_id: request.id,
            event_id: request.event_id,
        })
    }
}

// ── RejectConsent ────────────────────────────────────────────────────────────

pub struct RejectConsentInput {
    pub request_id: ConsentRequestId,
    pub actor_id: UserId,
    pub actor_role: UserRole,
}

pub struct RejectConsentUseCase<C: ConsentRequestRepository> {
    pub requests: C,
    pub request_locks: KeyedLocks<ConsentRequestId>,
}

impl<C: ConsentRequestRepository> RejectConsentUseCase<C> {
    /// Rejecting an already rejected request succeeds without change.
    pub async fn execute(&self, input: RejectConsentInput) -> Result<(), TicketingError> {
        let _guard = self.request_locks.lock(input.request_id).await;

        let request = self
            .requests
            .find_by_id(input.request_id)
            .await?
            .ok_or(TicketingError::ConsentRequestNotFound)?;
        if input.actor_role == UserRole::Student && request.student_id != input.actor_id {
            return Err(TicketingError::Forbidden);
        }

        match request.state() {
            ConsentState::Rejected => return Ok(()),
            ConsentState::Approved => return Err(TicketingError::RequestNotPending),
            ConsentState::Created | ConsentState::EmailVerified => {}
        }

        if !self.requests.reject(request.id).await? {
            // Lost to a writer outside this process.
            let current = self
                .requests
                .find_by_id(request.id)
                .await?
                .ok_or(TicketingError::ConsentRequestNotFound)?;
            if current.state() != ConsentState::Rejected {
                return Err(TicketingError::RequestNotPending);
            }
            return Ok(());
        }
        info!(
            request_id = %request.id,
            from = %request.state(),
            state = %ConsentState::Rejected,
            "consent request rejected"
        );
        Ok(())
    }
}

// ── ListStudentConsents ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConsentRequestView {
    pub request: ConsentRequest,
    pub event: EventSummary,
}

pub struct ListStudentConsentsUseCase<E, C>
where
    E: EventRepository,
    C: ConsentRequestRepository,
{
    pub events: E,
    pub requests: C,
}

impl<E, C> ListStudentConsentsUseCase<E, C>
where
    E: EventRepository,
    C: ConsentRequestRepository,
{
    pub async fn execute(
        &self,
        student_id: UserId,
    ) -> Result<Vec<ConsentRequestView>, TicketingError> {
        let requests = self.requests.list_by_student(student_id).await?;
        let mut summaries: HashMap<EventId, EventSummary> = HashMap::new();
        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            let event = match summaries.get(&request.event_id) {
                Some(summary) => summary.clone(),
                None => {
                    let event = self
                        .events
                        .find_by_id(request.event_id)
                        .await?
                        .with_context(|| {
                            format!("consent request {} references a missing event", request.id)
                        })?;
                    let summary = event.summary();
                    summaries.insert(event.id, summary.clone());
                    summary
                }
            };
            views.push(ConsentRequestView { request, event });
        }
        Ok(views)
    }
}
