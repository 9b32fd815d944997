use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Ticketing service error variants.
#[derive(Debug, thiserror::Error)]
pub enum TicketingError {
    #[error("user not found")]
    UserNotFound,
    #[error("event not found")]
    EventNotFound,
    #[error("consent request not found")]
    ConsentRequestNotFound,
    #[error("ticket not found")]
    TicketNotFound,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("token already consumed")]
    AlreadyConsumed,
    #[error("consent request is not pending")]
    RequestNotPending,
    #[error("consent request already exists")]
    ConsentAlreadyExists,
    #[error("ticket already issued")]
    TicketAlreadyIssued,
    #[error("ticket is not active")]
    TicketNotActive,
    #[error("event is not open")]
    EventNotOpen,
    #[error("event is full")]
    EventFull,
    #[error("email delivery failed")]
    DeliveryFailed,
    #[error("ticket issuance failed")]
    IssuanceFailed,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("forbidden")]
    Forbidden,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl TicketingError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::ConsentRequestNotFound => "CONSENT_REQUEST_NOT_FOUND",
            Self::TicketNotFound => "TICKET_NOT_FOUND",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::AlreadyConsumed => "ALREADY_CONSUMED",
            Self::RequestNotPending => "REQUEST_NOT_PENDING",
            Self::ConsentAlreadyExists => "CONSENT_ALREADY_EXISTS",
            Self::TicketAlreadyIssued => "TICKET_ALREADY_ISSUED",
            Self::TicketNotActive => "TICKET_NOT_ACTIVE",
            Self::EventNotOpen => "EVENT_NOT_OPEN",
            Self::EventFull => "EVENT_FULL",
            Self::DeliveryFailed => "DELIVERY_FAILED",
            Self::IssuanceFailed => "ISSUANCE_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Forbidden => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UserNotFound
            | Self::EventNotFound
            | Self::ConsentRequestNotFound
            | Self::TicketNotFound => StatusCode::NOT_FOUND,
            Self::InvalidToken | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::AlreadyConsumed
            | Self::RequestNotPending
            | Self::ConsentAlreadyExists
            | Self::TicketAlreadyIssued
            | Self::TicketNotActive
            | Self::EventNotOpen
            | Self::EventFull => StatusCode::CONFLICT,
            Self::DeliveryFailed | Self::IssuanceFailed => StatusCode::BAD_GATEWAY,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TicketingError {
    fn into_response(self) -> Response {
        // TraceLayer already records every response status; only 500s need the
        // anyhow chain.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), axum::Json(body)).into_response()
    }
}
