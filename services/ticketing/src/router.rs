use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use campustix_core::health::{healthz, readiness};
use campustix_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    consent::{
        complete_issuance, list_my_consent_requests, reject_consent, request_consent,
        resend_verification, verify_email,
    },
    event::{cancel_event, create_event, get_event, list_events},
    ticket::{get_ticket, list_my_tickets, redeem_ticket, resend_confirmation, verify_ticket},
    wallet::{connect_wallet, sign_message},
};
use crate::state::AppState;

async fn readyz(State(state): State<AppState>) -> StatusCode {
    readiness(state.db.ping().await)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Events
        .route("/events", post(create_event).get(list_events))
        .route("/events/{event_id}", get(get_event))
        .route("/events/{event_id}/cancel", post(cancel_event))
        // Consent requests
        .route("/events/{event_id}/consent-requests", post(request_consent))
        .route("/consent-requests/@me", get(list_my_consent_requests))
        .route("/consent-requests/verify-email", post(verify_email))
        .route("/consent-requests/{id}/resend", post(resend_verification))
        .route("/consent-requests/{id}/reject", post(reject_consent))
        .route("/consent-requests/{id}/complete", post(complete_issuance))
        // Tickets
        .route("/tickets/@me", get(list_my_tickets))
        .route("/tickets/redeem", post(redeem_ticket))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/verification", get(verify_ticket))
        .route("/tickets/{id}/confirmation", post(resend_confirmation))
        // Wallet
        .route("/wallet", get(connect_wallet))
        .route("/wallet/signatures", post(sign_message))
        .with_state(state)
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
