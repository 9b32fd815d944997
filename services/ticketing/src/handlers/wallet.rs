use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use campustix_auth_types::IdentityHeaders;
use campustix_domain::ledger::WalletAddress;

use crate::error::TicketingError;
use crate::state::AppState;
use crate::usecase::wallet::{ConnectWalletUseCase, SignMessageUseCase};

// ── GET /wallet ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct WalletResponse {
    pub address: WalletAddress,
}

/// 204 when no account is available.
pub async fn connect_wallet(
    _identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Response {
    let usecase = ConnectWalletUseCase {
        ledger: state.ledger.clone(),
    };
    match usecase.execute().await {
        Some(address) => Json(WalletResponse { address }).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

// ── POST /wallet/signatures ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignMessageRequest {
    pub message: String,
    pub address: String,
}

#[derive(Serialize)]
pub struct SignatureResponse {
    pub signature: String,
}

pub async fn sign_message(
    _identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<SignMessageRequest>,
) -> Result<Response, TicketingError> {
    let usecase = SignMessageUseCase {
        ledger: state.ledger.clone(),
    };
    let response = match usecase.execute(&body.message, &body.address).await? {
        Some(signature) => Json(SignatureResponse { signature }).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}
