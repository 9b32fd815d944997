use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use campustix_domain::id::{ConsentRequestId, EventId};

use crate::domain::types::{EMAIL_VERIFICATION_PURPOSE, VERIFICATION_TOKEN_TTL_HOURS};
use crate::error::TicketingError;

/// Claims of an email verification token. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationClaims {
    pub email: String,
    pub request_id: ConsentRequestId,
    pub event_id: EventId,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_verification_token(
    email: &str,
    request_id: ConsentRequestId,
    event_id: EventId,
    secret: &str,
) -> Result<IssuedToken, TicketingError> {
    issue_verification_token_at(email, request_id, event_id, secret, Utc::now())
}

/// Issue a token as if minted at `issued_at`.
pub fn issue_verification_token_at(
    email: &str,
    request_id: ConsentRequestId,
    event_id: EventId,
    secret: &str,
    issued_at: DateTime<Utc>,
) -> Result<IssuedToken, TicketingError> {
    let expires_at = issued_at + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);
    let claims = VerificationClaims {
        email: email.to_owned(),
        request_id,
        event_id,
        purpose: EMAIL_VERIFICATION_PURPOSE.to_owned(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TicketingError::Internal(e.into()))?;
    Ok(IssuedToken { token, expires_at })
}

/// Verify signature, claim schema, purpose and expiry.
///
/// Malformed tokens, bad signatures and foreign purposes are `InvalidToken`;
/// a token is valid only while `now < exp` (no leeway).
pub fn validate_verification_token(
    token: &str,
    secret: &str,
) -> Result<VerificationClaims, TicketingError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp"]);

    let data = decode::<VerificationClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TicketingError::TokenExpired,
        _ => TicketingError::InvalidToken,
    })?;

    let claims = data.claims;
    if claims.purpose != EMAIL_VERIFICATION_PURPOSE {
        return Err(TicketingError::InvalidToken);
    }
    // jsonwebtoken still accepts exp == now.
    if claims.exp <= Utc::now().timestamp() {
        return Err(TicketingError::TokenExpired);
    }
    Ok(claims)
}
