//! Gateway-injected identity headers extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

use campustix_domain::id::UserId;
use campustix_domain::user::UserRole;

pub const USER_ID_HEADER: &str = "x-campustix-user-id";
pub const USER_ROLE_HEADER: &str = "x-campustix-user-role";

/// User identity injected by the gateway via `x-campustix-user-id` and
/// `x-campustix-user-role` headers.
///
/// Returns 401 if either header is absent or malformed (unknown role values
/// included). Role enforcement (403) is done by handlers after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityHeaders {
    pub user_id: UserId,
    pub role: UserRole,
}

impl IdentityHeaders {
    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }

    pub fn is_club_admin(&self) -> bool {
        self.role == UserRole::ClubAdmin
    }
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 declares `fn -> impl Future + Send`; read the headers
    // synchronously and return a 'static future.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Uuid>().ok())
            .map(UserId);

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u8>().ok())
            .and_then(UserRole::from_u8);

        async move {
            let user_id = user_id.ok_or(StatusCode::UNAUTHORIZED)?;
            let role = role.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self { user_id, role })
        }
    }
}
