//! Mock auth helpers for integration tests.
//!
//! Services behind the gateway receive `x-campustix-user-id` +
//! `x-campustix-user-role` headers. In tests, `MockAuth` produces these
//! headers directly so no real gateway is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use campustix_auth_types::{USER_ID_HEADER, USER_ROLE_HEADER};
use campustix_domain::id::UserId;
use campustix_domain::user::UserRole;

/// Configurable identity injected into test requests.
#[derive(Debug, Clone, Copy)]
pub struct MockAuth {
    pub user_id: UserId,
    pub role: UserRole,
}

impl MockAuth {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn student(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Student)
    }

    pub fn club_admin(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::ClubAdmin)
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
        );
        map.insert(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from(u16::from(self.role.as_u8())),
        );
        map
    }

    /// Header pairs for clients (such as axum-test) that add headers one at a time.
    pub fn header_pairs(&self) -> [(HeaderName, HeaderValue); 2] {
        let headers = self.headers();
        [USER_ID_HEADER, USER_ROLE_HEADER].map(|name| {
            let name = HeaderName::from_static(name);
            let value = headers[&name].clone();
            (name, value)
        })
    }
}
