use std::time::Duration;

use sea_orm::DatabaseConnection;

use campustix_domain::id::{ConsentRequestId, EventId, UserId};

use crate::infra::db::{
    DbConsentRequestRepository, DbEventRepository, DbTicketRepository, DbUserRepository,
};
use crate::infra::ledger::Ledger;
use crate::infra::mail::Mailer;
use crate::locks::KeyedLocks;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub mailer: Mailer,
    pub ledger: Ledger,
    pub token_secret: String,
    pub app_base_url: String,
    pub ledger_timeout: Duration,
    /// Serializes workflow transitions of one consent request.
    pub request_locks: KeyedLocks<ConsentRequestId>,
    /// Serializes duplicate detection for one (event, student) pair.
    pub enrollment_locks: KeyedLocks<(EventId, UserId)>,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn event_repo(&self) -> DbEventRepository {
        DbEventRepository {
            db: self.db.clone(),
        }
    }

    pub fn consent_repo(&self) -> DbConsentRequestRepository {
        DbConsentRequestRepository {
            db: self.db.clone(),
        }
    }

    pub fn ticket_repo(&self) -> DbTicketRepository {
        DbTicketRepository {
            db: self.db.clone(),
        }
    }
}
