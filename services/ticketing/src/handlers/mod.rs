pub mod consent;
pub mod event;
pub mod ticket;
pub mod wallet;

use campustix_auth_types::IdentityHeaders;

use crate::error::TicketingError;

pub(crate) fn require_club_admin(identity: &IdentityHeaders) -> Result<(), TicketingError> {
    if identity.is_club_admin() {
        Ok(())
    } else {
        Err(TicketingError::Forbidden)
    }
}

pub(crate) fn require_student(identity: &IdentityHeaders) -> Result<(), TicketingError> {
    if identity.is_student() {
        Ok(())
    } else {
        Err(TicketingError::Forbidden)
    }
}
