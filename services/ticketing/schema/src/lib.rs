//! sea-orm entities for the ticketing service.

pub mod consent_requests;
pub mod events;
pub mod tickets;
pub mod users;
