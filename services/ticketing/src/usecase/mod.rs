pub mod consent;
pub mod event;
pub mod issuance;
pub mod ticket;
pub mod token;
pub mod wallet;
