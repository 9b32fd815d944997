pub mod db;
pub mod ledger;
pub mod mail;
pub mod templates;
