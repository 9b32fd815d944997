mod consent_test;
mod event_test;
mod issuance_test;
mod router_test;
mod verify_test;
