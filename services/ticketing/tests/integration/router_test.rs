use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use campustix_domain::id::UserId;
use campustix_domain::ledger::WalletAddress;
use campustix_testing::auth::MockAuth;
use campustix_ticketing::infra::ledger::{Ledger, SimulatedLedger};
use campustix_ticketing::infra::mail::{LogMailer, Mailer};
use campustix_ticketing::locks::KeyedLocks;
use campustix_ticketing::router::build_router;
use campustix_ticketing::state::AppState;

use crate::helpers::{APP_BASE_URL, TEST_TOKEN_SECRET, WALLET};

/// Router over a disconnected database. Only requests that are answered
/// before any store access are meaningful here.
fn server(wallet: Option<&str>) -> TestServer {
    let wallet = wallet.map(|w| WalletAddress::parse(w).unwrap());
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        mailer: Mailer::Log(LogMailer),
        ledger: Ledger::Simulated(SimulatedLedger::new(b"router-test-key", wallet).unwrap()),
        token_secret: TEST_TOKEN_SECRET.to_owned(),
        app_base_url: APP_BASE_URL.to_owned(),
        ledger_timeout: Duration::from_secs(1),
        request_locks: KeyedLocks::new(),
        enrollment_locks: KeyedLocks::new(),
    };
    TestServer::new(build_router(state)).unwrap()
}

fn with_identity(
    mut request: axum_test::TestRequest,
    auth: MockAuth,
) -> axum_test::TestRequest {
    for (name, value) in auth.header_pairs() {
        request = request.add_header(name, value);
    }
    request
}

#[tokio::test]
async fn should_answer_liveness_and_report_unready_store() {
    let server = server(None);

    server.get("/healthz").await.assert_status_ok();
    server
        .get("/readyz")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_require_identity_headers() {
    let server = server(None);

    server
        .get("/tickets/@me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/wallet")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_forbid_students_from_creating_events() {
    let server = server(None);
    let request = server.post("/events").json(&json!({
        "name": "Tech Fest",
        "date": "2030-03-15",
        "time": "10:00",
        "location": "Main Hall",
        "capacity": 100,
    }));

    let response = with_identity(request, MockAuth::student(UserId::new())).await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["kind"], "FORBIDDEN");
}

#[tokio::test]
async fn should_reject_garbage_verification_token() {
    let server = server(None);

    let response = server
        .post("/consent-requests/verify-email")
        .json(&json!({ "token": "not-a-token" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["kind"], "INVALID_TOKEN");
}

#[tokio::test]
async fn should_connect_wallet_or_report_no_account() {
    let auth = MockAuth::student(UserId::new());

    let response = with_identity(server(Some(WALLET)).get("/wallet"), auth).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["address"], WALLET);

    let response = with_identity(server(None).get("/wallet"), auth).await;
    response.assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn should_sign_messages_and_reject_bad_addresses() {
    let server = server(Some(WALLET));
    let auth = MockAuth::student(UserId::new());

    let signed = with_identity(
        server
            .post("/wallet/signatures")
            .json(&json!({ "message": "hello", "address": WALLET })),
        auth,
    )
    .await;
    signed.assert_status_ok();
    let signature = signed.json::<Value>()["signature"].as_str().unwrap().to_owned();
    assert!(signature.starts_with("0x"));

    let rejected = with_identity(
        server
            .post("/wallet/signatures")
            .json(&json!({ "message": "hello", "address": "0x1234" })),
        auth,
    )
    .await;
    rejected.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(rejected.json::<Value>()["kind"], "INVALID_INPUT");
}

#[tokio::test]
async fn should_reject_malformed_event_filter() {
    let server = server(None);

    let response = server.get("/events?status=postponed").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
