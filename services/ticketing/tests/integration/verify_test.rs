use chrono::{Duration, Utc};

use campustix_domain::consent::ConsentState;
use campustix_domain::id::{ConsentRequestId, EventId};
use campustix_ticketing::error::TicketingError;
use campustix_ticketing::usecase::token::{
    issue_verification_token, issue_verification_token_at,
};

use crate::helpers::{Harness, TEST_TOKEN_SECRET};

#[tokio::test]
async fn should_verify_email_and_consume_token() {
    let h = Harness::new();
    let request_id = h.created_request().await;
    let token = h.mailer.last_token().unwrap();

    let output = h.verify_email().execute(&token).await.unwrap();

    assert_eq!(output.request_id, request_id);
    assert_eq!(output.event_id, h.event.id);
    let request = h.store.request(request_id).unwrap();
    assert_eq!(request.state(), ConsentState::EmailVerified);
    assert!(request.email_verified);
    assert!(request.is_token_consumed());
}

#[tokio::test]
async fn should_refuse_second_use_of_token() {
    let h = Harness::new();
    h.created_request().await;
    let token = h.mailer.last_token().unwrap();

    h.verify_email().execute(&token).await.unwrap();
    let result = h.verify_email().execute(&token).await;

    assert!(
        matches!(result, Err(TicketingError::AlreadyConsumed)),
        "expected AlreadyConsumed, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_expired_token_without_changing_state() {
    let h = Harness::new();
    let request_id = h.created_request().await;
    let request = h.store.request(request_id).unwrap();
    let expired = issue_verification_token_at(
        &h.student.email,
        request_id,
        h.event.id,
        TEST_TOKEN_SECRET,
        Utc::now() - Duration::hours(25),
    )
    .unwrap();

    let result = h.verify_email().execute(&expired.token).await;

    assert!(
        matches!(result, Err(TicketingError::TokenExpired)),
        "expected TokenExpired, got {result:?}"
    );
    assert_eq!(h.store.request(request_id).unwrap(), request);
}

#[tokio::test]
async fn should_reject_token_signed_with_other_secret() {
    let h = Harness::new();
    let request_id = h.created_request().await;
    let forged =
        issue_verification_token(&h.student.email, request_id, h.event.id, "other-secret").unwrap();

    let result = h.verify_email().execute(&forged.token).await;

    assert!(matches!(result, Err(TicketingError::InvalidToken)));
    assert_eq!(
        h.store.request(request_id).unwrap().state(),
        ConsentState::Created
    );
}

#[tokio::test]
async fn should_reject_garbage_token() {
    let h = Harness::new();

    let result = h.verify_email().execute("definitely.not.a-token").await;

    assert!(matches!(result, Err(TicketingError::InvalidToken)));
}

#[tokio::test]
async fn should_return_not_found_for_token_of_unknown_request() {
    let h = Harness::new();
    let token = issue_verification_token(
        &h.student.email,
        ConsentRequestId::new(),
        h.event.id,
        TEST_TOKEN_SECRET,
    )
    .unwrap();

    let result = h.verify_email().execute(&token.token).await;

    assert!(matches!(result, Err(TicketingError::ConsentRequestNotFound)));
}

#[tokio::test]
async fn should_reject_token_for_other_event() {
    let h = Harness::new();
    let request_id = h.created_request().await;
    let token =
        issue_verification_token(&h.student.email, request_id, EventId::new(), TEST_TOKEN_SECRET)
            .unwrap();

    let result = h.verify_email().execute(&token.token).await;

    assert!(matches!(result, Err(TicketingError::InvalidToken)));
}

#[tokio::test]
async fn should_refuse_verification_of_rejected_request() {
    let h = Harness::new();
    let request_id = h.created_request().await;
    let token = h.mailer.last_token().unwrap();
    h.reject_consent()
        .execute(campustix_ticketing::usecase::consent::RejectConsentInput {
            request_id,
            actor_id: h.admin.id,
            actor_role: campustix_domain::user::UserRole::ClubAdmin,
        })
        .await
        .unwrap();

    let result = h.verify_email().execute(&token).await;

    assert!(
        matches!(result, Err(TicketingError::RequestNotPending)),
        "expected RequestNotPending, got {result:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_consume_token_once_under_concurrency() {
    let h = Harness::new();
    h.created_request().await;
    let token = h.mailer.last_token().unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let usecase = h.verify_email();
        let token = token.clone();
        handles.push(tokio::spawn(async move { usecase.execute(&token).await }));
    }
    let mut verified = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => verified += 1,
            Err(TicketingError::AlreadyConsumed) => {}
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(verified, 1);
}
