use campustix_domain::consent::{ConsentState, ConsentStatus};
use campustix_domain::event::EventStatus;
use campustix_domain::user::UserRole;
use campustix_ticketing::error::TicketingError;
use campustix_ticketing::usecase::consent::{
    ListStudentConsentsUseCase, RejectConsentInput, RequestConsentInput,
};
use campustix_ticketing::usecase::token::validate_verification_token;

use crate::helpers::{APP_BASE_URL, Harness, SentEmail, TEST_TOKEN_SECRET};

// ── RequestConsent ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_request_and_mail_token_for_it() {
    let h = Harness::new();

    let output = h
        .request_consent()
        .execute(h.consent_input())
        .await
        .unwrap();

    let request = h.store.request(output.request_id).unwrap();
    assert_eq!(request.state(), ConsentState::Created);
    assert_eq!(request.status, ConsentStatus::Pending);
    assert!(!request.email_verified);
    assert!(!request.blockchain_verified);
    assert!(output.message_id.is_some());

    let token = h.mailer.last_token().unwrap();
    assert_eq!(token, request.verification_token);
    let claims = validate_verification_token(&token, TEST_TOKEN_SECRET).unwrap();
    assert_eq!(claims.request_id, output.request_id);
    assert_eq!(claims.event_id, h.event.id);
    assert_eq!(claims.email, h.student.email);

    match &h.mailer.sent()[0] {
        SentEmail::Verification { to, subject, url } => {
            assert_eq!(to, &h.student.email);
            assert_eq!(subject, "Ticket Consent Request for Tech Fest");
            assert!(url.starts_with(&format!("{APP_BASE_URL}/verify-email?token=")));
        }
        other => panic!("expected verification email, got {other:?}"),
    }
}

#[tokio::test]
async fn should_fall_back_to_event_name_for_subject() {
    let h = Harness::new();
    let mut input = h.consent_input();
    input.event_name = "  ".to_owned();

    h.request_consent().execute(input).await.unwrap();

    match &h.mailer.sent()[0] {
        SentEmail::Verification { subject, .. } => {
            assert_eq!(subject, "Ticket Consent Request for Tech Fest");
        }
        other => panic!("expected verification email, got {other:?}"),
    }
}

#[tokio::test]
async fn should_resolve_student_by_email_when_id_is_absent() {
    let h = Harness::new();
    let input = RequestConsentInput {
        event_id: h.event.id,
        student_id: None,
        student_email: "  Student@Campus.edu ".to_owned(),
        event_name: String::new(),
    };

    let output = h.request_consent().execute(input).await.unwrap();

    let request = h.store.request(output.request_id).unwrap();
    assert_eq!(request.student_id, h.student.id);
}

#[tokio::test]
async fn should_reject_malformed_email() {
    let h = Harness::new();
    let mut input = h.consent_input();
    input.student_email = "not-an-email".to_owned();

    let result = h.request_consent().execute(input).await;

    assert!(
        matches!(result, Err(TicketingError::InvalidInput(_))),
        "expected InvalidInput, got {result:?}"
    );
    assert!(h.store.requests().is_empty());
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn should_reject_email_of_another_account() {
    let h = Harness::new();
    h.add_student("other@campus.edu");
    let mut input = h.consent_input();
    input.student_email = "other@campus.edu".to_owned();

    let result = h.request_consent().execute(input).await;

    assert!(matches!(result, Err(TicketingError::InvalidInput(_))));
}

#[tokio::test]
async fn should_reject_non_student_recipient() {
    let h = Harness::new();
    let mut input = h.consent_input();
    input.student_id = Some(h.admin.id);
    input.student_email = h.admin.email.clone();

    let result = h.request_consent().execute(input).await;

    assert!(matches!(result, Err(TicketingError::InvalidInput(_))));
    assert_eq!(h.admin.role, UserRole::ClubAdmin);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_event_or_student() {
    let h = Harness::new();

    let mut input = h.consent_input();
    input.event_id = campustix_domain::id::EventId::new();
    let result = h.request_consent().execute(input).await;
    assert!(matches!(result, Err(TicketingError::EventNotFound)));

    let mut input = h.consent_input();
    input.student_id = Some(campustix_domain::id::UserId::new());
    let result = h.request_consent().execute(input).await;
    assert!(matches!(result, Err(TicketingError::UserNotFound)));
}

#[tokio::test]
async fn should_refuse_requests_for_cancelled_event() {
    let h = Harness::new();
    let mut event = h.event.clone();
    event.id = campustix_domain::id::EventId::new();
    event.status = EventStatus::Cancelled;
    h.store.insert_event(event.clone());
    let mut input = h.consent_input();
    input.event_id = event.id;

    let result = h.request_consent().execute(input).await;

    assert!(matches!(result, Err(TicketingError::EventNotOpen)));
}

#[tokio::test]
async fn should_refuse_duplicate_open_request() {
    let h = Harness::new();
    h.created_request().await;

    let result = h.request_consent().execute(h.consent_input()).await;

    assert!(
        matches!(result, Err(TicketingError::ConsentAlreadyExists)),
        "expected ConsentAlreadyExists, got {result:?}"
    );
    assert_eq!(h.store.requests().len(), 1);
}

#[tokio::test]
async fn should_allow_new_request_after_rejection() {
    let h = Harness::new();
    let first = h.created_request().await;
    h.reject_consent()
        .execute(RejectConsentInput {
            request_id: first,
            actor_id: h.admin.id,
            actor_role: UserRole::ClubAdmin,
        })
        .await
        .unwrap();

    let second = h.created_request().await;

    assert_ne!(first, second);
    assert_eq!(h.store.requests().len(), 2);
}

#[tokio::test]
async fn should_refuse_request_when_event_is_full() {
    let h = Harness::with_capacity(1);
    let request_id = h.verified_request().await;
    h.complete_issuance()
        .execute(h.completion(request_id))
        .await
        .unwrap();
    let other = h.add_student("other@campus.edu");
    let mut input = h.consent_input();
    input.student_id = Some(other.id);
    input.student_email = other.email.clone();

    let result = h.request_consent().execute(input).await;

    assert!(matches!(result, Err(TicketingError::EventFull)));
}

#[tokio::test]
async fn should_keep_request_pending_when_delivery_fails() {
    let h = Harness::new();
    h.mailer.set_failing(true);

    let result = h.request_consent().execute(h.consent_input()).await;

    assert!(
        matches!(result, Err(TicketingError::DeliveryFailed)),
        "expected DeliveryFailed, got {result:?}"
    );
    let requests = h.store.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].state(), ConsentState::Created);

    // Resend succeeds once the transport recovers.
    h.mailer.set_failing(false);
    h.resend_verification()
        .execute(requests[0].id)
        .await
        .unwrap();
    assert!(h.mailer.last_token().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_create_single_request_under_concurrent_submissions() {
    let h = Harness::new();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let usecase = h.request_consent();
        let input = h.consent_input();
        handles.push(tokio::spawn(async move { usecase.execute(input).await }));
    }
    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(TicketingError::ConsentAlreadyExists) => {}
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(h.store.requests().len(), 1);
}

// ── ResendVerification ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_invalidate_previous_token_on_resend() {
    let h = Harness::new();
    let request_id = h.created_request().await;
    let old_token = h.mailer.last_token().unwrap();
    // Tokens minted within the same second would be identical.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    h.resend_verification().execute(request_id).await.unwrap();

    let new_token = h.mailer.last_token().unwrap();
    assert_ne!(old_token, new_token);
    let result = h.verify_email().execute(&old_token).await;
    assert!(
        matches!(result, Err(TicketingError::InvalidToken)),
        "expected InvalidToken, got {result:?}"
    );
    h.verify_email().execute(&new_token).await.unwrap();
}

#[tokio::test]
async fn should_refuse_resend_after_verification() {
    let h = Harness::new();
    let request_id = h.verified_request().await;

    let result = h.resend_verification().execute(request_id).await;

    assert!(matches!(result, Err(TicketingError::RequestNotPending)));
}

// ── RejectConsent ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_idempotently() {
    let h = Harness::new();
    let request_id = h.created_request().await;
    let input = || RejectConsentInput {
        request_id,
        actor_id: h.admin.id,
        actor_role: UserRole::ClubAdmin,
    };

    h.reject_consent().execute(input()).await.unwrap();
    h.reject_consent().execute(input()).await.unwrap();

    let request = h.store.request(request_id).unwrap();
    assert_eq!(request.status, ConsentStatus::Rejected);
    assert_eq!(request.state(), ConsentState::Rejected);
}

#[tokio::test]
async fn should_let_owning_student_reject_verified_request() {
    let h = Harness::new();
    let request_id = h.verified_request().await;

    h.reject_consent()
        .execute(RejectConsentInput {
            request_id,
            actor_id: h.student.id,
            actor_role: UserRole::Student,
        })
        .await
        .unwrap();

    assert_eq!(
        h.store.request(request_id).unwrap().state(),
        ConsentState::Rejected
    );
}

#[tokio::test]
async fn should_forbid_other_students_from_rejecting() {
    let h = Harness::new();
    let request_id = h.created_request().await;
    let other = h.add_student("other@campus.edu");

    let result = h
        .reject_consent()
        .execute(RejectConsentInput {
            request_id,
            actor_id: other.id,
            actor_role: UserRole::Student,
        })
        .await;

    assert!(matches!(result, Err(TicketingError::Forbidden)));
    assert_eq!(
        h.store.request(request_id).unwrap().state(),
        ConsentState::Created
    );
}

#[tokio::test]
async fn should_not_reject_approved_request() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    h.complete_issuance()
        .execute(h.completion(request_id))
        .await
        .unwrap();

    let result = h
        .reject_consent()
        .execute(RejectConsentInput {
            request_id,
            actor_id: h.admin.id,
            actor_role: UserRole::ClubAdmin,
        })
        .await;

    assert!(matches!(result, Err(TicketingError::RequestNotPending)));
    assert_eq!(
        h.store.request(request_id).unwrap().state(),
        ConsentState::Approved
    );
}

#[tokio::test]
async fn should_return_not_found_when_rejecting_unknown_request() {
    let h = Harness::new();

    let result = h
        .reject_consent()
        .execute(RejectConsentInput {
            request_id: campustix_domain::id::ConsentRequestId::new(),
            actor_id: h.admin.id,
            actor_role: UserRole::ClubAdmin,
        })
        .await;

    assert!(matches!(result, Err(TicketingError::ConsentRequestNotFound)));
}

// ── ListStudentConsents ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_student_requests_with_event_details() {
    let h = Harness::new();
    let request_id = h.created_request().await;
    let usecase = ListStudentConsentsUseCase {
        events: h.store.clone(),
        requests: h.store.clone(),
    };

    let views = usecase.execute(h.student.id).await.unwrap();

    assert_eq!(views.len(), 1);
    assert_eq!(views[0].request.id, request_id);
    assert_eq!(views[0].event.name, "Tech Fest");
    assert_eq!(views[0].event.location, "Main Hall");
    assert!(usecase.execute(h.admin.id).await.unwrap().is_empty());
}
