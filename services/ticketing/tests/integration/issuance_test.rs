use std::time::Duration;

use campustix_domain::consent::{ConsentState, ConsentStatus};
use campustix_domain::event::EventStatus;
use campustix_domain::ledger::IssuanceKind;
use campustix_domain::ticket::TicketStatus;
use campustix_ticketing::domain::repository::EventRepository;
use campustix_ticketing::domain::types::qr_reference;
use campustix_ticketing::error::TicketingError;
use campustix_ticketing::infra::ledger::{Ledger, SimulatedLedger};
use campustix_ticketing::usecase::issuance::CompleteIssuanceUseCase;

use crate::helpers::{APP_BASE_URL, Harness, SentEmail, WALLET};

#[tokio::test]
async fn should_issue_ticket_end_to_end() {
    let h = Harness::new();
    let request_id = h.verified_request().await;

    let output = h
        .complete_issuance()
        .execute(h.completion(request_id))
        .await
        .unwrap();

    let ticket = &output.ticket;
    assert_eq!(ticket.event_id, h.event.id);
    assert_eq!(ticket.student_id, h.student.id);
    assert_eq!(ticket.consent_request_id, request_id);
    assert_eq!(ticket.status, TicketStatus::Active);
    assert_eq!(ticket.issuance.kind(), IssuanceKind::Real);
    assert_eq!(ticket.qr_reference, qr_reference(APP_BASE_URL, ticket.id));
    assert!(output.confirmation_sent);

    let request = h.store.request(request_id).unwrap();
    assert_eq!(request.state(), ConsentState::Approved);
    assert_eq!(request.status, ConsentStatus::Approved);
    assert!(request.blockchain_verified);
    assert_eq!(request.issuance_ticket_id, Some(ticket.id));

    assert_eq!(h.store.active_tickets_for(h.event.id, h.student.id).len(), 1);
    assert_eq!(
        h.store.user(h.student.id).unwrap().wallet_address.unwrap().as_str(),
        WALLET
    );

    let confirmation = h.mailer.sent().into_iter().last().unwrap();
    assert_eq!(
        confirmation,
        SentEmail::Confirmation {
            to: h.student.email.clone(),
            event_name: "Tech Fest".to_owned(),
            ticket_id: ticket.id,
            qr_reference: ticket.qr_reference.clone(),
        }
    );
}

#[tokio::test]
async fn should_refuse_completion_before_email_verification() {
    let h = Harness::new();
    let request_id = h.created_request().await;

    let result = h
        .complete_issuance()
        .execute(h.completion(request_id))
        .await;

    assert!(
        matches!(result, Err(TicketingError::RequestNotPending)),
        "expected RequestNotPending, got {result:?}"
    );
    assert!(h.store.tickets().is_empty());
    assert!(h.ledger.issue_calls().is_empty());
}

#[tokio::test]
async fn should_refuse_completion_by_another_student() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    let other = h.add_student("other@campus.edu");
    let mut input = h.completion(request_id);
    input.student_id = other.id;

    let result = h.complete_issuance().execute(input).await;

    assert!(matches!(result, Err(TicketingError::Forbidden)));
}

#[tokio::test]
async fn should_reject_malformed_wallet_address() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    let mut input = h.completion(request_id);
    input.wallet_address = Some("0xnot-a-wallet".to_owned());

    let result = h.complete_issuance().execute(input).await;

    assert!(matches!(result, Err(TicketingError::InvalidInput(_))));
    assert_eq!(
        h.store.request(request_id).unwrap().state(),
        ConsentState::EmailVerified
    );
}

#[tokio::test]
async fn should_issue_without_wallet_address() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    let mut input = h.completion(request_id);
    input.wallet_address = None;

    h.complete_issuance().execute(input).await.unwrap();

    assert!(h.store.user(h.student.id).unwrap().wallet_address.is_none());
}

#[tokio::test]
async fn should_leave_request_retryable_when_ledger_fails() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    h.ledger.fail_next(1);

    let result = h
        .complete_issuance()
        .execute(h.completion(request_id))
        .await;

    assert!(
        matches!(result, Err(TicketingError::IssuanceFailed)),
        "expected IssuanceFailed, got {result:?}"
    );
    let request = h.store.request(request_id).unwrap();
    assert_eq!(request.state(), ConsentState::EmailVerified);
    let reserved = request.issuance_ticket_id.unwrap();
    assert!(h.store.tickets().is_empty());

    let output = h
        .complete_issuance()
        .execute(h.completion(request_id))
        .await
        .unwrap();

    assert_eq!(output.ticket.id, reserved);
    assert_eq!(h.ledger.issue_calls(), vec![reserved, reserved]);
}

#[tokio::test]
async fn should_reuse_issuance_recorded_before_lost_response() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    h.ledger.lose_next_response();

    let result = h
        .complete_issuance()
        .execute(h.completion(request_id))
        .await;
    assert!(matches!(result, Err(TicketingError::IssuanceFailed)));
    assert_eq!(h.ledger.recorded(), 1);

    let output = h
        .complete_issuance()
        .execute(h.completion(request_id))
        .await
        .unwrap();

    // The retry found the recorded issuance and did not issue again.
    assert_eq!(h.ledger.issue_calls().len(), 1);
    assert_eq!(h.ledger.recorded(), 1);
    assert_eq!(h.store.tickets().len(), 1);
    assert_eq!(output.ticket.issuance.kind(), IssuanceKind::Real);
}

#[tokio::test(start_paused = true)]
async fn should_fail_issuance_when_ledger_times_out() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    h.ledger.set_delay(Duration::from_secs(30));
    let mut usecase = h.complete_issuance();
    usecase.ledger_timeout = Duration::from_secs(1);

    let result = usecase.execute(h.completion(request_id)).await;

    assert!(
        matches!(result, Err(TicketingError::IssuanceFailed)),
        "expected IssuanceFailed, got {result:?}"
    );
    assert_eq!(
        h.store.request(request_id).unwrap().state(),
        ConsentState::EmailVerified
    );
    assert!(h.store.tickets().is_empty());
}

#[tokio::test]
async fn should_succeed_when_confirmation_email_fails() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    h.mailer.set_failing(true);

    let output = h
        .complete_issuance()
        .execute(h.completion(request_id))
        .await
        .unwrap();

    assert!(!output.confirmation_sent);
    assert_eq!(
        h.store.request(request_id).unwrap().state(),
        ConsentState::Approved
    );
    assert_eq!(h.mailer.confirmations(), 0);
}

#[tokio::test]
async fn should_refuse_second_completion() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    h.complete_issuance()
        .execute(h.completion(request_id))
        .await
        .unwrap();

    let result = h
        .complete_issuance()
        .execute(h.completion(request_id))
        .await;

    assert!(matches!(result, Err(TicketingError::RequestNotPending)));
    assert_eq!(h.store.tickets().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_issue_exactly_one_ticket_under_concurrent_completion() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    h.ledger.set_delay(Duration::from_millis(50));

    let first = h.complete_issuance();
    let second = h.complete_issuance();
    let first_input = h.completion(request_id);
    let second_input = h.completion(request_id);
    let a = tokio::spawn(async move { first.execute(first_input).await });
    let b = tokio::spawn(async move { second.execute(second_input).await });
    let results = [a.await.unwrap(), b.await.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let not_pending = results
        .iter()
        .filter(|r| matches!(r, Err(TicketingError::RequestNotPending)))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(not_pending, 1);
    assert_eq!(h.store.tickets().len(), 1);
    assert_eq!(h.ledger.issue_calls().len(), 1);
}

#[tokio::test]
async fn should_refuse_completion_for_cancelled_event() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    EventRepository::update_status(
        &h.store,
        h.event.id,
        EventStatus::Upcoming,
        EventStatus::Cancelled,
    )
    .await
    .unwrap();

    let result = h
        .complete_issuance()
        .execute(h.completion(request_id))
        .await;

    assert!(matches!(result, Err(TicketingError::EventNotOpen)));
    assert!(h.ledger.issue_calls().is_empty());
}

#[tokio::test]
async fn should_report_simulated_issuance_distinctly() {
    let h = Harness::new();
    let request_id = h.verified_request().await;
    let simulated = SimulatedLedger::new(b"simulation-key", None).unwrap();
    let usecase = CompleteIssuanceUseCase {
        users: h.store.clone(),
        events: h.store.clone(),
        requests: h.store.clone(),
        ledger: Ledger::Simulated(simulated.clone()),
        mailer: h.mailer.clone(),
        request_locks: h.request_locks.clone(),
        ledger_timeout: Duration::from_secs(5),
        app_base_url: APP_BASE_URL.to_owned(),
    };

    let output = usecase.execute(h.completion(request_id)).await.unwrap();

    assert!(output.ticket.issuance.is_simulated());
    assert_eq!(
        output.ticket.issuance.reference(),
        &simulated.reference_for(output.ticket.id)
    );
}

#[tokio::test]
async fn should_refuse_completion_once_event_is_full() {
    let h = Harness::with_capacity(1);
    let first = h.verified_request().await;
    let other = h.add_student("other@campus.edu");
    let mut input = h.consent_input();
    input.student_id = Some(other.id);
    input.student_email = other.email.clone();
    let second = h.request_consent().execute(input).await.unwrap().request_id;
    let token = h.mailer.last_token().unwrap();
    h.verify_email().execute(&token).await.unwrap();

    h.complete_issuance()
        .execute(h.completion(first))
        .await
        .unwrap();
    let mut completion = h.completion(second);
    completion.student_id = other.id;
    let result = h.complete_issuance().execute(completion).await;

    assert!(
        matches!(result, Err(TicketingError::EventFull)),
        "expected EventFull, got {result:?}"
    );
    assert_eq!(h.store.tickets().len(), 1);
    assert_eq!(
        h.store.request(second).unwrap().state(),
        ConsentState::EmailVerified
    );
}
