use chrono::{NaiveDate, NaiveTime};

use campustix_domain::event::{EventCategory, EventStatus};
use campustix_domain::id::EventId;
use campustix_domain::user::UserRole;
use campustix_ticketing::domain::types::EventFilter;
use campustix_ticketing::error::TicketingError;
use campustix_ticketing::usecase::event::{
    CancelEventUseCase, CreateEventInput, CreateEventUseCase, GetEventUseCase, ListEventsUseCase,
};

use crate::helpers::{Harness, InMemoryStore, test_event, test_user};

fn event_input() -> CreateEventInput {
    CreateEventInput {
        name: "  Spring Concert ".to_owned(),
        date: NaiveDate::from_ymd_opt(2030, 4, 2).unwrap(),
        time: "7:30 PM".to_owned(),
        location: "Amphitheatre".to_owned(),
        description: "Open-air concert".to_owned(),
        organizer: None,
        capacity: 250,
        category: EventCategory::Cultural,
        image: Some("   ".to_owned()),
    }
}

fn create_event(h: &Harness) -> CreateEventUseCase<InMemoryStore, InMemoryStore> {
    CreateEventUseCase {
        users: h.store.clone(),
        events: h.store.clone(),
    }
}

// ── CreateEvent ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_event_for_club_admin() {
    let h = Harness::new();

    let event = create_event(&h)
        .execute(h.admin.id, event_input())
        .await
        .unwrap();

    assert_eq!(event.name, "Spring Concert");
    assert_eq!(event.time, NaiveTime::from_hms_opt(19, 30, 0).unwrap());
    assert_eq!(event.organizer, h.admin.name);
    assert_eq!(event.organizer_id, h.admin.id);
    assert_eq!(event.status, EventStatus::Upcoming);
    assert!(event.image.is_none());
    assert_eq!(h.store.event(event.id).unwrap(), event);
}

#[tokio::test]
async fn should_keep_explicit_organizer_name() {
    let h = Harness::new();
    let mut input = event_input();
    input.organizer = Some("Music Society".to_owned());

    let event = create_event(&h).execute(h.admin.id, input).await.unwrap();

    assert_eq!(event.organizer, "Music Society");
}

#[tokio::test]
async fn should_forbid_students_from_creating_events() {
    let h = Harness::new();

    let result = create_event(&h).execute(h.student.id, event_input()).await;

    assert!(matches!(result, Err(TicketingError::Forbidden)));
}

#[tokio::test]
async fn should_reject_invalid_event_fields() {
    let h = Harness::new();

    let mut blank_name = event_input();
    blank_name.name = " ".to_owned();
    let mut no_capacity = event_input();
    no_capacity.capacity = 0;
    let mut huge_capacity = event_input();
    huge_capacity.capacity = u32::MAX;
    let mut bad_time = event_input();
    bad_time.time = "half past seven".to_owned();

    for input in [blank_name, no_capacity, huge_capacity, bad_time] {
        let result = create_event(&h).execute(h.admin.id, input).await;
        assert!(
            matches!(result, Err(TicketingError::InvalidInput(_))),
            "expected InvalidInput, got {result:?}"
        );
    }
    assert!(h.store.events().iter().all(|e| e.id == h.event.id));
}

// ── ListEvents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_events_by_filter_in_date_order() {
    let h = Harness::new();
    let other_admin = test_user("club@campus.edu", UserRole::ClubAdmin);
    let mut early = test_event(&other_admin, 10);
    early.date = NaiveDate::from_ymd_opt(2029, 1, 1).unwrap();
    early.category = EventCategory::Sports;
    let mut cancelled = test_event(&other_admin, 10);
    cancelled.status = EventStatus::Cancelled;
    h.store.insert_event(early.clone());
    h.store.insert_event(cancelled.clone());
    let usecase = ListEventsUseCase {
        events: h.store.clone(),
    };

    let all = usecase.execute(EventFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, early.id);

    let upcoming = usecase
        .execute(EventFilter {
            status: Some(EventStatus::Upcoming),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(upcoming.iter().all(|e| e.id != cancelled.id));
    assert_eq!(upcoming.len(), 2);

    let sports = usecase
        .execute(EventFilter {
            category: Some(EventCategory::Sports),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(sports.len(), 1);
    assert_eq!(sports[0].id, early.id);

    let mine = usecase
        .execute(EventFilter {
            organizer_id: Some(h.admin.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, h.event.id);
}

// ── GetEvent ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_issued_tickets_and_seats_left() {
    let h = Harness::with_capacity(3);
    let request_id = h.verified_request().await;
    h.complete_issuance()
        .execute(h.completion(request_id))
        .await
        .unwrap();
    let usecase = GetEventUseCase {
        events: h.store.clone(),
        tickets: h.store.clone(),
    };

    let details = usecase.execute(h.event.id).await.unwrap();

    assert_eq!(details.event.id, h.event.id);
    assert_eq!(details.tickets_issued, 1);
    assert_eq!(details.seats_left(), 2);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_event() {
    let h = Harness::new();
    let usecase = GetEventUseCase {
        events: h.store.clone(),
        tickets: h.store.clone(),
    };

    let result = usecase.execute(EventId::new()).await;

    assert!(matches!(result, Err(TicketingError::EventNotFound)));
}

// ── CancelEvent ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_cancel_event_once() {
    let h = Harness::new();
    let usecase = CancelEventUseCase {
        events: h.store.clone(),
    };

    usecase.execute(h.admin.id, h.event.id).await.unwrap();
    assert_eq!(h.store.event(h.event.id).unwrap().status, EventStatus::Cancelled);

    let result = usecase.execute(h.admin.id, h.event.id).await;
    assert!(matches!(result, Err(TicketingError::EventNotOpen)));
}

#[tokio::test]
async fn should_forbid_cancellation_by_other_admin() {
    let h = Harness::new();
    let other_admin = test_user("club@campus.edu", UserRole::ClubAdmin);
    h.store.insert_user(other_admin.clone());
    let usecase = CancelEventUseCase {
        events: h.store.clone(),
    };

    let result = usecase.execute(other_admin.id, h.event.id).await;

    assert!(matches!(result, Err(TicketingError::Forbidden)));
    assert_eq!(h.store.event(h.event.id).unwrap().status, EventStatus::Upcoming);
}
