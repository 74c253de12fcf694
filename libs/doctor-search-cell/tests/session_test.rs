mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use tokio_test::assert_ok;

use doctor_search_cell::{
    FilterCriteria, MockDoctorCatalog, SearchQuery, SearchQueryBuilder, SessionConfig, SortOption,
};
use shared_models::{AnalyticsEvent, FetchError};

use common::{ids, instant, numbered_doctors, spawn_session, spawn_session_with};

#[tokio::test]
async fn test_rating_then_availability_then_minimum_rating() {
    let catalog = Arc::new(instant(MockDoctorCatalog::demo(Utc::now())));
    let (session, _) = spawn_session(catalog);

    assert_ok!(session.search(SearchQuery::default(), FilterCriteria::sorted_by(SortOption::Rating)).await);
    let snapshot = session.wait_until_settled().await.unwrap();
    assert_eq!(ids(&snapshot.results.doctors), vec!["doctor2", "doctor1"]);

    assert_ok!(session.apply_filters(FilterCriteria::sorted_by(SortOption::Availability)).await);
    session.wait_until_settled().await.unwrap();
    assert_eq!(ids(&session.current_results()), vec!["doctor1", "doctor2"]);

    assert_ok!(session.apply_filters(FilterCriteria::with_minimum_rating(4.85)).await);
    session.wait_until_settled().await.unwrap();
    assert_eq!(ids(&session.current_results()), vec!["doctor2"]);
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn test_search_sets_loading_until_fetch_completes() {
    let catalog = Arc::new(MockDoctorCatalog::demo(Utc::now()).with_latency(Duration::from_millis(50)));
    let (session, _) = spawn_session(catalog);

    session.search(SearchQuery::default(), FilterCriteria::default()).await.unwrap();
    assert!(session.is_loading());
    assert!(session.current_results().is_empty());

    let snapshot = session.wait_until_settled().await.unwrap();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.results.doctors.len(), 2);
    assert_eq!(snapshot.results.current_page, 1);
    assert_eq!(snapshot.results.total_pages, 3);
    assert!(snapshot.results.can_load_more);
}

#[tokio::test]
async fn test_apply_filters_is_idempotent() {
    let now = Utc::now();
    let mut doctors = numbered_doctors(6, now);
    doctors[2].rating = 4.9;
    doctors[4].rating = 3.5;
    let catalog = Arc::new(instant(MockDoctorCatalog::new(doctors)));
    let (session, _) = spawn_session(catalog);

    session.search(SearchQuery::default(), FilterCriteria::default()).await.unwrap();
    session.wait_until_settled().await.unwrap();

    let criteria = FilterCriteria {
        sort_option: SortOption::Rating,
        minimum_rating: 3.9,
        ..FilterCriteria::default()
    };
    session.apply_filters(criteria.clone()).await.unwrap();
    let first = session.wait_until_settled().await.unwrap();
    session.apply_filters(criteria).await.unwrap();
    let second = session.wait_until_settled().await.unwrap();

    assert_eq!(first.results, second.results);
    assert_eq!(first.results.doctors.len(), 5);
    assert_eq!(first.results.doctors[0].id, "doc-02");
}

#[tokio::test]
async fn test_load_more_accumulates_until_ceiling() {
    let now = Utc::now();
    let catalog = Arc::new(instant(MockDoctorCatalog::new(numbered_doctors(40, now)).with_page_size(5)));
    let (session, _) = spawn_session(catalog);

    session.search(SearchQuery::default(), FilterCriteria::default()).await.unwrap();
    let initial = session.wait_until_settled().await.unwrap().results.doctors.len();
    assert_eq!(initial, 5);

    for _ in 0..2 {
        session.load_more().await.unwrap();
        session.wait_until_settled().await.unwrap();
    }
    let snapshot = session.snapshot();
    assert_eq!(snapshot.results.doctors.len(), initial + 2 * 5);
    assert_eq!(snapshot.results.current_page, 3);
    assert!(snapshot.results.can_load_more);

    session.load_more().await.unwrap();
    session.wait_until_settled().await.unwrap();
    assert_eq!(session.current_results().len(), 20);
    assert!(!session.can_load_more());

    // Past the ceiling further requests change nothing.
    session.load_more().await.unwrap();
    assert!(!session.is_loading_more());
    assert_eq!(session.current_results().len(), 20);
    assert_eq!(ids(&session.current_results())[19], "doc-19");
}

#[tokio::test]
async fn test_load_more_ignored_while_initial_search_runs() {
    let catalog = Arc::new(MockDoctorCatalog::demo(Utc::now()).with_latency(Duration::from_millis(50)));
    let (session, analytics) = spawn_session(catalog);

    session.search(SearchQuery::default(), FilterCriteria::default()).await.unwrap();
    session.load_more().await.unwrap();
    assert!(!session.is_loading_more());

    let snapshot = session.wait_until_settled().await.unwrap();
    assert_eq!(snapshot.results.doctors.len(), 2);
    assert_eq!(snapshot.results.current_page, 1);
    assert!(!analytics.events().contains(&AnalyticsEvent::LoadMore));
}

#[tokio::test]
async fn test_failed_load_more_keeps_accumulated_results() {
    let now = Utc::now();
    let catalog = Arc::new(instant(MockDoctorCatalog::new(numbered_doctors(12, now)).with_page_size(4)));
    let (session, analytics) = spawn_session(catalog.clone());

    session.search(SearchQuery::default(), FilterCriteria::default()).await.unwrap();
    session.load_more().await.unwrap();
    let before = session.wait_until_settled().await.unwrap();
    assert_eq!(before.results.doctors.len(), 8);

    catalog.fail_next(FetchError::ServerError(503));
    session.load_more().await.unwrap();
    let after = session.wait_until_settled().await.unwrap();

    assert_eq!(after.last_error, Some(FetchError::ServerError(503)));
    assert!(!after.is_loading_more);
    assert_eq!(after.results.doctors, before.results.doctors);
    assert_eq!(after.results.current_page, 2);
    assert_eq!(analytics.events().last(), Some(&AnalyticsEvent::Error));

    // Retrying picks up the page that failed.
    session.load_more().await.unwrap();
    let retried = session.wait_until_settled().await.unwrap();
    assert!(retried.last_error.is_none());
    assert_eq!(retried.results.doctors.len(), 12);
    assert_eq!(ids(&retried.results.doctors)[8], "doc-08");
}

#[tokio::test]
async fn test_failed_search_reports_error() {
    let catalog = Arc::new(instant(MockDoctorCatalog::demo(Utc::now())));
    catalog.fail_next(FetchError::Unauthorized);
    let (session, _) = spawn_session(catalog);

    session.search(SearchQuery::default(), FilterCriteria::default()).await.unwrap();
    let snapshot = session.wait_until_settled().await.unwrap();

    assert_eq!(snapshot.last_error, Some(FetchError::Unauthorized));
    assert!(!snapshot.is_loading);
    assert!(snapshot.results.doctors.is_empty());
    assert!(!snapshot.results.can_load_more);
}

#[tokio::test]
async fn test_new_search_discards_in_flight_load_more() {
    let now = Utc::now();
    let catalog = Arc::new(
        instant(MockDoctorCatalog::new(numbered_doctors(12, now)).with_page_size(4))
            .with_page_latency(2, Duration::from_millis(150)),
    );
    let (session, _) = spawn_session(catalog);

    session.search(SearchQuery::default(), FilterCriteria::default()).await.unwrap();
    session.wait_until_settled().await.unwrap();

    session.load_more().await.unwrap();
    assert!(session.is_loading_more());
    session.apply_filters(FilterCriteria::sorted_by(SortOption::Rating)).await.unwrap();
    assert!(!session.is_loading_more());

    let settled = session.wait_until_settled().await.unwrap();
    assert_eq!(ids(&settled.results.doctors), vec!["doc-00", "doc-01", "doc-02", "doc-03"]);

    tokio::time::sleep(Duration::from_millis(250)).await;
    let later = session.snapshot();
    assert_eq!(later.results.doctors.len(), 4);
    assert_eq!(later.results.current_page, 1);
    assert!(!later.is_loading_more);
}

#[tokio::test]
async fn test_slow_earlier_search_never_overwrites_newer_one() {
    let now = Utc::now();
    let catalog = Arc::new(
        instant(MockDoctorCatalog::new(numbered_doctors(3, now)))
            .with_query_latency("slow", Duration::from_millis(150)),
    );
    let (session, _) = spawn_session(catalog);

    let slow = SearchQueryBuilder::new().text("slow").build();
    let fast = SearchQueryBuilder::new().text("fast").build();
    session.search(slow, FilterCriteria::default()).await.unwrap();
    session.search(fast, FilterCriteria::with_minimum_rating(4.5)).await.unwrap();

    let settled = session.wait_until_settled().await.unwrap();
    assert_eq!(settled.query.text, "fast");
    assert!(settled.results.doctors.is_empty());

    tokio::time::sleep(Duration::from_millis(250)).await;
    let later = session.snapshot();
    assert_eq!(later.query.text, "fast");
    assert!(later.results.doctors.is_empty());
    assert!(!later.is_loading);
}

#[tokio::test]
async fn test_fetch_timeout_surfaces_as_error() {
    let catalog = Arc::new(MockDoctorCatalog::demo(Utc::now()).with_latency(Duration::from_millis(500)));
    let config = SessionConfig {
        fetch_timeout: Duration::from_millis(20),
        ..SessionConfig::default()
    };
    let (session, _) = spawn_session_with(catalog, config);

    session.search(SearchQuery::default(), FilterCriteria::default()).await.unwrap();
    let snapshot = session.wait_until_settled().await.unwrap();

    assert_matches!(snapshot.last_error, Some(FetchError::Timeout(20)));
    assert!(snapshot.results.doctors.is_empty());
}

#[tokio::test]
async fn test_subscribers_see_published_changes() {
    let catalog = Arc::new(instant(MockDoctorCatalog::demo(Utc::now())));
    let (session, analytics) = spawn_session(catalog);
    let mut updates = session.subscribe();

    let query = SearchQueryBuilder::new().text("checkup").location("San Juan").build();
    session.search(query, FilterCriteria::default()).await.unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().query.text, "checkup");

    session.wait_until_settled().await.unwrap();
    let parameters = analytics.parameters(AnalyticsEvent::Search).unwrap();
    assert_eq!(parameters["query"], "checkup");
    assert_eq!(parameters["location"], "San Juan");
    assert_eq!(parameters["sort"], "Recommended");
}
