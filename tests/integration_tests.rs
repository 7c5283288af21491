use chrono::NaiveDate;
use court_booker::booking::api::{ApiSession, create_http_client};
use court_booker::booking::{
    AttemptLimit, BookingPlan, BookingPolicy, Preferences, RetrySettings, RunOutcome,
    find_available, run_booking,
};
use court_booker::config::Config;
use court_booker::error::FailureKind;
use court_booker::shutdown::Shutdown;
use court_booker::testing_utils::TestDataBuilder;
use serde_json::json;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

const SEARCH_PATH: &str = "/api/v2/appBookGeneral/date/slot/searchByDate";
const BOOK_PATH: &str = "/api/v2/appBookGeneral/book/afterConfirm";

fn booking_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 15).unwrap()
}

fn plan(courts: &[&str], times: &[&str], policy: BookingPolicy, max: u32) -> BookingPlan {
    BookingPlan {
        date: booking_date(),
        event_id: "evt".to_string(),
        preferences: Preferences::new(courts.iter().copied(), times.iter().copied()).unwrap(),
        policy,
        retry: RetrySettings {
            limit: AttemptLimit::bounded(max),
            retry_delay: Duration::ZERO,
            booking_gap: Duration::ZERO,
        },
    }
}

/// Court1 at 10:00 free: exactly one record pointing at Court1's id
#[test]
fn test_court1_scenario_matches_one_record() {
    let courts = vec![
        TestDataBuilder::court("id-c1", "Court1", vec![TestDataBuilder::free_slot("s1", "10:00")]),
        TestDataBuilder::court("id-c2", "Court2", vec![TestDataBuilder::free_slot("s2", "10:00")]),
    ];
    let prefs = Preferences::new(["Court1"], ["10:00"]).unwrap();

    let report = find_available(&courts, &prefs, booking_date());
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].resource_id, "id-c1");
    assert_eq!(report.records[0].book_slot, "10:00-11:00");

    let taken = vec![TestDataBuilder::court(
        "id-c1",
        "Court1",
        vec![TestDataBuilder::slot("s1", "10:00", 1)],
    )];
    assert!(find_available(&taken, &prefs, booking_date()).is_empty());
}

/// End to end: query, match and book with the exact wire shapes
#[tokio::test]
async fn test_full_booking_flow() {
    let server = MockServer::start().await;
    let courts = vec![TestDataBuilder::court(
        "id-c1",
        "Court1",
        vec![
            TestDataBuilder::slot("s0", "09:00", 0),
            TestDataBuilder::free_slot("s1", "10:00"),
        ],
    )];

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(header("cookie", "token=tok"))
        .and(body_partial_json(json!({"date": "2025-04-15", "eventId": "evt"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(TestDataBuilder::search_response(&courts)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(BOOK_PATH))
        .and(body_partial_json(json!({
            "eventId": "evt",
            "records": [{"bookSlotId": "s1", "resourceId": "id-c1", "price": "", "seatId": ""}]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(TestDataBuilder::booking_accepted("order-1")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_http_client().unwrap();
    let session = ApiSession::new(server.uri(), "tok");
    let plan = plan(&["Court1"], &["10:00"], BookingPolicy::FirstMatch, 5);

    let summary = run_booking(&client, &session, &plan, Shutdown::never()).await;

    assert_eq!(summary.outcome, RunOutcome::Succeeded);
    assert_eq!(summary.total_booked, 1);
    assert_eq!(summary.confirmations[0].order_id.as_deref(), Some("order-1"));
}

/// Body-level status 5 on the query is a remote rejection and is retried
#[tokio::test]
async fn test_query_rejection_is_retried() {
    let server = MockServer::start().await;
    let courts = vec![TestDataBuilder::court(
        "id-c1",
        "Court1",
        vec![TestDataBuilder::free_slot("s1", "10:00")],
    )];

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(TestDataBuilder::rejected(5, "系统繁忙")),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(TestDataBuilder::search_response(&courts)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BOOK_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(TestDataBuilder::booking_accepted("o")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_http_client().unwrap();
    let session = ApiSession::new(server.uri(), "tok");
    let plan = plan(&["Court1"], &["10:00"], BookingPolicy::FirstMatch, 3);

    let summary = run_booking(&client, &session, &plan, Shutdown::never()).await;

    assert_eq!(summary.outcome, RunOutcome::Succeeded);
    assert_eq!(summary.attempt_count, 2);
    assert_eq!(summary.attempts[0].failure, Some(FailureKind::RemoteRejection));
}

/// Three transport failures with a limit of three: exactly three attempts
#[tokio::test]
async fn test_transport_failures_exhaust_after_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0})))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_http_client().unwrap();
    let session = ApiSession::new(server.uri(), "tok");
    let plan = plan(&["Court1"], &["10:00"], BookingPolicy::FirstMatch, 3);

    let summary = run_booking(&client, &session, &plan, Shutdown::never()).await;

    assert_eq!(summary.outcome, RunOutcome::Exhausted);
    assert_eq!(summary.attempt_count, 3);
    assert_eq!(summary.total_booked, 0);
}

/// First-match books once even when two slots match
#[tokio::test]
async fn test_first_match_submits_once() {
    let server = MockServer::start().await;
    let courts = vec![
        TestDataBuilder::court("c1", "Court1", vec![TestDataBuilder::free_slot("a", "19:00")]),
        TestDataBuilder::court("c2", "Court2", vec![TestDataBuilder::free_slot("b", "19:00")]),
    ];
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(TestDataBuilder::search_response(&courts)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BOOK_PATH))
        .and(body_partial_json(json!({"records": [{"bookSlotId": "a"}]})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(TestDataBuilder::booking_accepted("o")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_http_client().unwrap();
    let session = ApiSession::new(server.uri(), "tok");
    let plan = plan(&["Court1", "Court2"], &["19:00"], BookingPolicy::FirstMatch, 3);

    let summary = run_booking(&client, &session, &plan, Shutdown::never()).await;

    assert_eq!(summary.outcome, RunOutcome::Succeeded);
    assert_eq!(summary.total_booked, 1);
}

/// Book-all attempts every record, one request each
#[tokio::test]
async fn test_book_all_submits_every_record() {
    let server = MockServer::start().await;
    let courts = vec![
        TestDataBuilder::court("c1", "Court1", vec![TestDataBuilder::free_slot("a", "19:00")]),
        TestDataBuilder::court("c2", "Court2", vec![TestDataBuilder::free_slot("b", "19:00")]),
    ];
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(TestDataBuilder::search_response(&courts)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BOOK_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(TestDataBuilder::rejected(1, "已被预约")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = create_http_client().unwrap();
    let session = ApiSession::new(server.uri(), "tok");
    let plan = plan(&["Court1", "Court2"], &["19:00"], BookingPolicy::BookAll, 1);

    let summary = run_booking(&client, &session, &plan, Shutdown::never()).await;

    assert_eq!(summary.outcome, RunOutcome::Exhausted);
    assert_eq!(summary.attempt_count, 1);
}

/// An expired token is reported as an auth failure and still retried
#[tokio::test]
async fn test_auth_failure_is_flagged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = create_http_client().unwrap();
    let session = ApiSession::new(server.uri(), "stale");
    let plan = plan(&["Court1"], &["10:00"], BookingPolicy::FirstMatch, 2);

    let summary = run_booking(&client, &session, &plan, Shutdown::never()).await;

    assert_eq!(summary.outcome, RunOutcome::Exhausted);
    assert!(
        summary
            .attempts
            .iter()
            .all(|a| a.failure == Some(FailureKind::Auth))
    );
}

/// Config round trip through a file drives the session settings
#[tokio::test]
async fn test_config_file_feeds_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let path = path.to_str().unwrap();

    let config = Config {
        base_url: "http://localhost:1234/".to_string(),
        auth_token: Some("saved-token".to_string()),
        query_timeout_seconds: 3,
        ..Config::default()
    };
    config.save_to_path(path).await.unwrap();

    let loaded = Config::load_from_path(path).await.unwrap();
    let token = loaded.resolve_token(None).unwrap();
    let session = ApiSession::from_config(&loaded, token);

    assert_eq!(session.base_url, "http://localhost:1234");
    assert_eq!(session.token, "saved-token");
    assert_eq!(session.query_timeout, Duration::from_secs(3));
}
