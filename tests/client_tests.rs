//! End-to-end tests against a mock Hack Hour server.

use chrono::Utc;
use hackhour_client::{
    ApiOutcome, CancelResult, HackHourClient, HackHourError, PauseToggle, QueueKind,
    SessionLookup,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SLACK_ID: &str = "U0123456789";
const API_KEY: &str = "test-api-key";

fn client(server: &MockServer) -> HackHourClient {
    HackHourClient::builder()
        .slack_id(SLACK_ID)
        .api_key(API_KEY)
        .base_url(server.uri())
        .retry_delay(Duration::ZERO)
        .build()
        .unwrap()
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "data": data }))
}

fn failure(status: u16, error: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "ok": false, "error": error }))
}

fn with_budget(
    template: ResponseTemplate,
    max: u32,
    left: u32,
    reset_in_secs: i64,
) -> ResponseTemplate {
    template
        .insert_header("x-ratelimit-limit", max.to_string().as_str())
        .insert_header("x-ratelimit-remaining", left.to_string().as_str())
        .insert_header(
            "x-ratelimit-reset",
            (Utc::now().timestamp() + reset_in_secs).to_string().as_str(),
        )
}

fn session_body(remaining: u64, completed: bool) -> serde_json::Value {
    json!({
        "id": "recSession",
        "createdAt": "2024-06-01T12:00:00.000Z",
        "time": 60,
        "elapsed": 60 - remaining,
        "remaining": remaining,
        "endTime": "2024-06-01T13:00:00.000Z",
        "goal": "No Goal",
        "paused": false,
        "completed": completed,
        "messageTs": "1717243200.000100"
    })
}

fn session_ref() -> serde_json::Value {
    json!({
        "id": "recSession",
        "slackId": SLACK_ID,
        "createdAt": "2024-06-01T12:00:00.000Z"
    })
}

#[tokio::test]
async fn test_ping_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).ping().await.unwrap(), "pong");
}

#[tokio::test]
async fn test_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activeSessions": 3,
            "airtableConnected": true,
            "slackConnected": true
        })))
        .mount(&server)
        .await;

    let status = client(&server).status().await.unwrap();

    assert_eq!(status.active_sessions, 3);
    assert!(status.slack_connected);
}

#[tokio::test]
async fn test_session_active_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/session/{SLACK_ID}")))
        .respond_with(ok(session_body(0, true)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/session/{SLACK_ID}")))
        .respond_with(ok(session_body(25, false)))
        .mount(&server)
        .await;
    let client = client(&server);

    let finished = client.session().await.unwrap().ok().unwrap();
    let running = client.session().await.unwrap().ok().unwrap();

    assert!(finished.found());
    assert!(!finished.is_active());
    assert!(running.is_active());
    assert_eq!(running.session().unwrap().remaining, 25);
}

#[tokio::test]
async fn test_session_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/session/{SLACK_ID}")))
        .respond_with(failure(404, "Invalid user or no active session found"))
        .mount(&server)
        .await;

    let outcome = client(&server).session().await.unwrap();

    assert_eq!(outcome, ApiOutcome::Success(SessionLookup::NotFound));
}

#[tokio::test]
async fn test_start_posts_work_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/start/{SLACK_ID}")))
        .and(body_json(json!({ "work": "write code" })))
        .respond_with(ok(session_ref()))
        .expect(1)
        .mount(&server)
        .await;

    let started = client(&server).start("write code").await.unwrap().ok().unwrap();

    assert_eq!(started.id, "recSession");
    assert_eq!(started.slack_id, SLACK_ID);
}

#[tokio::test]
async fn test_start_with_empty_work_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ok(session_ref()))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server).start("").await.unwrap_err();

    assert!(matches!(err, HackHourError::Validation { .. }));
}

#[tokio::test]
async fn test_throttled_write_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/cancel/{SLACK_ID}")))
        .respond_with(with_budget(ResponseTemplate::new(429), 16, 1, 60))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/cancel/{SLACK_ID}")))
        .respond_with(with_budget(ok(session_ref()), 16, 0, 60))
        .mount(&server)
        .await;
    let client = client(&server);

    let outcome = client.cancel().await.unwrap().ok().unwrap();

    assert!(outcome.cancelled());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_eq!(client.writes().budget().left, 0);
    assert_eq!(client.metrics().retries.get("writes"), Some(&1));
}

#[tokio::test]
async fn test_retry_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/stats/{SLACK_ID}")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let client = HackHourClient::builder()
        .slack_id(SLACK_ID)
        .api_key(API_KEY)
        .base_url(server.uri())
        .retry_delay(Duration::ZERO)
        .max_retries(2)
        .build()
        .unwrap();

    let err = client.stats().await.unwrap_err();

    assert!(matches!(
        err,
        HackHourError::RateLimited {
            status: 500,
            attempts: 3
        }
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_cancel_without_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/cancel/{SLACK_ID}")))
        .respond_with(failure(400, "Invalid user or no active session found"))
        .mount(&server)
        .await;

    let outcome = client(&server).cancel().await.unwrap();

    assert_eq!(outcome, ApiOutcome::Success(CancelResult::NothingToCancel));
}

#[tokio::test]
async fn test_toggle_paused() {
    let server = MockServer::start().await;
    let mut paused = session_ref();
    paused["paused"] = json!(true);
    Mock::given(method("POST"))
        .and(path(format!("/api/pause/{SLACK_ID}")))
        .respond_with(ok(paused))
        .mount(&server)
        .await;

    let outcome = client(&server).toggle_paused().await.unwrap().ok().unwrap();

    assert_eq!(outcome.paused(), Some(true));
    assert!(matches!(outcome, PauseToggle::Toggled(_)));
}

#[tokio::test]
async fn test_unknown_user_is_a_failure_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/history/{SLACK_ID}")))
        .respond_with(failure(404, "User not found"))
        .mount(&server)
        .await;

    let outcome = client(&server).history().await.unwrap();

    assert_eq!(outcome.error(), Some("User not found"));
}

#[tokio::test]
async fn test_exhausted_reads_wait_for_reset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/goals/{SLACK_ID}")))
        .respond_with(with_budget(ok(json!([])), 10, 0, 2))
        .mount(&server)
        .await;
    let client = client(&server);

    client.goals().await.unwrap();
    let blocked_from = Instant::now();
    client.goals().await.unwrap();

    assert!(blocked_from.elapsed() >= Duration::from_millis(900));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_budget_events() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/stats/{SLACK_ID}")))
        .respond_with(with_budget(ok(json!({ "sessions": 1, "total": 60 })), 10, 7, 60))
        .mount(&server)
        .await;
    let client = client(&server);
    let mut events = client.reads().subscribe();

    client.stats().await.unwrap();
    let event = events.recv().await.unwrap();

    assert_eq!(event.queue, QueueKind::Reads);
    assert_eq!(event.snapshot.max, 10);
    assert_eq!(event.snapshot.left, 7);
}
