//! HTTP routes against in-memory storage.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;
use tigertix_core::{
    BoxFuture, Decrement, EventId, InventoryBackend, NaiveDate, Quantity, StorageError,
};
use tigertix_llm::{BookingIntent, IntentError, IntentExtractor, UnconfiguredExtractor};
use tigertix_runtime::{InventoryStore, RetryPolicy};
use tigertix_testing::{FlakyInventory, InMemoryBookingRecorder, InMemoryInventory, test_clock};
use tigertix_web::{AppState, CORRELATION_ID_HEADER, build_router};

/// Extractor that always returns the same answer.
struct ScriptedExtractor(Result<BookingIntent, IntentError>);

impl IntentExtractor for ScriptedExtractor {
    fn extract<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<BookingIntent, IntentError>> {
        let answer = self.0.clone();
        Box::pin(async move { answer })
    }
}

/// Backend that cannot be reached.
struct DownBackend;

impl InventoryBackend for DownBackend {
    fn try_decrement(
        &self,
        _event_id: EventId,
        _quantity: Quantity,
    ) -> BoxFuture<'_, Result<Decrement, StorageError>> {
        Box::pin(async { Err(StorageError::Transient("connection refused".into())) })
    }

    fn remaining(&self, _event_id: EventId) -> BoxFuture<'_, Result<Option<u32>, StorageError>> {
        Box::pin(async { Err(StorageError::Transient("connection refused".into())) })
    }
}

struct Harness {
    server: TestServer,
    inventory: InMemoryInventory,
    recorder: InMemoryBookingRecorder,
}

fn harness_with(
    inventory: InMemoryInventory,
    backend: Arc<dyn InventoryBackend>,
    extractor: Arc<dyn IntentExtractor>,
) -> Harness {
    let recorder = InMemoryBookingRecorder::new(test_clock());
    let store = InventoryStore::new(backend.clone(), Arc::new(recorder.clone()))
        .with_retry_policy(RetryPolicy::no_retry());
    let state = AppState::new(store, Arc::new(inventory.clone()), backend, extractor);
    let server = TestServer::new(build_router(state)).expect("router should start");

    Harness {
        server,
        inventory,
        recorder,
    }
}

fn harness(extractor: Arc<dyn IntentExtractor>) -> Harness {
    let inventory = InMemoryInventory::new();
    harness_with(inventory.clone(), Arc::new(inventory), extractor)
}

fn plain() -> Harness {
    harness(Arc::new(UnconfiguredExtractor))
}

fn book(event: &str, tickets: u32) -> Arc<dyn IntentExtractor> {
    Arc::new(ScriptedExtractor(Ok(BookingIntent::BookTickets {
        event: event.to_string(),
        tickets,
    })))
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn create_then_get_event() {
    let h = plain();

    let created = h
        .server
        .post("/api/events")
        .json(&json!({
            "name": "Fall Concert",
            "date": "2025-11-15",
            "location": "Littlejohn Coliseum",
            "capacity": 250
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["total_capacity"], 250);
    assert_eq!(body["remaining"], 250);

    let id = body["id"].as_i64().unwrap();
    let fetched = h.server.get(&format!("/api/events/{id}")).await;
    fetched.assert_status_ok();
    assert_eq!(fetched.json::<Value>()["name"], "Fall Concert");

    let listed = h.server.get("/api/events").await;
    assert_eq!(listed.json::<Vec<Value>>().len(), 1);
}

#[tokio::test]
async fn create_event_validation() {
    let h = plain();

    let zero = h
        .server
        .post("/api/events")
        .json(&json!({"name": "Gala", "date": "2025-11-15", "location": "Hall", "capacity": 0}))
        .await;
    zero.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(zero.json::<Value>()["code"], "INVALID_ARGUMENT");

    let bad_date = h
        .server
        .post("/api/events")
        .json(&json!({"name": "Gala", "date": "someday", "location": "Hall", "capacity": 5}))
        .await;
    bad_date.assert_status(StatusCode::BAD_REQUEST);
    assert!(h.inventory.is_empty());
}

#[tokio::test]
async fn get_event_errors() {
    let h = plain();

    let missing = h.server.get("/api/events/999").await;
    missing.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["code"], "EVENT_NOT_FOUND");

    h.server
        .get("/api/events/abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Purchase
// ============================================================================

#[tokio::test]
async fn purchase_returns_remaining_and_booking() {
    let h = plain();
    let id = h.inventory.seed("Homecoming", 5);

    let response = h
        .server
        .post(&format!("/api/events/{id}/purchase"))
        .json(&json!({"quantity": 2}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["event_id"], id.get());
    assert_eq!(body["quantity"], 2);
    assert_eq!(body["remaining"], 3);
    assert!(body["booking_id"].is_i64());
    assert_eq!(h.recorder.total_quantity(id), 2);
}

#[tokio::test]
async fn purchase_without_body_buys_one() {
    let h = plain();
    let id = h.inventory.seed("Homecoming", 5);

    let response = h.server.post(&format!("/api/events/{id}/purchase")).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["remaining"], 4);
}

#[tokio::test]
async fn purchase_errors_are_distinguishable() {
    let h = plain();
    let id = h.inventory.seed("Homecoming", 1);

    let cases = [
        (id.get(), json!({"quantity": 0}), StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
        (id.get(), json!({"quantity": -3}), StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
        (999, json!({"quantity": 1}), StatusCode::NOT_FOUND, "EVENT_NOT_FOUND"),
        (id.get(), json!({"quantity": 2}), StatusCode::CONFLICT, "NOT_ENOUGH_INVENTORY"),
    ];

    for (event, body, status, code) in cases {
        let response = h
            .server
            .post(&format!("/api/events/{event}/purchase"))
            .json(&body)
            .await;
        response.assert_status(status);
        assert_eq!(response.json::<Value>()["code"], code, "{body}");
    }

    assert_eq!(h.inventory.remaining_now(id), Some(1));
    assert!(h.recorder.is_empty());
}

#[tokio::test]
async fn storage_outage_is_503() {
    let inventory = InMemoryInventory::new();
    let id = inventory.seed("Homecoming", 5);
    let flaky = FlakyInventory::new(inventory.clone(), usize::MAX);
    let h = harness_with(inventory, Arc::new(flaky), Arc::new(UnconfiguredExtractor));

    let response = h
        .server
        .post(&format!("/api/events/{id}/purchase"))
        .json(&json!({"quantity": 1}))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["code"], "STORAGE_UNAVAILABLE");
    assert_eq!(h.inventory.remaining_now(id), Some(5));
}

#[tokio::test]
async fn sold_out_event_keeps_rejecting() {
    let h = plain();
    let id = h.inventory.seed("Homecoming", 2);
    let path = format!("/api/events/{id}/purchase");

    h.server.post(&path).json(&json!({"quantity": 2})).await.assert_status_ok();
    for _ in 0..3 {
        h.server
            .post(&path)
            .json(&json!({"quantity": 1}))
            .await
            .assert_status(StatusCode::CONFLICT);
    }
    assert_eq!(h.inventory.remaining_now(id), Some(0));
}

// ============================================================================
// Natural-language booking
// ============================================================================

#[tokio::test]
async fn parse_proposes_without_buying() {
    let h = harness(book("Jazz Night", 2));
    let id = h.inventory.seed("Jazz Night", 10);

    let response = h
        .server
        .post("/api/llm/parse")
        .json(&json!({"text": "two tickets for jazz night"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["intent"], "book_tickets");
    assert_eq!(body["event"], "Jazz Night");
    assert_eq!(body["tickets"], 2);
    assert_eq!(
        body["message"],
        "Proposed booking: 2 ticket(s) for \"Jazz Night\". Please confirm."
    );
    assert_eq!(h.inventory.remaining_now(id), Some(10));
    assert_eq!(h.inventory.decrement_calls(), 0);
}

#[tokio::test]
async fn parse_rejects_unknown_or_oversized_proposals() {
    let h = harness(book("Jazz Night", 4));
    h.inventory.seed("Jazz Night", 3);

    let too_many = h.server.post("/api/llm/parse").json(&json!({"text": "4 please"})).await;
    too_many.assert_status(StatusCode::CONFLICT);

    let h = harness(book("Opera", 1));
    let missing = h.server.post("/api/llm/parse").json(&json!({"text": "opera"})).await;
    missing.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["code"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn parse_lists_events_by_date() {
    let date = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
    let h = harness(Arc::new(ScriptedExtractor(Ok(BookingIntent::EventsByDate { date }))));
    h.inventory.seed("Homecoming", 5);
    h.inventory.seed("Jazz Night", 5);

    let response = h
        .server
        .post("/api/llm/parse")
        .json(&json!({"text": "what's on november 15"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["intent"], "events_by_date");
    assert_eq!(body["events"].as_array().unwrap().len(), 2);

    let other = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let h = harness(Arc::new(ScriptedExtractor(Ok(BookingIntent::EventsByDate { date: other }))));
    h.server
        .post("/api/llm/parse")
        .json(&json!({"text": "new year"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn parse_finds_event_by_name_ignoring_case() {
    let h = harness(Arc::new(ScriptedExtractor(Ok(BookingIntent::EventsByName {
        event: "jazz night".to_string(),
    }))));
    h.inventory.seed("Jazz Night", 5);

    let response = h.server.post("/api/llm/parse").json(&json!({"text": "jazz"})).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["events"][0]["name"], "Jazz Night");
}

#[tokio::test]
async fn parse_error_statuses() {
    let h = plain();
    h.server
        .post("/api/llm/parse")
        .json(&json!({"text": "  "}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let unavailable = h.server.post("/api/llm/parse").json(&json!({"text": "book 2"})).await;
    unavailable.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let h = harness(Arc::new(ScriptedExtractor(Err(IntentError::UnknownIntent(
        "refund".to_string(),
    )))));
    h.server
        .post("/api/llm/parse")
        .json(&json!({"text": "refund me"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn confirm_buys_through_purchase_path() {
    let h = plain();
    let id = h.inventory.seed("Jazz Night", 3);

    let response = h
        .server
        .post("/api/llm/confirm")
        .json(&json!({"event": "Jazz Night", "tickets": 2}))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Booking confirmed for 2 ticket(s) to \"Jazz Night\"");
    assert_eq!(body["remaining"], 1);
    assert_eq!(h.inventory.remaining_now(id), Some(1));
    assert_eq!(h.recorder.len(), 1);

    let again = h
        .server
        .post("/api/llm/confirm")
        .json(&json!({"event": "Jazz Night", "tickets": 2}))
        .await;
    again.assert_status(StatusCode::CONFLICT);

    h.server
        .post("/api/llm/confirm")
        .json(&json!({"event": "Opera", "tickets": 1}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    h.server
        .post("/api/llm/confirm")
        .json(&json!({"event": "Jazz Night", "tickets": 0}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Probes and middleware
// ============================================================================

#[tokio::test]
async fn health_and_readiness() {
    let h = plain();
    h.server.get("/health").await.assert_status_ok();

    let ready = h.server.get("/ready").await;
    ready.assert_status_ok();
    assert_eq!(ready.json::<Value>()["ready"], true);

    let down = harness_with(
        InMemoryInventory::new(),
        Arc::new(DownBackend),
        Arc::new(UnconfiguredExtractor),
    );
    let not_ready = down.server.get("/ready").await;
    not_ready.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(not_ready.json::<Value>()["database"], false);
}

#[tokio::test]
async fn responses_carry_correlation_id() {
    let h = plain();
    let response = h.server.get("/api/events").await;
    let header = response.header(CORRELATION_ID_HEADER);
    assert!(uuid::Uuid::parse_str(header.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn purchase_echoes_caller_correlation_id() {
    let h = plain();
    let event = h.inventory.seed("Jazz Night", 3);
    let caller_id = uuid::Uuid::new_v4();

    let response = h
        .server
        .post(&format!("/api/events/{event}/purchase"))
        .add_header(
            axum::http::HeaderName::from_static("x-correlation-id"),
            axum::http::HeaderValue::from_str(&caller_id.to_string()).unwrap(),
        )
        .json(&json!({"quantity": 1}))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header(CORRELATION_ID_HEADER).to_str().unwrap(),
        caller_id.to_string()
    );
}
