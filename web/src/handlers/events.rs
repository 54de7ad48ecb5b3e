//! Event catalog endpoints.
//!
//! - `POST /api/events` - create an event
//! - `GET /api/events` - list events
//! - `GET /api/events/:id` - one event

use crate::WebResult;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tigertix_core::{Event, EventId, NewEvent};
use tigertix_runtime::metrics::CatalogMetrics;

/// Request to create an event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Display name
    pub name: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: NaiveDate,
    /// Venue
    pub location: String,
    /// Tickets to issue
    pub capacity: i64,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(request: CreateEventRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            date: request.date,
            location: request.location.trim().to_string(),
            capacity: request.capacity,
        }
    }
}

/// Create an event with `remaining` equal to its capacity.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events \
///   -H "Content-Type: application/json" \
///   -d '{"name":"Fall Concert","date":"2025-11-15","location":"Littlejohn Coliseum","capacity":250}'
/// ```
///
/// # Errors
///
/// 400 for a malformed body or failed validation, 503 if storage fails.
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let Json(request) = payload?;
    let event = state.catalog.create_event(request.into()).await?;

    CatalogMetrics::record_event_created();
    tracing::info!(
        event_id = %event.id,
        name = %event.name,
        capacity = event.total_capacity,
        "Event created"
    );

    Ok((StatusCode::CREATED, Json(event)))
}

/// List all events, ordered by id.
///
/// # Errors
///
/// 503 if storage fails.
pub async fn list_events(State(state): State<AppState>) -> WebResult<Json<Vec<Event>>> {
    Ok(Json(state.catalog.list_events().await?))
}

/// Get one event.
///
/// # Errors
///
/// 400 for a non-numeric id, 404 for an unknown event, 503 if storage fails.
pub async fn get_event(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> WebResult<Json<Event>> {
    let Path(id) = id?;
    let event_id = EventId::new(id);

    state
        .catalog
        .get_event(event_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::event_not_found(event_id))
}
