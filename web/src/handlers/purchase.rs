//! `POST /api/events/:id/purchase`

use crate::error::AppError;
use crate::middleware::CorrelationId;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::PathRejection},
};
use serde::{Deserialize, Serialize};
use tigertix_core::{BookingId, EventId, PurchaseOutcome};

/// Purchase request body. An empty body buys one ticket.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Tickets to buy
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

/// Confirmed purchase.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Event the tickets belong to
    pub event_id: EventId,
    /// Tickets bought
    pub quantity: i64,
    /// Tickets left after this purchase
    pub remaining: u32,
    /// Audit record, `null` if it could not be written
    pub booking_id: Option<BookingId>,
}

/// Buy tickets.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/events/1/purchase \
///   -H "Content-Type: application/json" -d '{"quantity":2}'
/// ```
///
/// # Errors
///
/// - 400 `INVALID_ARGUMENT`: bad id, malformed body, quantity < 1
/// - 404 `EVENT_NOT_FOUND`
/// - 409 `NOT_ENOUGH_INVENTORY`
/// - 503 `STORAGE_UNAVAILABLE`
pub async fn purchase(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<Json<PurchaseResponse>, AppError> {
    let Path(id) = id?;
    let event_id = EventId::new(id);
    let request = parse_body(&body)?;

    match state.store.purchase(event_id, request.quantity).await? {
        PurchaseOutcome::Confirmed {
            remaining,
            booking_id,
        } => {
            tracing::info!(
                %correlation_id,
                %event_id,
                quantity = request.quantity,
                ?booking_id,
                "Tickets sold"
            );
            Ok(Json(PurchaseResponse {
                event_id,
                quantity: request.quantity,
                remaining,
                booking_id,
            }))
        }
        PurchaseOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

fn parse_body(body: &[u8]) -> Result<PurchaseRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PurchaseRequest {
            quantity: default_quantity(),
        });
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_argument(format!("Invalid purchase request: {e}")))
}
