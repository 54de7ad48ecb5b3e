//! Natural-language booking assistant.
//!
//! Two steps, so nothing is bought on a misheard request:
//!
//! 1. `POST /api/llm/parse` turns free text into a proposal or an event
//!    listing. Inventory is only read.
//! 2. `POST /api/llm/confirm` buys the proposed tickets through the regular
//!    purchase path.

use crate::error::AppError;
use crate::middleware::CorrelationId;
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tigertix_core::{BookingId, Event, EventId, PurchaseOutcome};
use tigertix_llm::BookingIntent;

/// Free text from the user.
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    /// What the user typed
    #[serde(default)]
    pub text: String,
}

/// Result of interpreting the user's text.
#[derive(Debug, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ParseResponse {
    /// A booking waiting for confirmation.
    BookTickets {
        /// Event name as stored
        event: String,
        /// Event id
        event_id: EventId,
        /// Tickets requested
        tickets: u32,
        /// Tickets currently left
        remaining: u32,
        /// Prompt for the user
        message: String,
    },
    /// The event matching a name.
    EventsByName {
        /// Matching events
        events: Vec<Event>,
    },
    /// Events on a date.
    EventsByDate {
        /// Requested date
        date: NaiveDate,
        /// Matching events
        events: Vec<Event>,
    },
}

/// Interpret free text. Never changes inventory.
///
/// # Errors
///
/// - 400 for blank or unintelligible text
/// - 404 `EVENT_NOT_FOUND` when nothing matches
/// - 409 `NOT_ENOUGH_INVENTORY` when the proposal exceeds what is left
/// - 503 when the assistant or storage is unavailable
pub async fn parse(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<ParseResponse>, AppError> {
    let Json(request) = payload?;
    let intent = state.extractor.extract(&request.text).await?;
    tracing::debug!(?intent, "Interpreted request");

    let response = match intent {
        BookingIntent::BookTickets { event, tickets } => {
            let found = find_event(&state, &event).await?;
            if found.remaining < tickets {
                return Err(AppError::not_enough_inventory(format!(
                    "Only {} ticket(s) left for \"{}\"",
                    found.remaining, found.name
                )));
            }
            ParseResponse::BookTickets {
                message: format!(
                    "Proposed booking: {tickets} ticket(s) for \"{}\". Please confirm.",
                    found.name
                ),
                event: found.name,
                event_id: found.id,
                tickets,
                remaining: found.remaining,
            }
        }
        BookingIntent::EventsByName { event } => ParseResponse::EventsByName {
            events: vec![find_event(&state, &event).await?],
        },
        BookingIntent::EventsByDate { date } => {
            let events = state.catalog.events_on(date).await?;
            if events.is_empty() {
                return Err(AppError::new(
                    StatusCode::NOT_FOUND,
                    format!("No events found on {date}"),
                    crate::error::EVENT_NOT_FOUND,
                ));
            }
            ParseResponse::EventsByDate { date, events }
        }
    };

    Ok(Json(response))
}

/// A proposal the user accepted.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    /// Event name from the proposal
    pub event: String,
    /// Tickets to buy
    pub tickets: i64,
}

/// Confirmed booking.
#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    /// Summary for the user
    pub message: String,
    /// Event id
    pub event_id: EventId,
    /// Tickets bought
    pub tickets: i64,
    /// Tickets left after this purchase
    pub remaining: u32,
    /// Audit record, `null` if it could not be written
    pub booking_id: Option<BookingId>,
}

/// Buy the tickets from an accepted proposal.
///
/// # Errors
///
/// Same mapping as the purchase endpoint; 404 when no event has this name.
pub async fn confirm(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConfirmResponse>), AppError> {
    let Json(request) = payload?;
    let event = find_event(&state, &request.event).await?;

    match state.store.purchase(event.id, request.tickets).await? {
        PurchaseOutcome::Confirmed {
            remaining,
            booking_id,
        } => {
            tracing::info!(
                %correlation_id,
                event_id = %event.id,
                tickets = request.tickets,
                ?booking_id,
                "Assistant booking confirmed"
            );
            Ok((
                StatusCode::CREATED,
                Json(ConfirmResponse {
                    message: format!(
                        "Booking confirmed for {} ticket(s) to \"{}\"",
                        request.tickets, event.name
                    ),
                    event_id: event.id,
                    tickets: request.tickets,
                    remaining,
                    booking_id,
                }),
            ))
        }
        PurchaseOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

async fn find_event(state: &AppState, name: &str) -> Result<Event, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_argument("event name is required"));
    }
    state
        .catalog
        .find_by_name(name)
        .await?
        .ok_or_else(|| AppError::event_not_found(format_args!("\"{name}\"")))
}
