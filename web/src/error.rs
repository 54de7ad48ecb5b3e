//! Error types for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses. Every purchase
//! failure maps to its own status and machine-readable code so clients can
//! tell a sold-out event from a storage outage.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use tigertix_core::{CatalogError, PurchaseError, Rejection};
use tigertix_llm::IntentError;

/// Code for malformed requests.
pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
/// Code for unknown events.
pub const EVENT_NOT_FOUND: &str = "EVENT_NOT_FOUND";
/// Code for purchases larger than what remains.
pub const NOT_ENOUGH_INVENTORY: &str = "NOT_ENOUGH_INVENTORY";
/// Code for storage failures that outlasted retries.
pub const STORAGE_UNAVAILABLE: &str = "STORAGE_UNAVAILABLE";
/// Code for text the assistant could not turn into an intent.
pub const UNRECOGNIZED_REQUEST: &str = "UNRECOGNIZED_REQUEST";
/// Code for a missing or failing language model.
pub const ASSISTANT_UNAVAILABLE: &str = "ASSISTANT_UNAVAILABLE";

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Event>, AppError> {
///     let event = state.catalog.get_event(id).await?
///         .ok_or_else(|| AppError::event_not_found(id))?;
///     Ok(Json(event))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 `INVALID_ARGUMENT`.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), INVALID_ARGUMENT)
    }

    /// 404 `EVENT_NOT_FOUND`.
    #[must_use]
    pub fn event_not_found(event: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("Event {event} not found"),
            EVENT_NOT_FOUND,
        )
    }

    /// 409 `NOT_ENOUGH_INVENTORY`.
    #[must_use]
    pub fn not_enough_inventory(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), NOT_ENOUGH_INVENTORY)
    }

    /// 503 `STORAGE_UNAVAILABLE`.
    #[must_use]
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            STORAGE_UNAVAILABLE,
        )
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Request failed"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::NotEnoughInventory => Self::not_enough_inventory("Not enough tickets available"),
            Rejection::EventNotFound => {
                Self::new(StatusCode::NOT_FOUND, "Event not found".to_string(), EVENT_NOT_FOUND)
            }
        }
    }
}

impl From<PurchaseError> for AppError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::InvalidArgument(message) => Self::invalid_argument(message),
            err @ PurchaseError::StorageUnavailable { .. } => {
                Self::storage_unavailable("Ticket storage is temporarily unavailable, try again")
                    .with_source(anyhow::Error::new(err))
            }
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidArgument(message) => Self::invalid_argument(message),
            CatalogError::Storage(source) => {
                Self::storage_unavailable("Event storage is temporarily unavailable, try again")
                    .with_source(anyhow::Error::new(source))
            }
        }
    }
}

impl From<IntentError> for AppError {
    fn from(err: IntentError) -> Self {
        match err {
            IntentError::EmptyInput => Self::invalid_argument(err.to_string()),
            IntentError::Unparseable { .. }
            | IntentError::MissingField(_)
            | IntentError::UnknownIntent(_) => Self::new(
                StatusCode::BAD_REQUEST,
                format!("Could not understand the request: {err}"),
                UNRECOGNIZED_REQUEST,
            ),
            IntentError::Unavailable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "The booking assistant is unavailable".to_string(),
                ASSISTANT_UNAVAILABLE,
            )
            .with_source(anyhow::Error::new(err)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_argument(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_argument(rejection.body_text())
    }
}
