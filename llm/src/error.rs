//! Error types for the Messages API client and intent extraction

use thiserror::Error;

/// Errors that can occur when calling the Messages API
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// Missing `ANTHROPIC_API_KEY` environment variable
    #[error("Missing ANTHROPIC_API_KEY environment variable")]
    MissingApiKey,

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Unauthorized - invalid API key
    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
}

/// Errors from turning free text into a [`BookingIntent`](crate::BookingIntent).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntentError {
    /// The user sent blank text.
    #[error("Input text is required")]
    EmptyInput,

    /// The model output was not the expected JSON object.
    #[error("Could not parse model response: {reason}")]
    Unparseable {
        /// What went wrong
        reason: String,
        /// The model output as received
        raw: String,
    },

    /// A field the intent needs was absent or unusable.
    #[error("Missing or invalid field: {0}")]
    MissingField(&'static str),

    /// The model named an intent outside the supported set.
    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    /// The model could not be reached or is not configured.
    #[error("Intent extraction unavailable: {0}")]
    Unavailable(String),
}

impl From<ClaudeError> for IntentError {
    fn from(err: ClaudeError) -> Self {
        Self::Unavailable(err.to_string())
    }
}
