//! Natural-language booking intents.
//!
//! A user types something like "book two tickets for the Jazz Night". The
//! model is asked for a small JSON object:
//!
//! ```json
//! { "intent": "book_tickets", "event": "Jazz Night", "tickets": 2 }
//! ```
//!
//! [`parse_intent_response`] turns that text into a [`BookingIntent`]. The
//! extraction never touches inventory; booking happens only after the user
//! confirms, through the regular purchase path.

use crate::client::AnthropicClient;
use crate::error::IntentError;
use crate::messages::{DEFAULT_MODEL, MessagesRequest};
use crate::types::Message;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tigertix_core::BoxFuture;

const MAX_TOKENS: u32 = 500;

const SYSTEM_PROMPT: &str = r#"You are a ticket-booking assistant.
Extract ONLY valid JSON with these keys:
- "intent": one of ["book_tickets", "events_by_name", "events_by_date"]
- "event": string (if applicable); fix spelling errors and capitalize the first letter of each word if necessary
- "tickets": integer (if applicable)
- "date": string in YYYY-MM-DD format (if applicable)
Return only the JSON, nothing else."#;

/// What the user asked for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum BookingIntent {
    /// Buy `tickets` tickets for the event named `event`.
    BookTickets {
        /// Event name as the model normalized it
        event: String,
        /// Requested ticket count, at least 1
        tickets: u32,
    },
    /// Show the event with this name.
    EventsByName {
        /// Event name as the model normalized it
        event: String,
    },
    /// Show events on this date.
    EventsByDate {
        /// Calendar date
        date: NaiveDate,
    },
}

#[derive(Deserialize)]
struct RawIntent {
    intent: Option<String>,
    event: Option<String>,
    tickets: Option<i64>,
    date: Option<String>,
}

/// Parse model output into a [`BookingIntent`].
///
/// Markdown code fences around the JSON are ignored.
///
/// # Errors
///
/// - [`IntentError::Unparseable`]: not a JSON object of the expected shape, or a malformed date
/// - [`IntentError::MissingField`]: the intent lacks a field it needs
/// - [`IntentError::UnknownIntent`]: `intent` is not one of the supported values
pub fn parse_intent_response(raw: &str) -> Result<BookingIntent, IntentError> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let parsed: RawIntent =
        serde_json::from_str(cleaned.trim()).map_err(|e| IntentError::Unparseable {
            reason: e.to_string(),
            raw: raw.to_string(),
        })?;

    let event = parsed
        .event
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    match parsed.intent.as_deref().map(str::trim) {
        Some("book_tickets") => {
            let event = event.ok_or(IntentError::MissingField("event"))?;
            let tickets = parsed
                .tickets
                .and_then(|t| u32::try_from(t).ok())
                .filter(|&t| t >= 1)
                .ok_or(IntentError::MissingField("tickets"))?;
            Ok(BookingIntent::BookTickets { event, tickets })
        }
        Some("events_by_name") => Ok(BookingIntent::EventsByName {
            event: event.ok_or(IntentError::MissingField("event"))?,
        }),
        Some("events_by_date") => {
            let date = parsed.date.ok_or(IntentError::MissingField("date"))?;
            let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
                IntentError::Unparseable {
                    reason: format!("invalid date {date:?}: {e}"),
                    raw: raw.to_string(),
                }
            })?;
            Ok(BookingIntent::EventsByDate { date })
        }
        Some(other) => Err(IntentError::UnknownIntent(other.to_string())),
        None => Err(IntentError::MissingField("intent")),
    }
}

/// Turns free text into a [`BookingIntent`].
pub trait IntentExtractor: Send + Sync {
    /// Extract the intent behind `text`.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError`] for blank input, unusable model output, or
    /// when the model cannot be reached.
    fn extract<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<BookingIntent, IntentError>>;
}

/// [`IntentExtractor`] backed by the Messages API.
#[derive(Clone, Debug)]
pub struct ClaudeIntentExtractor {
    client: AnthropicClient,
    model: String,
}

impl ClaudeIntentExtractor {
    /// Create an extractor using the default model.
    #[must_use]
    pub fn new(client: AnthropicClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Use a different model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl IntentExtractor for ClaudeIntentExtractor {
    fn extract<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<BookingIntent, IntentError>> {
        Box::pin(async move {
            let text = text.trim();
            if text.is_empty() {
                return Err(IntentError::EmptyInput);
            }

            let request = MessagesRequest::new(vec![Message::user(format!("Input: {text:?}"))])
                .with_model(self.model.as_str())
                .with_system(SYSTEM_PROMPT)
                .with_max_tokens(MAX_TOKENS)
                .with_temperature(0.0);

            let response = self.client.messages(request).await.map_err(|err| {
                tracing::warn!(error = %err, "Intent extraction request failed");
                IntentError::from(err)
            })?;

            let raw = response.first_text().ok_or_else(|| IntentError::Unparseable {
                reason: "response contained no text".to_string(),
                raw: String::new(),
            })?;
            tracing::debug!(raw, "Model response");

            parse_intent_response(raw)
        })
    }
}

/// [`IntentExtractor`] used when no API key is configured.
///
/// Every call fails with [`IntentError::Unavailable`], except blank input
/// which is still reported as [`IntentError::EmptyInput`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredExtractor;

impl IntentExtractor for UnconfiguredExtractor {
    fn extract<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<BookingIntent, IntentError>> {
        Box::pin(async move {
            if text.trim().is_empty() {
                return Err(IntentError::EmptyInput);
            }
            Err(IntentError::Unavailable(
                "no language model is configured (set ANTHROPIC_API_KEY)".to_string(),
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn book_tickets_inside_code_fence() {
        let raw = "```json\n{\"intent\":\"book_tickets\",\"event\":\"Jazz Night\",\"tickets\":2}\n```";
        assert_eq!(
            parse_intent_response(raw).unwrap(),
            BookingIntent::BookTickets {
                event: "Jazz Night".to_string(),
                tickets: 2,
            }
        );
    }

    #[test]
    fn book_tickets_requires_positive_tickets() {
        for raw in [
            r#"{"intent":"book_tickets","event":"Gala"}"#,
            r#"{"intent":"book_tickets","event":"Gala","tickets":0}"#,
            r#"{"intent":"book_tickets","event":"Gala","tickets":-4}"#,
        ] {
            assert_eq!(
                parse_intent_response(raw),
                Err(IntentError::MissingField("tickets")),
                "{raw}"
            );
        }
    }

    #[test]
    fn book_tickets_requires_event() {
        assert_eq!(
            parse_intent_response(r#"{"intent":"book_tickets","event":"  ","tickets":1}"#),
            Err(IntentError::MissingField("event"))
        );
    }

    #[test]
    fn events_by_date() {
        assert_eq!(
            parse_intent_response(r#"{"intent":"events_by_date","date":"2025-11-15"}"#).unwrap(),
            BookingIntent::EventsByDate {
                date: NaiveDate::from_ymd_opt(2025, 11, 15).unwrap(),
            }
        );
        assert!(matches!(
            parse_intent_response(r#"{"intent":"events_by_date","date":"next friday"}"#),
            Err(IntentError::Unparseable { .. })
        ));
    }

    #[test]
    fn events_by_name() {
        assert_eq!(
            parse_intent_response(r#"{"intent":"events_by_name","event":"Homecoming"}"#).unwrap(),
            BookingIntent::EventsByName {
                event: "Homecoming".to_string(),
            }
        );
    }

    #[test]
    fn unknown_and_missing_intents() {
        assert_eq!(
            parse_intent_response(r#"{"intent":"cancel_booking"}"#),
            Err(IntentError::UnknownIntent("cancel_booking".to_string()))
        );
        assert_eq!(
            parse_intent_response(r#"{"event":"Gala"}"#),
            Err(IntentError::MissingField("intent"))
        );
    }

    #[test]
    fn prose_is_unparseable() {
        let err = parse_intent_response("Sure! Here is your booking.").unwrap_err();
        assert!(matches!(err, IntentError::Unparseable { raw, .. } if raw.starts_with("Sure")));
    }

    #[test]
    fn intent_serializes_with_tag() {
        let json = serde_json::to_value(BookingIntent::BookTickets {
            event: "Gala".to_string(),
            tickets: 3,
        })
        .unwrap();
        assert_eq!(json["intent"], "book_tickets");
        assert_eq!(json["tickets"], 3);
    }

    #[tokio::test]
    async fn unconfigured_extractor() {
        let extractor = UnconfiguredExtractor;
        assert_eq!(extractor.extract("   ").await, Err(IntentError::EmptyInput));
        assert!(matches!(
            extractor.extract("book 2 tickets").await,
            Err(IntentError::Unavailable(_))
        ));
    }
}
