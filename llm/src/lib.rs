//! Natural-language booking for `TigerTix`.
//!
//! A thin Messages API client ([`AnthropicClient`]) and the intent layer on
//! top of it ([`IntentExtractor`], [`BookingIntent`]).
//!
//! # Example
//!
//! ```no_run
//! use tigertix_llm::{AnthropicClient, ClaudeIntentExtractor, IntentExtractor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = ClaudeIntentExtractor::new(AnthropicClient::from_env()?);
//! let intent = extractor.extract("two tickets for jazz night please").await?;
//! println!("{intent:?}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod intent;
pub mod messages;
pub mod types;

pub use client::AnthropicClient;
pub use error::{ClaudeError, IntentError};
pub use intent::{
    BookingIntent, ClaudeIntentExtractor, IntentExtractor, UnconfiguredExtractor,
    parse_intent_response,
};
pub use messages::{MessagesRequest, MessagesResponse};
pub use types::{ContentBlock, Message, Role, StopReason, Usage};
