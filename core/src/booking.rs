//! Booking audit records.
//!
//! A booking is appended after a confirmed decrement. Losing one is
//! acceptable; the ticket count is authoritative, the audit trail is not.

use crate::BoxFuture;
use crate::error::StorageError;
use crate::types::{BookingId, EventId, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a booking.
///
/// Only `Confirmed` bookings are produced; there is no cancellation flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Tickets were decremented for this booking.
    Confirmed,
}

impl BookingStatus {
    /// Convert status to its stored string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
        }
    }

    /// Parse a stored status.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Fatal`] if the string is not a known status.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            _ => Err(StorageError::Fatal(format!("Invalid booking status: {s}"))),
        }
    }
}

/// One confirmed purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Storage-assigned identifier
    pub id: BookingId,
    /// Event the tickets belong to
    pub event_id: EventId,
    /// Number of tickets
    pub quantity: u32,
    /// Always [`BookingStatus::Confirmed`]
    pub status: BookingStatus,
    /// When the record was written
    pub created_at: DateTime<Utc>,
}

/// Append-only sink for booking records.
pub trait BookingRecorder: Send + Sync {
    /// Record a confirmed purchase.
    ///
    /// Called once per confirmed decrement. Callers must not undo the
    /// decrement when this fails.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the record could not be written.
    fn record(
        &self,
        event_id: EventId,
        quantity: Quantity,
    ) -> BoxFuture<'_, Result<BookingId, StorageError>>;
}
