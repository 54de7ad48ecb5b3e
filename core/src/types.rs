//! Identifiers and validated value types.

use crate::inventory::PurchaseError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
///
/// Assigned by storage when the event is created and never changed afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Wrap a raw storage key.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw storage key.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking audit record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(i64);

impl BookingId {
    /// Wrap a raw storage key.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw storage key.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Quantities
// ============================================================================

/// Largest quantity or capacity the SQL schemas can hold (`INTEGER` column).
pub const MAX_TICKETS: u32 = i32::MAX.unsigned_abs();

/// A validated purchase quantity in `1..=MAX_TICKETS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Validate a caller-supplied quantity.
    ///
    /// Accepts a signed value so that negative input coming off the wire is
    /// reported as a caller error instead of wrapping.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::InvalidArgument`] if `raw < 1` or `raw > MAX_TICKETS`.
    pub fn new(raw: i64) -> Result<Self, PurchaseError> {
        if raw < 1 {
            return Err(PurchaseError::InvalidArgument(format!(
                "quantity must be at least 1, got {raw}"
            )));
        }
        u32::try_from(raw)
            .ok()
            .filter(|q| *q <= MAX_TICKETS)
            .map(Self)
            .ok_or_else(|| {
                PurchaseError::InvalidArgument(format!(
                    "quantity must not exceed {MAX_TICKETS}, got {raw}"
                ))
            })
    }

    /// Get the quantity.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
