//! Inventory backend trait and purchase outcome types.
//!
//! This module defines the storage abstraction behind ticket purchases: a
//! backend that can perform one atomic "decrement if available" step on a
//! single event's `remaining` counter.
//!
//! # Design
//!
//! The check (`remaining >= quantity`) and the decrement happen in one
//! indivisible storage operation. Backends never read the counter, compare in
//! application code and then write it back; two concurrent readers could both
//! observe enough tickets and jointly oversell.
//!
//! # Implementations
//!
//! - `PostgresInventory` (in `tigertix-postgres`): single-statement conditional `UPDATE`
//! - `SqliteInventory` (in `tigertix-sqlite`): conditional `UPDATE ... RETURNING`
//! - `InMemoryInventory` (in `tigertix-testing`): compare-and-swap on an atomic counter
//!
//! Callers go through `InventoryStore` (in `tigertix-runtime`), which adds
//! argument validation, bounded retries and booking records.

use crate::BoxFuture;
use crate::error::StorageError;
use crate::types::{BookingId, EventId, Quantity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of one atomic conditional decrement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decrement {
    /// The decrement committed; `remaining` is the new count.
    Applied {
        /// Tickets left after this decrement
        remaining: u32,
    },
    /// The event exists but has fewer than the requested tickets. Nothing changed.
    Insufficient,
    /// No event with this id exists. Nothing changed.
    Missing,
}

/// Storage that owns the per-event `remaining` counter.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; they are shared behind `Arc` by
/// every request handler.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures instead of using `async fn` so the store can
/// hold an `Arc<dyn InventoryBackend>`.
pub trait InventoryBackend: Send + Sync {
    /// Atomically decrement `remaining` by `quantity` if at least `quantity`
    /// tickets are left.
    ///
    /// The check and the write must be a single storage-level atomic
    /// operation keyed on `event_id`. Only [`StorageError::Indeterminate`]
    /// leaves the commit state unknown; every other error means nothing was
    /// written.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Transient`]: the statement provably did not commit,
    ///   safe to re-run
    /// - [`StorageError::Indeterminate`]: the connection dropped mid-statement
    /// - [`StorageError::Fatal`]: anything else
    fn try_decrement(
        &self,
        event_id: EventId,
        quantity: Quantity,
    ) -> BoxFuture<'_, Result<Decrement, StorageError>>;

    /// Read the current `remaining` count, or `None` for an unknown event.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read fails.
    fn remaining(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<u32>, StorageError>>;

    /// Check that storage is reachable. Used by readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if storage cannot serve a trivial read.
    fn ping(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move { self.remaining(EventId::new(0)).await.map(|_| ()) })
    }
}

/// Why a purchase was turned down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Fewer tickets remain than were requested.
    NotEnoughInventory,
    /// The event id does not exist.
    EventNotFound,
}

impl Rejection {
    /// Human readable reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotEnoughInventory => "not enough tickets available",
            Self::EventNotFound => "event not found",
        }
    }
}

/// Business outcome of a purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// The tickets were decremented.
    Confirmed {
        /// Tickets left after this purchase
        remaining: u32,
        /// Audit record id, `None` if recording the booking failed
        booking_id: Option<BookingId>,
    },
    /// The purchase did not happen; inventory is unchanged.
    Rejected(Rejection),
}

impl PurchaseOutcome {
    /// Whether tickets were decremented.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    /// New remaining count for a confirmed purchase.
    #[must_use]
    pub const fn remaining(&self) -> Option<u32> {
        match self {
            Self::Confirmed { remaining, .. } => Some(*remaining),
            Self::Rejected(_) => None,
        }
    }
}

/// Errors from the purchase path that are not business rejections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    /// Malformed input (non-positive quantity, missing event id).
    ///
    /// Reported before storage is touched and never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage kept failing after bounded retries.
    ///
    /// The whole purchase may be retried later. The decrement did not commit
    /// on any attempt that returned an error.
    #[error("Storage unavailable after {attempts} attempt(s): {reason}")]
    StorageUnavailable {
        /// Number of times the atomic statement was executed
        attempts: usize,
        /// Last storage error
        reason: String,
    },
}
