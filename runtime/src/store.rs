//! The purchase entry point.
//!
//! [`InventoryStore`] is the only way the rest of TigerTix decrements ticket
//! counts. It validates the request, runs the backend's atomic decrement under
//! a bounded retry policy, and records a booking for each confirmed purchase.

use crate::metrics::PurchaseMetrics;
use crate::retry::{RetryPolicy, retry_with_predicate};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tigertix_core::{
    BookingId, BookingRecorder, Decrement, EventId, InventoryBackend, PurchaseError,
    PurchaseOutcome, Quantity, Rejection, StorageError,
};

/// Concurrency-safe ticket inventory.
///
/// Cheap to clone; all clones share the same backend and recorder.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tigertix_runtime::InventoryStore;
/// use tigertix_testing::{InMemoryBookingRecorder, InMemoryInventory, test_clock};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let inventory = InMemoryInventory::new();
/// let event = inventory.seed("Clemson vs. USC", 2);
/// let store = InventoryStore::new(
///     Arc::new(inventory),
///     Arc::new(InMemoryBookingRecorder::new(test_clock())),
/// );
///
/// let outcome = store.purchase(event, 2).await?;
/// assert_eq!(outcome.remaining(), Some(0));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InventoryStore {
    backend: Arc<dyn InventoryBackend>,
    recorder: Arc<dyn BookingRecorder>,
    policy: RetryPolicy,
}

impl InventoryStore {
    /// Create a store with the default [`RetryPolicy`].
    #[must_use]
    pub fn new(backend: Arc<dyn InventoryBackend>, recorder: Arc<dyn BookingRecorder>) -> Self {
        Self {
            backend,
            recorder,
            policy: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy used for transient storage errors.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Buy `quantity` tickets for `event_id`.
    ///
    /// Either all requested tickets are decremented or none are. A rejection
    /// (`NotEnoughInventory`, `EventNotFound`) leaves the counter untouched
    /// and is never retried. Transient storage errors are retried up to the
    /// policy limit.
    ///
    /// A booking is recorded once per confirmed purchase. If recording fails
    /// the purchase still stands and `booking_id` is `None`.
    ///
    /// # Errors
    ///
    /// - [`PurchaseError::InvalidArgument`]: `quantity` is not a positive
    ///   ticket count; storage is not touched
    /// - [`PurchaseError::StorageUnavailable`]: storage failed on every
    ///   allowed attempt, or failed with a non-transient error. After
    ///   [`StorageError::Indeterminate`] the decrement may have been applied;
    ///   call [`remaining`](Self::remaining) to find out
    #[tracing::instrument(skip(self))]
    pub async fn purchase(
        &self,
        event_id: EventId,
        quantity: i64,
    ) -> Result<PurchaseOutcome, PurchaseError> {
        let quantity = Quantity::new(quantity).inspect_err(|err| {
            tracing::debug!(error = %err, "Rejected purchase request");
            PurchaseMetrics::record_outcome("invalid_argument");
        })?;

        let started = Instant::now();
        let attempts = AtomicUsize::new(0);

        let result = retry_with_predicate(
            &self.policy,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                self.backend.try_decrement(event_id, quantity)
            },
            StorageError::is_transient,
        )
        .await;

        let attempts = attempts.into_inner();
        PurchaseMetrics::record_retries(attempts.saturating_sub(1));

        let decrement = match result {
            Ok(decrement) => decrement,
            Err(err @ StorageError::Indeterminate(_)) => {
                tracing::error!(
                    attempts,
                    error = %err,
                    "Purchase outcome unknown: connection lost mid-statement, not retried"
                );
                PurchaseMetrics::record_outcome("indeterminate");
                PurchaseMetrics::record_duration(started.elapsed());
                return Err(PurchaseError::StorageUnavailable {
                    attempts,
                    reason: err.to_string(),
                });
            }
            Err(err) => {
                tracing::error!(attempts, error = %err, "Purchase failed: storage unavailable");
                PurchaseMetrics::record_outcome("storage_unavailable");
                PurchaseMetrics::record_duration(started.elapsed());
                return Err(PurchaseError::StorageUnavailable {
                    attempts,
                    reason: err.to_string(),
                });
            }
        };

        let outcome = match decrement {
            Decrement::Applied { remaining } => {
                let booking_id = self.record_booking(event_id, quantity).await;
                tracing::info!(
                    quantity = quantity.get(),
                    remaining,
                    attempts,
                    "Purchase confirmed"
                );
                PurchaseMetrics::record_outcome("confirmed");
                PurchaseMetrics::record_tickets_sold(quantity.get());
                PurchaseOutcome::Confirmed {
                    remaining,
                    booking_id,
                }
            }
            Decrement::Insufficient => {
                tracing::debug!(quantity = quantity.get(), "Purchase rejected: not enough tickets");
                PurchaseMetrics::record_outcome("not_enough_inventory");
                PurchaseOutcome::Rejected(Rejection::NotEnoughInventory)
            }
            Decrement::Missing => {
                tracing::debug!("Purchase rejected: event not found");
                PurchaseMetrics::record_outcome("event_not_found");
                PurchaseOutcome::Rejected(Rejection::EventNotFound)
            }
        };

        PurchaseMetrics::record_duration(started.elapsed());
        Ok(outcome)
    }

    /// Current remaining tickets for an event, or `None` if it does not exist.
    ///
    /// The value may be stale by the time the caller acts on it; only
    /// [`purchase`](Self::purchase) is authoritative.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read fails.
    pub async fn remaining(&self, event_id: EventId) -> Result<Option<u32>, StorageError> {
        self.backend.remaining(event_id).await
    }

    async fn record_booking(&self, event_id: EventId, quantity: Quantity) -> Option<BookingId> {
        match self.recorder.record(event_id, quantity).await {
            Ok(booking_id) => {
                tracing::debug!(%booking_id, "Booking recorded");
                Some(booking_id)
            }
            Err(err) => {
                // The decrement already committed; it is not undone.
                tracing::warn!(error = %err, "Failed to record booking for confirmed purchase");
                PurchaseMetrics::record_booking_failure();
                None
            }
        }
    }
}

impl std::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
