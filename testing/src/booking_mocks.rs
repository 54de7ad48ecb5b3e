//! Booking recorder mocks.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tigertix_core::environment::Clock;
use tigertix_core::{
    Booking, BookingId, BookingRecorder, BookingStatus, BoxFuture, EventId, Quantity,
    StorageError,
};

/// Booking recorder that keeps every record in memory.
///
/// # Example
///
/// ```
/// use tigertix_testing::{InMemoryBookingRecorder, test_clock};
/// use tigertix_core::{BookingRecorder, EventId, Quantity};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let recorder = InMemoryBookingRecorder::new(test_clock());
/// recorder.record(EventId::new(1), Quantity::new(2)?).await?;
/// assert_eq!(recorder.total_quantity(EventId::new(1)), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryBookingRecorder {
    bookings: Arc<RwLock<Vec<Booking>>>,
    next_id: Arc<AtomicI64>,
    clock: Arc<dyn Clock>,
}

impl InMemoryBookingRecorder {
    /// Create an empty recorder stamping records with `clock`.
    #[must_use]
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            bookings: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            clock: Arc::new(clock),
        }
    }

    /// All bookings, in recording order.
    #[must_use]
    pub fn bookings(&self) -> Vec<Booking> {
        self.bookings.read().unwrap().clone()
    }

    /// Number of bookings recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bookings.read().unwrap().len()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bookings.read().unwrap().is_empty()
    }

    /// Sum of booked quantities for one event.
    #[must_use]
    pub fn total_quantity(&self, event_id: EventId) -> u64 {
        self.bookings
            .read()
            .unwrap()
            .iter()
            .filter(|booking| booking.event_id == event_id)
            .map(|booking| u64::from(booking.quantity))
            .sum()
    }
}

impl std::fmt::Debug for InMemoryBookingRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBookingRecorder")
            .field("bookings", &self.len())
            .finish_non_exhaustive()
    }
}

impl BookingRecorder for InMemoryBookingRecorder {
    fn record(
        &self,
        event_id: EventId,
        quantity: Quantity,
    ) -> BoxFuture<'_, Result<BookingId, StorageError>> {
        Box::pin(async move {
            let id = BookingId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
            let booking = Booking {
                id,
                event_id,
                quantity: quantity.get(),
                status: BookingStatus::Confirmed,
                created_at: self.clock.now(),
            };
            self.bookings
                .write()
                .map_err(|_| StorageError::Fatal("booking lock poisoned".into()))?
                .push(booking);
            Ok(id)
        })
    }
}

/// Booking recorder whose writes always fail.
///
/// Used to check that a lost audit record never undoes a decrement.
#[derive(Debug, Default)]
pub struct FailingBookingRecorder {
    calls: AtomicUsize,
}

impl FailingBookingRecorder {
    /// Create a failing recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of record attempts.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BookingRecorder for FailingBookingRecorder {
    fn record(
        &self,
        _event_id: EventId,
        _quantity: Quantity,
    ) -> BoxFuture<'_, Result<BookingId, StorageError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(StorageError::Fatal("bookings table unavailable".into())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_clock;

    #[tokio::test]
    async fn records_are_stamped_and_numbered() {
        let recorder = InMemoryBookingRecorder::new(test_clock());
        let first = recorder
            .record(EventId::new(7), Quantity::new(3).unwrap())
            .await
            .unwrap();
        let second = recorder
            .record(EventId::new(7), Quantity::new(1).unwrap())
            .await
            .unwrap();

        assert_eq!(first, BookingId::new(1));
        assert_eq!(second, BookingId::new(2));
        assert_eq!(recorder.total_quantity(EventId::new(7)), 4);

        let bookings = recorder.bookings();
        assert_eq!(bookings[0].created_at, test_clock().now());
        assert_eq!(bookings[0].status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn failing_recorder_counts_calls() {
        let recorder = FailingBookingRecorder::new();
        assert!(
            recorder
                .record(EventId::new(1), Quantity::new(1).unwrap())
                .await
                .is_err()
        );
        assert_eq!(recorder.calls(), 1);
    }
}
