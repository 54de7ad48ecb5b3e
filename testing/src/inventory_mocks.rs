//! In-memory inventory storage for fast, deterministic tests.
//!
//! - [`InMemoryInventory`]: catalog + inventory backend on atomic counters
//! - [`FlakyInventory`]: wraps a backend and injects storage failures

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tigertix_core::{
    BoxFuture, CatalogError, Decrement, Event, EventCatalog, EventId, InventoryBackend, NewEvent,
    Quantity, StorageError,
};

/// Metadata is immutable; only `remaining` changes, and only via CAS.
#[derive(Debug)]
struct Slot {
    id: EventId,
    name: String,
    date: NaiveDate,
    location: String,
    total_capacity: u32,
    remaining: AtomicU32,
}

impl Slot {
    fn snapshot(&self) -> Event {
        Event {
            id: self.id,
            name: self.name.clone(),
            date: self.date,
            location: self.location.clone(),
            total_capacity: self.total_capacity,
            remaining: self.remaining.load(Ordering::Acquire),
        }
    }
}

/// In-memory event catalog and inventory backend.
///
/// Each event's `remaining` count is an `AtomicU32`. A decrement is a single
/// compare-and-swap that only succeeds when enough tickets are left, so
/// concurrent purchasers can never jointly oversell. The map lock only
/// protects the set of events, never the counters.
///
/// # Example
///
/// ```
/// use tigertix_testing::InMemoryInventory;
/// use tigertix_core::{Decrement, InventoryBackend, Quantity};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let inventory = InMemoryInventory::new();
/// let event_id = inventory.seed("Fall Concert", 2);
///
/// let result = inventory.try_decrement(event_id, Quantity::new(1)?).await?;
/// assert_eq!(result, Decrement::Applied { remaining: 1 });
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryInventory {
    events: Arc<RwLock<BTreeMap<EventId, Arc<Slot>>>>,
    next_id: Arc<AtomicI64>,
    decrement_calls: Arc<AtomicUsize>,
}

impl InMemoryInventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            decrement_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Insert an event synchronously and return its id.
    ///
    /// Uses a fixed date and venue; handy for tests that only care about
    /// capacity.
    pub fn seed(&self, name: &str, capacity: u32) -> EventId {
        let date = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap_or_default();
        self.insert(name, date, "Test Hall", capacity).id
    }

    /// Number of times `try_decrement` reached storage.
    ///
    /// Useful to assert that rejected input never touched the counters.
    #[must_use]
    pub fn decrement_calls(&self) -> usize {
        self.decrement_calls.load(Ordering::SeqCst)
    }

    /// Current remaining count without going through the async trait.
    #[must_use]
    pub fn remaining_now(&self, event_id: EventId) -> Option<u32> {
        self.events
            .read()
            .unwrap()
            .get(&event_id)
            .map(|slot| slot.remaining.load(Ordering::Acquire))
    }

    /// Number of events stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    /// Check if no events exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().unwrap().is_empty()
    }

    fn insert(&self, name: &str, date: NaiveDate, location: &str, capacity: u32) -> Event {
        let id = EventId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let slot = Arc::new(Slot {
            id,
            name: name.to_string(),
            date,
            location: location.to_string(),
            total_capacity: capacity,
            remaining: AtomicU32::new(capacity),
        });
        let event = slot.snapshot();
        self.events.write().unwrap().insert(id, slot);
        event
    }

    fn slot(&self, event_id: EventId) -> Result<Option<Arc<Slot>>, StorageError> {
        let events = self
            .events
            .read()
            .map_err(|_| StorageError::Fatal("inventory lock poisoned".into()))?;
        Ok(events.get(&event_id).cloned())
    }

    fn snapshots(&self) -> Result<Vec<Event>, StorageError> {
        let events = self
            .events
            .read()
            .map_err(|_| StorageError::Fatal("inventory lock poisoned".into()))?;
        Ok(events.values().map(|slot| slot.snapshot()).collect())
    }
}

impl Default for InMemoryInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryBackend for InMemoryInventory {
    fn try_decrement(
        &self,
        event_id: EventId,
        quantity: Quantity,
    ) -> BoxFuture<'_, Result<Decrement, StorageError>> {
        Box::pin(async move {
            self.decrement_calls.fetch_add(1, Ordering::SeqCst);

            let Some(slot) = self.slot(event_id)? else {
                return Ok(Decrement::Missing);
            };

            let wanted = quantity.get();
            match slot
                .remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                    current.checked_sub(wanted)
                }) {
                Ok(previous) => Ok(Decrement::Applied {
                    remaining: previous - wanted,
                }),
                Err(_) => Ok(Decrement::Insufficient),
            }
        })
    }

    fn remaining(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<u32>, StorageError>> {
        Box::pin(async move {
            Ok(self
                .slot(event_id)?
                .map(|slot| slot.remaining.load(Ordering::Acquire)))
        })
    }
}

impl EventCatalog for InMemoryInventory {
    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, Result<Event, CatalogError>> {
        Box::pin(async move {
            let capacity = event.validate()?;
            Ok(self.insert(
                event.name.trim(),
                event.date,
                event.location.trim(),
                capacity,
            ))
        })
    }

    fn get_event(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<Event>, CatalogError>> {
        Box::pin(async move { Ok(self.slot(event_id)?.map(|slot| slot.snapshot())) })
    }

    fn list_events(&self) -> BoxFuture<'_, Result<Vec<Event>, CatalogError>> {
        Box::pin(async move { Ok(self.snapshots()?) })
    }

    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Event>, CatalogError>> {
        Box::pin(async move {
            let wanted = name.trim();
            Ok(self
                .snapshots()?
                .into_iter()
                .find(|event| event.name.eq_ignore_ascii_case(wanted)))
        })
    }

    fn events_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Event>, CatalogError>> {
        Box::pin(async move {
            Ok(self
                .snapshots()?
                .into_iter()
                .filter(|event| event.date == date)
                .collect())
        })
    }
}

/// Backend wrapper that fails the first `failures` decrements.
///
/// By default injected failures happen before the inner backend is called, so
/// a failed attempt never commits. [`commit_before_failing`](Self::commit_before_failing)
/// applies the inner decrement first, like a connection that drops after the
/// server committed.
///
/// # Example
///
/// ```
/// use tigertix_testing::{FlakyInventory, InMemoryInventory};
///
/// let inner = InMemoryInventory::new();
/// let flaky = FlakyInventory::new(inner, 2); // two transient failures, then delegate
/// assert_eq!(flaky.attempts(), 0);
/// ```
#[derive(Debug)]
pub struct FlakyInventory<B> {
    inner: B,
    failures: usize,
    error: StorageError,
    commit_first: bool,
    attempts: AtomicUsize,
}

impl<B> FlakyInventory<B> {
    /// Fail the first `failures` decrements with a transient error.
    #[must_use]
    pub fn new(inner: B, failures: usize) -> Self {
        Self {
            inner,
            failures,
            error: StorageError::Transient("database is locked".into()),
            commit_first: false,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Use `error` for the injected failures instead of a transient one.
    #[must_use]
    pub fn with_error(mut self, error: StorageError) -> Self {
        self.error = error;
        self
    }

    /// Let each failing attempt reach the inner backend before reporting the error.
    #[must_use]
    pub const fn commit_before_failing(mut self) -> Self {
        self.commit_first = true;
        self
    }

    /// Total decrement attempts seen, failed or not.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The wrapped backend.
    #[must_use]
    pub const fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: InventoryBackend> InventoryBackend for FlakyInventory<B> {
    fn try_decrement(
        &self,
        event_id: EventId,
        quantity: Quantity,
    ) -> BoxFuture<'_, Result<Decrement, StorageError>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            let error = self.error.clone();
            if self.commit_first {
                let applied = self.inner.try_decrement(event_id, quantity);
                return Box::pin(async move {
                    let _ = applied.await;
                    Err(error)
                });
            }
            return Box::pin(async move { Err(error) });
        }
        self.inner.try_decrement(event_id, quantity)
    }

    fn remaining(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<u32>, StorageError>> {
        self.inner.remaining(event_id)
    }
}
