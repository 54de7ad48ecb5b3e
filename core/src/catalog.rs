//! Event catalog: event metadata and lookups.
//!
//! The catalog creates event rows (with `remaining` equal to the capacity) and
//! serves reads. It never writes `remaining` after creation.

use crate::BoxFuture;
use crate::error::StorageError;
use crate::event::{Event, NewEvent};
use crate::types::EventId;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors from catalog operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The request failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Read/create access to event metadata.
pub trait EventCatalog: Send + Sync {
    /// Create an event with `remaining = capacity`.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidArgument`]: the request failed [`NewEvent::validate`]
    /// - [`CatalogError::Storage`]: the insert failed
    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, Result<Event, CatalogError>>;

    /// Fetch one event.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the read fails.
    fn get_event(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<Event>, CatalogError>>;

    /// All events, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the read fails.
    fn list_events(&self) -> BoxFuture<'_, Result<Vec<Event>, CatalogError>>;

    /// Look up an event by exact name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the read fails.
    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Event>, CatalogError>>;

    /// Events taking place on `date`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the read fails.
    fn events_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Event>, CatalogError>>;

    /// Total capacity of an event, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the read fails.
    fn get_capacity(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<u32>, CatalogError>> {
        Box::pin(async move {
            Ok(self
                .get_event(event_id)
                .await?
                .map(|event| event.total_capacity))
        })
    }
}
