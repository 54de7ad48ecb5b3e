//! Event records as seen by the catalog and the purchase path.

use crate::catalog::CatalogError;
use crate::types::{EventId, MAX_TICKETS};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A ticketed event.
///
/// Metadata fields belong to the catalog. `remaining` is written only by the
/// atomic conditional decrement behind `InventoryStore::purchase`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Storage-assigned identifier
    pub id: EventId,
    /// Display name, also used for natural-language lookups
    pub name: String,
    /// Calendar date of the event
    pub date: NaiveDate,
    /// Venue
    pub location: String,
    /// Tickets issued at creation
    pub total_capacity: u32,
    /// Tickets not yet sold
    pub remaining: u32,
}

/// Request to create an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Display name
    pub name: String,
    /// Calendar date
    pub date: NaiveDate,
    /// Venue
    pub location: String,
    /// Number of tickets to issue
    pub capacity: i64,
}

impl NewEvent {
    /// Check the request and return the capacity as stored.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidArgument`] for a blank name or location,
    /// or a capacity outside `1..=MAX_TICKETS`.
    pub fn validate(&self) -> Result<u32, CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::InvalidArgument("event name is required".into()));
        }
        if self.location.trim().is_empty() {
            return Err(CatalogError::InvalidArgument(
                "event location is required".into(),
            ));
        }
        u32::try_from(self.capacity)
            .ok()
            .filter(|c| (1..=MAX_TICKETS).contains(c))
            .ok_or_else(|| {
                CatalogError::InvalidArgument(format!(
                    "capacity must be between 1 and {MAX_TICKETS}, got {}",
                    self.capacity
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concert(capacity: i64) -> NewEvent {
        NewEvent {
            name: "Fall Concert".into(),
            date: NaiveDate::from_ymd_opt(2025, 11, 15).unwrap_or_default(),
            location: "Littlejohn Coliseum".into(),
            capacity,
        }
    }

    #[test]
    fn validate_accepts_positive_capacity() {
        assert_eq!(concert(250).validate().ok(), Some(250));
    }

    #[test]
    fn validate_rejects_non_positive_capacity() {
        assert!(matches!(concert(0).validate(), Err(CatalogError::InvalidArgument(_))));
        assert!(matches!(concert(-5).validate(), Err(CatalogError::InvalidArgument(_))));
    }

    #[test]
    fn validate_rejects_blank_name() {
        let mut request = concert(10);
        request.name = "   ".into();
        assert!(matches!(request.validate(), Err(CatalogError::InvalidArgument(_))));
    }
}
