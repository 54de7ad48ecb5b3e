//! # TigerTix Core
//!
//! Domain types and storage traits for TigerTix ticket inventory.
//!
//! The one correctness-critical operation in TigerTix is the ticket
//! decrement: concurrent purchases against the same event must never
//! oversell. This crate defines the vocabulary for it:
//!
//! - **[`Event`]**: catalog metadata plus the `remaining` counter
//! - **[`InventoryBackend`]**: storage that performs one atomic conditional decrement
//! - **[`EventCatalog`]**: event creation and lookups
//! - **[`BookingRecorder`]**: append-only audit trail of confirmed purchases
//! - **[`PurchaseOutcome`] / [`PurchaseError`]**: what a purchase can return
//!
//! ## Invariant
//!
//! For every event, `0 <= remaining <= total_capacity` and
//! `remaining == total_capacity - sum(confirmed quantities)`, under any
//! number of concurrent callers.
//!
//! ## Example
//!
//! ```ignore
//! use tigertix_core::{EventId, InventoryBackend, Quantity, Decrement};
//!
//! async fn buy_one<B: InventoryBackend>(backend: &B) -> Result<(), Box<dyn std::error::Error>> {
//!     match backend.try_decrement(EventId::new(1), Quantity::new(1)?).await? {
//!         Decrement::Applied { remaining } => println!("{remaining} left"),
//!         Decrement::Insufficient => println!("sold out"),
//!         Decrement::Missing => println!("no such event"),
//!     }
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod booking;
pub mod catalog;
pub mod error;
pub mod event;
pub mod inventory;
pub mod types;

// Re-export commonly used types
pub use booking::{Booking, BookingRecorder, BookingStatus};
pub use catalog::{CatalogError, EventCatalog};
pub use chrono::{DateTime, NaiveDate, Utc};
pub use error::StorageError;
pub use event::{Event, NewEvent};
pub use inventory::{Decrement, InventoryBackend, PurchaseError, PurchaseOutcome, Rejection};
pub use types::{BookingId, EventId, MAX_TICKETS, Quantity};

/// Boxed `Send` future returned by the storage traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Environment module - injected dependencies
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use tigertix_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
