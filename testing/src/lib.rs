//! # TigerTix Testing
//!
//! In-memory storage and test helpers for TigerTix.
//!
//! This crate provides:
//! - [`InMemoryInventory`]: lock-free inventory and catalog for unit tests
//! - [`FlakyInventory`]: wraps a backend and injects transient failures
//! - [`InMemoryBookingRecorder`] / [`FailingBookingRecorder`]: booking sinks
//! - [`FixedClock`]: deterministic time
//! - proptest strategies for purchase workloads
//!
//! ## Example
//!
//! ```ignore
//! use tigertix_testing::{InMemoryBookingRecorder, InMemoryInventory, test_clock};
//! use tigertix_runtime::InventoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn sells_out() {
//!     let inventory = Arc::new(InMemoryInventory::new());
//!     let event = inventory.seed("Jazz Night", 2);
//!     let store = InventoryStore::new(inventory, Arc::new(InMemoryBookingRecorder::new(test_clock())));
//!
//!     assert!(store.purchase(event, 2).await.unwrap().is_confirmed());
//!     assert!(!store.purchase(event, 1).await.unwrap().is_confirmed());
//! }
//! ```

use chrono::{DateTime, Utc};
use tigertix_core::environment::Clock;

mod booking_mocks;
mod inventory_mocks;

pub use booking_mocks::{FailingBookingRecorder, InMemoryBookingRecorder};
pub use inventory_mocks::{FlakyInventory, InMemoryInventory};

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making booking timestamps reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tigertix_testing::mocks::FixedClock;
    /// use tigertix_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Never in practice; the timestamp is a constant.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing strategies.
pub mod properties {
    use proptest::prelude::*;

    /// A capacity small enough that workloads routinely exhaust it.
    pub fn capacity() -> impl Strategy<Value = u32> {
        1u32..=50
    }

    /// A sequence of purchase quantities, including occasional invalid ones.
    ///
    /// Values below 1 exercise the validation path.
    pub fn purchase_requests() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(
            prop_oneof![
                8 => 1i64..=5,
                1 => -2i64..=0,
            ],
            1..40,
        )
    }
}

/// Install a test tracing subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }
}
