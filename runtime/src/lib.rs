//! # TigerTix Runtime
//!
//! The purchase runtime for TigerTix.
//!
//! This crate turns a storage backend's single atomic decrement into the
//! purchase operation every caller uses.
//!
//! ## Core Components
//!
//! - **[`InventoryStore`]**: validation, bounded retries, booking records
//! - **[`retry`]**: exponential backoff for transient storage errors
//! - **[`metrics`]**: Prometheus counters and histograms for purchases
//!
//! ## Example
//!
//! ```ignore
//! use tigertix_runtime::InventoryStore;
//! use tigertix_core::{PurchaseOutcome, Rejection};
//!
//! let store = InventoryStore::new(backend, recorder);
//!
//! match store.purchase(event_id, 2).await? {
//!     PurchaseOutcome::Confirmed { remaining, .. } => println!("{remaining} left"),
//!     PurchaseOutcome::Rejected(Rejection::NotEnoughInventory) => println!("sold out"),
//!     PurchaseOutcome::Rejected(Rejection::EventNotFound) => println!("no such event"),
//! }
//! ```

/// Retry logic with exponential backoff
pub mod retry;

/// Prometheus metrics for observability
pub mod metrics;

mod store;

pub use retry::RetryPolicy;
pub use store::InventoryStore;
