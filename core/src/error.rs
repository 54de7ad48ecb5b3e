//! Storage-level errors shared by every backend.

use thiserror::Error;

/// Errors raised by a storage backend.
///
/// Backends classify each failure so the purchase path can decide whether
/// re-running the same atomic statement might succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Lock contention, a statement timeout or no free connection.
    ///
    /// The statement did not commit (or was rolled back) and may succeed if
    /// executed again.
    #[error("Transient storage error: {0}")]
    Transient(String),

    /// The connection failed while the statement was in flight.
    ///
    /// The write may or may not have committed. Never re-run; re-read the
    /// affected row to find out.
    #[error("Storage outcome unknown: {0}")]
    Indeterminate(String),

    /// Anything re-running will not fix (constraint violation, bad schema,
    /// closed pool, decode failure).
    #[error("Storage error: {0}")]
    Fatal(String),
}

impl StorageError {
    /// Whether re-executing the failed operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
