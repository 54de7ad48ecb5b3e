//! Mapping `sqlx` failures onto [`StorageError`].

use tigertix_core::StorageError;

/// `SQLITE_BUSY`: another connection holds the write lock.
const SQLITE_BUSY: i32 = 5;
/// `SQLITE_LOCKED`: a table is locked by this connection's own transaction.
const SQLITE_LOCKED: i32 = 6;

/// Classify a `sqlx` error as transient or fatal.
///
/// Extended result codes (e.g. `SQLITE_BUSY_SNAPSHOT` = 517) are reduced to
/// their primary code before matching.
pub(crate) fn classify(err: sqlx::Error) -> StorageError {
    let transient = match &err {
        // The request may have reached the server before the socket failed.
        sqlx::Error::Io(_) => return StorageError::Indeterminate(err.to_string()),
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(is_lock_contention),
        _ => false,
    };

    if transient {
        StorageError::Transient(err.to_string())
    } else {
        StorageError::Fatal(err.to_string())
    }
}

const fn is_lock_contention(code: i32) -> bool {
    matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)
}

/// Convert a stored integer into a ticket count.
pub(crate) fn ticket_count(value: i64, column: &str) -> Result<u32, StorageError> {
    u32::try_from(value)
        .map_err(|_| StorageError::Fatal(format!("{column} out of range in storage: {value}")))
}
