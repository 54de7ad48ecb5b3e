//! Mapping `sqlx` failures onto [`StorageError`].

use tigertix_core::StorageError;

/// SQLSTATE codes worth re-running the same statement for.
///
/// - `40001` serialization failure
/// - `40P01` deadlock detected
/// - `55P03` lock not available
/// - `57014` query canceled (statement timeout)
/// - `53300` too many connections
const TRANSIENT_SQLSTATES: &[&str] = &["40001", "40P01", "55P03", "57014", "53300"];

/// Classify a `sqlx` error as transient or fatal.
pub(crate) fn classify(err: sqlx::Error) -> StorageError {
    let transient = match &err {
        // The request may have reached the server before the socket failed.
        sqlx::Error::Io(_) => return StorageError::Indeterminate(err.to_string()),
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    };

    if transient {
        StorageError::Transient(err.to_string())
    } else {
        StorageError::Fatal(err.to_string())
    }
}

/// Convert a stored integer into a ticket count.
pub(crate) fn ticket_count(value: i32, column: &str) -> Result<u32, StorageError> {
    u32::try_from(value)
        .map_err(|_| StorageError::Fatal(format!("negative {column} in storage: {value}")))
}
