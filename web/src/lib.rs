//! Axum HTTP surface for `TigerTix`.
//!
//! Handlers are thin: they parse the request, call the catalog, the
//! [`InventoryStore`](tigertix_runtime::InventoryStore) or the intent
//! extractor, and map the result to a response. All business rules live
//! below this crate.
//!
//! # Request Flow
//!
//! 1. **Correlation ID** attached (or echoed) by [`middleware`]
//! 2. **Extract** path and JSON body
//! 3. **Call** the domain service held in [`AppState`]
//! 4. **Map** the outcome, or an [`AppError`], to an HTTP response
//!
//! # Example
//!
//! ```ignore
//! let state = AppState::new(store, catalog, backend, extractor);
//! let app = tigertix_web::build_router(state);
//! axum::serve(listener, app).await?;
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use middleware::{CORRELATION_ID_HEADER, CorrelationId, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
