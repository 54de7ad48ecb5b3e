//! Application state shared by all handlers.

use std::sync::Arc;
use tigertix_core::{EventCatalog, InventoryBackend};
use tigertix_llm::IntentExtractor;
use tigertix_runtime::InventoryStore;

/// Application state shared across all HTTP handlers.
///
/// Every field is reference-counted, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Purchase entry point
    pub store: InventoryStore,
    /// Event metadata and lookups
    pub catalog: Arc<dyn EventCatalog>,
    /// Raw backend, used by readiness probes
    pub backend: Arc<dyn InventoryBackend>,
    /// Natural-language intent extraction
    pub extractor: Arc<dyn IntentExtractor>,
}

impl AppState {
    /// Bundle the services handlers need.
    #[must_use]
    pub fn new(
        store: InventoryStore,
        catalog: Arc<dyn EventCatalog>,
        backend: Arc<dyn InventoryBackend>,
        extractor: Arc<dyn IntentExtractor>,
    ) -> Self {
        Self {
            store,
            catalog,
            backend,
            extractor,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
