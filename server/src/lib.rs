//! `TigerTix` server assembly.
//!
//! Turns a [`Config`] into a running application: opens storage, runs
//! migrations, picks an intent extractor and builds the router.

pub mod config;

pub use config::Config;

use std::sync::Arc;
use thiserror::Error;
use tigertix_core::{BookingRecorder, EventCatalog, InventoryBackend, StorageError};
use tigertix_llm::{AnthropicClient, ClaudeIntentExtractor, IntentExtractor, UnconfiguredExtractor};
use tigertix_postgres::PostgresInventory;
use tigertix_runtime::{InventoryStore, RetryPolicy};
use tigertix_sqlite::SqliteInventory;
use tigertix_web::AppState;

/// Errors while starting the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// `DATABASE_URL` names a database this server cannot talk to.
    #[error("Unsupported DATABASE_URL (expected postgres:// or sqlite:): {0}")]
    UnsupportedDatabase(String),

    /// Storage could not be opened or migrated.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// An open storage backend.
#[derive(Clone, Debug)]
pub enum Storage {
    /// `PostgreSQL`
    Postgres(PostgresInventory),
    /// `SQLite`
    Sqlite(SqliteInventory),
}

impl Storage {
    /// Open and migrate the database named by `config.database.url`.
    ///
    /// `sqlite::memory:` (or any URL with `mode=memory`) opens a private
    /// in-memory database on a single connection.
    ///
    /// # Errors
    ///
    /// - [`ServerError::UnsupportedDatabase`] for an unknown URL scheme
    /// - [`ServerError::Storage`] if connecting or migrating fails
    pub async fn open(config: &Config) -> Result<Self, ServerError> {
        let db = &config.database;
        let storage = if db.url.starts_with("postgres://") || db.url.starts_with("postgresql://") {
            let inventory =
                PostgresInventory::connect(&db.url, db.max_connections, db.connect_timeout())
                    .await?;
            inventory.migrate().await?;
            Self::Postgres(inventory)
        } else if db.url.starts_with("sqlite:") {
            let inventory = if db.url.contains(":memory:") || db.url.contains("mode=memory") {
                SqliteInventory::in_memory().await?
            } else {
                let inventory =
                    SqliteInventory::connect(&db.url, db.max_connections, db.connect_timeout())
                        .await?;
                inventory.migrate().await?;
                inventory
            };
            Self::Sqlite(inventory)
        } else {
            return Err(ServerError::UnsupportedDatabase(redact(&db.url)));
        };

        tracing::info!(backend = storage.name(), "Storage ready");
        Ok(storage)
    }

    /// Backend name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Sqlite(_) => "sqlite",
        }
    }

    /// The storage traits, all backed by the same database.
    #[must_use]
    pub fn services(
        &self,
    ) -> (
        Arc<dyn InventoryBackend>,
        Arc<dyn EventCatalog>,
        Arc<dyn BookingRecorder>,
    ) {
        match self {
            Self::Postgres(inventory) => shared(inventory),
            Self::Sqlite(inventory) => shared(inventory),
        }
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        match self {
            Self::Postgres(inventory) => inventory.close().await,
            Self::Sqlite(inventory) => inventory.close().await,
        }
    }
}

fn shared<T>(
    inventory: &T,
) -> (
    Arc<dyn InventoryBackend>,
    Arc<dyn EventCatalog>,
    Arc<dyn BookingRecorder>,
)
where
    T: InventoryBackend + EventCatalog + BookingRecorder + Clone + 'static,
{
    let inventory = Arc::new(inventory.clone());
    (inventory.clone(), inventory.clone(), inventory)
}

/// Retry policy from the purchase settings.
#[must_use]
pub fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(config.purchase.max_retries)
        .initial_delay(config.purchase.retry_initial_delay())
        .build()
}

/// The booking assistant, or a stand-in that reports it is unavailable.
#[must_use]
pub fn intent_extractor(config: &Config) -> Arc<dyn IntentExtractor> {
    let Some(api_key) = config.llm.api_key.clone() else {
        tracing::warn!("ANTHROPIC_API_KEY not set; natural-language booking is disabled");
        return Arc::new(UnconfiguredExtractor);
    };

    let mut client = AnthropicClient::new(api_key);
    if let Some(url) = &config.llm.api_url {
        client = client.with_api_url(url.as_str());
    }

    let mut extractor = ClaudeIntentExtractor::new(client);
    if let Some(model) = &config.llm.model {
        extractor = extractor.with_model(model.as_str());
    }
    Arc::new(extractor)
}

/// Wire storage, the purchase store and the assistant into handler state.
#[must_use]
pub fn app_state(config: &Config, storage: &Storage) -> AppState {
    let (backend, catalog, recorder) = storage.services();
    let store = InventoryStore::new(backend.clone(), recorder).with_retry_policy(retry_policy(config));
    AppState::new(store, catalog, backend, intent_extractor(config))
}

/// Strip credentials from a database URL before logging it.
#[must_use]
pub fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
