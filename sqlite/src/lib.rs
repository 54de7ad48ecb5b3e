//! `SQLite` storage for TigerTix.
//!
//! [`SqliteInventory`] implements the inventory, catalog and booking traits
//! from `tigertix-core` on a single `SQLite` database file. It is the default
//! backend for local development and single-node deployments.
//!
//! The decrement is a single conditional `UPDATE ... RETURNING`. `SQLite`
//! serializes writers on the database lock, so the `remaining >= ?` check and
//! the write can never interleave with another buyer's. Writers that cannot
//! get the lock within the busy timeout surface as transient errors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;

use chrono::{DateTime, NaiveDate, Utc};
use error::{classify, ticket_count};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tigertix_core::environment::{Clock, SystemClock};
use tigertix_core::{
    Booking, BookingId, BookingRecorder, BookingStatus, BoxFuture, CatalogError, Decrement, Event,
    EventCatalog, EventId, InventoryBackend, NewEvent, Quantity, StorageError,
};

const EVENT_COLUMNS: &str =
    "event_id, event_name, event_date, event_location, total_capacity, remaining";

/// How long a writer waits for the database lock before reporting `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: i64,
    event_name: String,
    event_date: NaiveDate,
    event_location: String,
    total_capacity: i64,
    remaining: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = StorageError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EventId::new(row.event_id),
            name: row.event_name,
            date: row.event_date,
            location: row.event_location,
            total_capacity: ticket_count(row.total_capacity, "total_capacity")?,
            remaining: ticket_count(row.remaining, "remaining")?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_id: i64,
    event_id: i64,
    quantity: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StorageError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BookingId::new(row.booking_id),
            event_id: EventId::new(row.event_id),
            quantity: ticket_count(row.quantity, "quantity")?,
            status: BookingStatus::parse(&row.status)?,
            created_at: row.created_at,
        })
    }
}

fn to_events(rows: Vec<EventRow>) -> Result<Vec<Event>, StorageError> {
    rows.into_iter().map(Event::try_from).collect()
}

/// `SQLite`-backed inventory, catalog and booking recorder.
///
/// Booking timestamps come from the injected [`Clock`] ([`SystemClock`]
/// unless replaced with [`with_clock`](Self::with_clock)).
#[derive(Clone)]
pub struct SqliteInventory {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SqliteInventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteInventory")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl SqliteInventory {
    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
        }
    }

    /// Stamp bookings with `clock` instead of the system time.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Open (creating if needed) the database at `database_url`,
    /// e.g. `sqlite:tigertix.db`.
    ///
    /// The database runs in WAL mode with foreign keys enforced.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is malformed or the file cannot be opened.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StorageError::Fatal(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await
            .map_err(classify)?;

        tracing::info!(max_connections, "Opened SQLite database");
        Ok(Self::from_pool(pool))
    }

    /// A fresh, migrated in-memory database.
    ///
    /// Every `SQLite` connection to `:memory:` is its own database, so the
    /// pool holds exactly one connection that never expires.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database cannot be created.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Fatal(format!("Invalid SQLite URL: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(classify)?;

        let storage = Self::from_pool(pool);
        storage.migrate().await?;
        Ok(storage)
    }

    /// Create the `events` and `bookings` tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Fatal`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Fatal(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Bookings recorded for one event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    pub async fn bookings_for_event(&self, event_id: EventId) -> Result<Vec<Booking>, StorageError> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            r"
            SELECT booking_id, event_id, quantity, status, created_at
            FROM bookings
            WHERE event_id = ?1
            ORDER BY booking_id
            ",
        )
        .bind(event_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}

impl InventoryBackend for SqliteInventory {
    fn try_decrement(
        &self,
        event_id: EventId,
        quantity: Quantity,
    ) -> BoxFuture<'_, Result<Decrement, StorageError>> {
        Box::pin(async move {
            let updated: Option<(i64,)> = sqlx::query_as(
                r"
                UPDATE events
                SET remaining = remaining - ?2
                WHERE event_id = ?1 AND remaining >= ?2
                RETURNING remaining
                ",
            )
            .bind(event_id.get())
            .bind(i64::from(quantity.get()))
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

            if let Some((remaining,)) = updated {
                return Ok(Decrement::Applied {
                    remaining: ticket_count(remaining, "remaining")?,
                });
            }

            // Nothing matched; find out whether the event exists at all.
            let (exists,): (i64,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM events WHERE event_id = ?1)")
                    .bind(event_id.get())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(classify)?;

            Ok(if exists != 0 {
                Decrement::Insufficient
            } else {
                Decrement::Missing
            })
        })
    }

    fn remaining(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<u32>, StorageError>> {
        Box::pin(async move {
            let row: Option<(i64,)> =
                sqlx::query_as("SELECT remaining FROM events WHERE event_id = ?1")
                    .bind(event_id.get())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(classify)?;

            row.map(|(remaining,)| ticket_count(remaining, "remaining"))
                .transpose()
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(classify)?;
            Ok(())
        })
    }
}

impl EventCatalog for SqliteInventory {
    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, Result<Event, CatalogError>> {
        Box::pin(async move {
            let capacity = event.validate()?;

            let row: EventRow = sqlx::query_as(&format!(
                r"
                INSERT INTO events (event_name, event_date, event_location, total_capacity, remaining)
                VALUES (?1, ?2, ?3, ?4, ?4)
                RETURNING {EVENT_COLUMNS}
                "
            ))
            .bind(event.name.trim())
            .bind(event.date)
            .bind(event.location.trim())
            .bind(i64::from(capacity))
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;

            let created = Event::try_from(row)?;
            tracing::info!(event_id = %created.id, capacity, "Event created");
            Ok(created)
        })
    }

    fn get_event(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<Event>, CatalogError>> {
        Box::pin(async move {
            let row: Option<EventRow> = sqlx::query_as(&format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"
            ))
            .bind(event_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

            Ok(row.map(Event::try_from).transpose()?)
        })
    }

    fn list_events(&self) -> BoxFuture<'_, Result<Vec<Event>, CatalogError>> {
        Box::pin(async move {
            let rows: Vec<EventRow> = sqlx::query_as(&format!(
                "SELECT {EVENT_COLUMNS} FROM events ORDER BY event_id"
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

            Ok(to_events(rows)?)
        })
    }

    fn find_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Event>, CatalogError>> {
        Box::pin(async move {
            let row: Option<EventRow> = sqlx::query_as(&format!(
                r"
                SELECT {EVENT_COLUMNS} FROM events
                WHERE event_name = ?1 COLLATE NOCASE
                ORDER BY event_id
                LIMIT 1
                "
            ))
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

            Ok(row.map(Event::try_from).transpose()?)
        })
    }

    fn events_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Event>, CatalogError>> {
        Box::pin(async move {
            let rows: Vec<EventRow> = sqlx::query_as(&format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE event_date = ?1 ORDER BY event_id"
            ))
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

            Ok(to_events(rows)?)
        })
    }
}

impl BookingRecorder for SqliteInventory {
    fn record(
        &self,
        event_id: EventId,
        quantity: Quantity,
    ) -> BoxFuture<'_, Result<BookingId, StorageError>> {
        Box::pin(async move {
            let (booking_id,): (i64,) = sqlx::query_as(
                r"
                INSERT INTO bookings (event_id, quantity, status, created_at)
                VALUES (?1, ?2, ?3, ?4)
                RETURNING booking_id
                ",
            )
            .bind(event_id.get())
            .bind(i64::from(quantity.get()))
            .bind(BookingStatus::Confirmed.as_str())
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;

            Ok(BookingId::new(booking_id))
        })
    }
}
