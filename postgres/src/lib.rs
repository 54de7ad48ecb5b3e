//! `PostgreSQL` storage for TigerTix.
//!
//! [`PostgresInventory`] implements all three storage traits from
//! `tigertix-core` against one connection pool:
//!
//! - [`InventoryBackend`]: the atomic conditional decrement
//! - [`EventCatalog`]: event creation and lookups
//! - [`BookingRecorder`]: the booking audit trail
//!
//! # Atomic Decrement
//!
//! The decrement is one statement. The `UPDATE` only matches when enough
//! tickets remain, and the same statement reports whether the event exists so
//! a miss can be told apart from a sell-out without a second round trip:
//!
//! ```sql
//! WITH updated AS (
//!     UPDATE events SET remaining = remaining - $2
//!     WHERE event_id = $1 AND remaining >= $2
//!     RETURNING remaining
//! )
//! SELECT (SELECT remaining FROM updated),
//!        EXISTS (SELECT 1 FROM events WHERE event_id = $1)
//! ```
//!
//! Under `READ COMMITTED`, a concurrent writer on the same row makes the
//! `UPDATE` wait and then re-check `remaining >= $2` against the committed
//! value, so two buyers can never both pass the check on a stale count.
//!
//! # Example
//!
//! ```ignore
//! use tigertix_postgres::PostgresInventory;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = PostgresInventory::connect(
//!         "postgres://localhost/tigertix",
//!         10,
//!         std::time::Duration::from_secs(30),
//!     )
//!     .await?;
//!     storage.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;

use chrono::{DateTime, NaiveDate, Utc};
use error::{classify, ticket_count};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tigertix_core::environment::{Clock, SystemClock};
use tigertix_core::{
    Booking, BookingId, BookingRecorder, BookingStatus, BoxFuture, CatalogError, Decrement, Event,
    EventCatalog, EventId, InventoryBackend, NewEvent, Quantity, StorageError,
};

const EVENT_COLUMNS: &str =
    "event_id, event_name, event_date, event_location, total_capacity, remaining";

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: i64,
    event_name: String,
    event_date: NaiveDate,
    event_location: String,
    total_capacity: i32,
    remaining: i32,
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
    quantity: i32,
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

fn bind_quantity(quantity: Quantity) -> Result<i32, StorageError> {
    i32::try_from(quantity.get())
        .map_err(|_| StorageError::Fatal(format!("quantity {quantity} exceeds column range")))
}

/// `PostgreSQL`-backed inventory, catalog and booking recorder.
///
/// Booking timestamps come from the injected [`Clock`] ([`SystemClock`]
/// unless replaced with [`with_clock`](Self::with_clock)).
#[derive(Clone)]
pub struct PostgresInventory {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PostgresInventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresInventory")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl PostgresInventory {
    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
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

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the database cannot be reached.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(classify)?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::from_pool(pool))
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
    pub const fn pool(&self) -> &PgPool {
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
            WHERE event_id = $1
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

impl InventoryBackend for PostgresInventory {
    fn try_decrement(
        &self,
        event_id: EventId,
        quantity: Quantity,
    ) -> BoxFuture<'_, Result<Decrement, StorageError>> {
        Box::pin(async move {
            let quantity = bind_quantity(quantity)?;

            let (remaining, exists): (Option<i32>, bool) = sqlx::query_as(
                r"
                WITH updated AS (
                    UPDATE events
                    SET remaining = remaining - $2
                    WHERE event_id = $1 AND remaining >= $2
                    RETURNING remaining
                )
                SELECT (SELECT remaining FROM updated),
                       EXISTS (SELECT 1 FROM events WHERE event_id = $1)
                ",
            )
            .bind(event_id.get())
            .bind(quantity)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;

            match (remaining, exists) {
                (Some(remaining), _) => Ok(Decrement::Applied {
                    remaining: ticket_count(remaining, "remaining")?,
                }),
                (None, true) => Ok(Decrement::Insufficient),
                (None, false) => Ok(Decrement::Missing),
            }
        })
    }

    fn remaining(&self, event_id: EventId) -> BoxFuture<'_, Result<Option<u32>, StorageError>> {
        Box::pin(async move {
            let row: Option<(i32,)> =
                sqlx::query_as("SELECT remaining FROM events WHERE event_id = $1")
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

impl EventCatalog for PostgresInventory {
    fn create_event(&self, event: NewEvent) -> BoxFuture<'_, Result<Event, CatalogError>> {
        Box::pin(async move {
            let capacity = event.validate()?;
            let capacity = i32::try_from(capacity).map_err(|_| {
                CatalogError::InvalidArgument(format!("capacity {capacity} is too large"))
            })?;

            let row: EventRow = sqlx::query_as(&format!(
                r"
                INSERT INTO events (event_name, event_date, event_location, total_capacity, remaining)
                VALUES ($1, $2, $3, $4, $4)
                RETURNING {EVENT_COLUMNS}
                "
            ))
            .bind(event.name.trim())
            .bind(event.date)
            .bind(event.location.trim())
            .bind(capacity)
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
                "SELECT {EVENT_COLUMNS} FROM events WHERE event_id = $1"
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
                WHERE LOWER(event_name) = LOWER($1)
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
                "SELECT {EVENT_COLUMNS} FROM events WHERE event_date = $1 ORDER BY event_id"
            ))
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

            Ok(to_events(rows)?)
        })
    }
}

impl BookingRecorder for PostgresInventory {
    fn record(
        &self,
        event_id: EventId,
        quantity: Quantity,
    ) -> BoxFuture<'_, Result<BookingId, StorageError>> {
        Box::pin(async move {
            let (booking_id,): (i64,) = sqlx::query_as(
                r"
                INSERT INTO bookings (event_id, quantity, status, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING booking_id
                ",
            )
            .bind(event_id.get())
            .bind(bind_quantity(quantity)?)
            .bind(BookingStatus::Confirmed.as_str())
            .bind(self.clock.now())
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;

            Ok(BookingId::new(booking_id))
        })
    }
}
