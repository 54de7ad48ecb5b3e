//! Prometheus metrics for the purchase path.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `tigertix_purchases_total{outcome}`: purchases by outcome (`confirmed`,
//!   `not_enough_inventory`, `event_not_found`, `invalid_argument`,
//!   `storage_unavailable`, `indeterminate`)
//! - `tigertix_tickets_sold_total`: tickets decremented by confirmed purchases
//! - `tigertix_purchase_retries_total`: retries caused by transient storage errors
//! - `tigertix_booking_record_failures_total`: confirmed purchases without a booking record
//! - `tigertix_events_created_total`: events added to the catalog
//!
//! ## Histograms
//! - `tigertix_purchase_duration_seconds`: time spent in `InventoryStore::purchase`
//!
//! # Example
//!
//! ```rust,no_run
//! use tigertix_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! let _body = server.render();
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder plus the address its scrape endpoint is served on.
///
/// The HTTP listener itself is owned by the server binary; this type installs
/// the global recorder and renders the exposition text.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for MetricsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsServer")
            .field("addr", &self.addr)
            .field("installed", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl MetricsServer {
    /// Create a metrics server for `addr` (e.g. `0.0.0.0:9090`).
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint should bind to.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed.
    /// A recorder that is already installed (common in tests) is not an error;
    /// in that case [`handle`](Self::handle) stays `None`.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if this instance did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(
        "tigertix_purchases_total",
        "Total number of purchase requests by outcome"
    );
    describe_counter!(
        "tigertix_tickets_sold_total",
        "Total number of tickets decremented by confirmed purchases"
    );
    describe_counter!(
        "tigertix_purchase_retries_total",
        "Total number of purchase retries after transient storage errors"
    );
    describe_counter!(
        "tigertix_booking_record_failures_total",
        "Confirmed purchases whose booking record could not be written"
    );
    describe_counter!(
        "tigertix_events_created_total",
        "Total number of events created"
    );
    describe_histogram!(
        "tigertix_purchase_duration_seconds",
        "Time taken to process a purchase, including retries"
    );
}

/// Purchase metrics recorder.
pub struct PurchaseMetrics;

impl PurchaseMetrics {
    /// Count one purchase with the given outcome label.
    pub fn record_outcome(outcome: &'static str) {
        counter!("tigertix_purchases_total", "outcome" => outcome).increment(1);
    }

    /// Count tickets sold by a confirmed purchase.
    pub fn record_tickets_sold(quantity: u32) {
        counter!("tigertix_tickets_sold_total").increment(u64::from(quantity));
    }

    /// Count retries made for one purchase.
    pub fn record_retries(retries: usize) {
        if retries > 0 {
            counter!("tigertix_purchase_retries_total")
                .increment(u64::try_from(retries).unwrap_or(u64::MAX));
        }
    }

    /// Count a confirmed purchase whose booking was lost.
    pub fn record_booking_failure() {
        counter!("tigertix_booking_record_failures_total").increment(1);
    }

    /// Record time spent in one purchase.
    pub fn record_duration(duration: Duration) {
        histogram!("tigertix_purchase_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Catalog metrics recorder.
pub struct CatalogMetrics;

impl CatalogMetrics {
    /// Count a created event.
    pub fn record_event_created() {
        counter!("tigertix_events_created_total").increment(1);
    }
}
