//! Prometheus exporter for rollup sequencer infrastructure
//!
//! Polls sequencer endpoints (execution client, PoS API, data transport
//! layer) and operator wallets on fixed intervals and republishes the
//! readings as Prometheus series. Absolute readings (heights, timestamps,
//! nonces) flow through a per-family accumulator that only ever exports
//! non-negative deltas, so the counters stay monotonic even when an
//! endpoint is swapped or reorged. Balances are exported as plain gauges.

pub mod accumulator;
pub mod clients;
pub mod config;
pub mod custody;
pub mod error;
pub mod metrics;
pub mod scrape_engine;
pub mod sequencer;
pub mod server;
pub mod units;
pub mod wallet;

pub use accumulator::{Accumulator, Quantity};
pub use config::{Address, Config, Settings};
pub use custody::CustodyVariant;
pub use error::ExporterError;
pub use metrics::ExporterMetrics;
pub use scrape_engine::{Sample, ScrapeEngine, ScrapeFamily};

// Re-export Result type for convenience
pub type Result<T> = std::result::Result<T, ExporterError>;
