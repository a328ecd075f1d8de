//! Scrape engine
//!
//! One engine instance runs per metric family. Each instance drives an
//! independent fixed-interval loop: the first tick fires immediately, every
//! tick fans one read out per target concurrently, waits for all attempts to
//! finish, and folds the results into exported series. A failed or timed-out
//! read increments the failure counter for that target and is otherwise
//! skipped until the next tick; sibling targets and sibling families are
//! never affected.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use prometheus::{Gauge, IntCounter, IntCounterVec};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::accumulator::{Accumulator, Quantity};
use crate::error::ExporterError;
use crate::Result;

/// Upper bound for a single target read, independent of the tick interval.
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// One value extracted from a target read, bound to its exported series.
pub enum Sample {
    /// Absolute reading, folded into its counter through the accumulator.
    Counter {
        quantity: Quantity,
        counter: IntCounter,
        value: u64,
    },
    /// Point-in-time snapshot, written to its gauge as-is.
    Gauge { gauge: Gauge, value: f64 },
}

/// A named group of targets sharing one reader kind and one scrape cadence.
#[async_trait]
pub trait ScrapeFamily: Send + Sync + 'static {
    /// Family name used in logs.
    fn name(&self) -> &str;

    /// Target keys scraped each tick. Resolved once at startup.
    fn target_keys(&self) -> Vec<String>;

    /// Failure-counter label for a failed read of `key`.
    fn failure_label(&self, key: &str) -> String;

    /// Performs one network read for one target.
    async fn read(&self, key: &str) -> Result<Vec<Sample>>;
}

/// Fixed-interval scrape loop for one family.
pub struct ScrapeEngine {
    family: Arc<dyn ScrapeFamily>,
    interval: Duration,
    read_timeout: Duration,
    accumulator: Accumulator,
    failures: IntCounterVec,
    cancel: CancellationToken,
}

impl ScrapeEngine {
    pub fn new(
        family: Arc<dyn ScrapeFamily>,
        interval: Duration,
        failures: IntCounterVec,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            family,
            interval,
            read_timeout: READ_TIMEOUT,
            accumulator: Accumulator::new(),
            failures,
            cancel,
        }
    }

    #[cfg(test)]
    fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Runs the family loop until shutdown is requested. The first tick fires
    /// immediately; a tick that overruns the interval delays the next one
    /// rather than letting ticks overlap. On cancellation the loop finishes
    /// its current tick and returns.
    pub async fn run(self) {
        let targets = self.family.target_keys();
        if targets.is_empty() {
            warn!(
                "{}: no targets configured, scrape loop not started",
                self.family.name()
            );
            return;
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "{}: scraping {} target(s) every {:?}",
            self.family.name(),
            targets.len(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("{}: scrape loop stopped", self.family.name());
                    return;
                }
                _ = ticker.tick() => {}
            }

            let elapsed = self.scrape_all(&targets).await;
            info!("{}: scrape done in {:?}", self.family.name(), elapsed);
        }
    }

    /// Fans one tick out to every target concurrently and waits for every
    /// attempt to finish, successfully or not.
    async fn scrape_all(&self, targets: &[String]) -> Duration {
        let started = Instant::now();
        join_all(targets.iter().map(|key| self.scrape_one(key))).await;
        started.elapsed()
    }

    async fn scrape_one(&self, key: &str) {
        match self.read_with_deadline(key).await {
            Ok(samples) => self.publish(key, samples),
            Err(err) => {
                self.failures
                    .with_label_values(&[&self.family.failure_label(key)])
                    .inc();
                error!("{}: read for '{}' failed: {}", self.family.name(), key, err);
            }
        }
    }

    async fn read_with_deadline(&self, key: &str) -> Result<Vec<Sample>> {
        tokio::select! {
            result = self.family.read(key) => result,
            _ = self.cancel.cancelled() => Err(ExporterError::Cancelled),
            _ = tokio::time::sleep(self.read_timeout) => Err(ExporterError::ReadTimeout {
                secs: self.read_timeout.as_secs(),
            }),
        }
    }

    fn publish(&self, key: &str, samples: Vec<Sample>) {
        for sample in samples {
            match sample {
                Sample::Counter {
                    quantity,
                    counter,
                    value,
                } => {
                    self.accumulator.apply(quantity, key, value, &counter);
                }
                Sample::Gauge { gauge, value } => gauge.set(value),
            }
        }
    }
}
