//! Sequencer metric families
//!
//! Three families poll each monitored sequencer's services: the execution
//! client's chain head (height and timestamp), the PoS API's latest span
//! height, and the DTL's highest synced L1 block. All three share the
//! sequencer scrape cadence but run as independent loops.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::accumulator::Quantity;
use crate::clients::{DtlClient, EthRpcClient, PosClient};
use crate::config::Config;
use crate::error::ExporterError;
use crate::metrics::ExporterMetrics;
use crate::scrape_engine::{Sample, ScrapeFamily};
use crate::Result;

pub const SVC_L2GETH: &str = "l2geth";
pub const SVC_POS: &str = "pos";
pub const SVC_DTL: &str = "dtl";

/// Chain-head family: block height and timestamp from each sequencer's
/// execution client.
pub struct HeadFamily {
    clients: HashMap<String, Arc<EthRpcClient>>,
    metrics: ExporterMetrics,
}

impl HeadFamily {
    pub fn new(clients: HashMap<String, Arc<EthRpcClient>>, metrics: ExporterMetrics) -> Self {
        Self { clients, metrics }
    }
}

#[async_trait]
impl ScrapeFamily for HeadFamily {
    fn name(&self) -> &str {
        SVC_L2GETH
    }

    fn target_keys(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }

    fn failure_label(&self, key: &str) -> String {
        format!("seq-{}-{}", key, SVC_L2GETH)
    }

    async fn read(&self, key: &str) -> Result<Vec<Sample>> {
        let client = self
            .clients
            .get(key)
            .ok_or_else(|| ExporterError::Configuration(format!("unknown sequencer '{}'", key)))?;
        let head = client.latest_header().await?;
        info!(
            "{}: '{}' height {} timestamp {}",
            SVC_L2GETH, key, head.number, head.timestamp
        );
        Ok(vec![
            Sample::Counter {
                quantity: Quantity::Height,
                counter: self.metrics.heights.with_label_values(&[SVC_L2GETH, key]),
                value: head.number,
            },
            Sample::Counter {
                quantity: Quantity::Timestamp,
                counter: self
                    .metrics
                    .timestamps
                    .with_label_values(&[SVC_L2GETH, key]),
                value: head.timestamp,
            },
        ])
    }
}

/// Epoch family: latest span height from each sequencer's PoS endpoint.
pub struct EpochFamily {
    clients: HashMap<String, Arc<PosClient>>,
    metrics: ExporterMetrics,
}

impl EpochFamily {
    pub fn new(clients: HashMap<String, Arc<PosClient>>, metrics: ExporterMetrics) -> Self {
        Self { clients, metrics }
    }
}

#[async_trait]
impl ScrapeFamily for EpochFamily {
    fn name(&self) -> &str {
        SVC_POS
    }

    fn target_keys(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }

    fn failure_label(&self, key: &str) -> String {
        format!("seq-{}-{}", key, SVC_POS)
    }

    async fn read(&self, key: &str) -> Result<Vec<Sample>> {
        let client = self
            .clients
            .get(key)
            .ok_or_else(|| ExporterError::Configuration(format!("unknown sequencer '{}'", key)))?;
        let (height, span) = client.latest_span().await?;
        info!(
            "{}: '{}' height {} span {}",
            SVC_POS, key, height, span.span_id
        );
        Ok(vec![Sample::Counter {
            quantity: Quantity::Height,
            counter: self.metrics.heights.with_label_values(&[SVC_POS, key]),
            value: height,
        }])
    }
}

/// DTL family: highest L1 block synced by each sequencer's data transport
/// layer.
pub struct DtlFamily {
    clients: HashMap<String, Arc<DtlClient>>,
    metrics: ExporterMetrics,
}

impl DtlFamily {
    pub fn new(clients: HashMap<String, Arc<DtlClient>>, metrics: ExporterMetrics) -> Self {
        Self { clients, metrics }
    }
}

#[async_trait]
impl ScrapeFamily for DtlFamily {
    fn name(&self) -> &str {
        SVC_DTL
    }

    fn target_keys(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }

    fn failure_label(&self, key: &str) -> String {
        format!("seq-{}-{}", key, SVC_DTL)
    }

    async fn read(&self, key: &str) -> Result<Vec<Sample>> {
        let client = self
            .clients
            .get(key)
            .ok_or_else(|| ExporterError::Configuration(format!("unknown sequencer '{}'", key)))?;
        let height = client.highest_synced_l1().await?;
        info!("{}: '{}' synced l1 block {}", SVC_DTL, key, height);
        Ok(vec![Sample::Counter {
            quantity: Quantity::Height,
            counter: self.metrics.heights.with_label_values(&[SVC_DTL, key]),
            value: height,
        }])
    }
}

/// Builds the three sequencer families from configuration, dialing each
/// sequencer's execution RPC. Sequencers without the optional PoS or DTL
/// endpoint are excluded from those families.
pub async fn build_families(
    config: &Config,
    metrics: &ExporterMetrics,
) -> Result<(HeadFamily, EpochFamily, DtlFamily)> {
    let mut heads = HashMap::new();
    let mut pos = HashMap::new();
    let mut dtl = HashMap::new();

    for (name, endpoints) in &config.sequencer {
        let eth = EthRpcClient::connect(&endpoints.l2geth).await?;
        heads.insert(name.clone(), Arc::new(eth));

        if let Some(endpoint) = endpoints.pos_endpoint() {
            pos.insert(name.clone(), Arc::new(PosClient::new(endpoint)?));
        }
        if let Some(endpoint) = endpoints.dtl_endpoint() {
            dtl.insert(name.clone(), Arc::new(DtlClient::new(endpoint)?));
        }
    }

    Ok((
        HeadFamily::new(heads, metrics.clone()),
        EpochFamily::new(pos, metrics.clone()),
        DtlFamily::new(dtl, metrics.clone()),
    ))
}
