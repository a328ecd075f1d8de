//! Exported metric families
//!
//! All series live on an explicit registry handed to the HTTP server; nothing
//! touches the prometheus default registry.

use prometheus::{GaugeVec, IntCounterVec, Opts, Registry};

use crate::Result;

/// Handles to every exported vec. Cloning is cheap; the underlying
/// collectors are shared.
#[derive(Clone)]
pub struct ExporterMetrics {
    /// Block height advance per sequencer service, labels {svc_name, seq_name}
    pub heights: IntCounterVec,

    /// Block timestamp advance per sequencer, labels {svc_name, seq_name}
    pub timestamps: IntCounterVec,

    /// Wallet balance in ether, labels {chain, addr, alias}
    pub wallet_balance: GaugeVec,

    /// Wallet nonce advance, labels {chain, addr, alias}
    pub wallet_nonce: IntCounterVec,

    /// Failed target reads, labels {svc_name}
    pub failures: IntCounterVec,
}

impl ExporterMetrics {
    /// Build every vec and register it on the given registry.
    pub fn register(registry: &Registry) -> Result<Self> {
        let heights = IntCounterVec::new(
            Opts::new("sequencer:height", "sequencer block height"),
            &["svc_name", "seq_name"],
        )?;
        let timestamps = IntCounterVec::new(
            Opts::new("sequencer:timestamp", "sequencer block timestamp"),
            &["svc_name", "seq_name"],
        )?;
        let wallet_balance = GaugeVec::new(
            Opts::new("sequencer:wallet:balance", "wallet balance in ether"),
            &["chain", "addr", "alias"],
        )?;
        let wallet_nonce = IntCounterVec::new(
            Opts::new("sequencer:wallet:nonce", "wallet nonce"),
            &["chain", "addr", "alias"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new("sequencer_exporter_failures", "failed scrapes per service"),
            &["svc_name"],
        )?;

        registry.register(Box::new(heights.clone()))?;
        registry.register(Box::new(timestamps.clone()))?;
        registry.register(Box::new(wallet_balance.clone()))?;
        registry.register(Box::new(wallet_nonce.clone()))?;
        registry.register(Box::new(failures.clone()))?;

        Ok(Self {
            heights,
            timestamps,
            wallet_balance,
            wallet_nonce,
            failures,
        })
    }
}
