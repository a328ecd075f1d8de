//! Wallet metric families
//!
//! One family per chain (L2 and L1) scrapes every tracked wallet for its
//! balance and nonce. Balances are snapshots and go straight to a gauge in
//! ether; nonces flow through the accumulator with zero visibility, so a
//! wallet that has never transacted still exports a nonce series at 0.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::accumulator::Quantity;
use crate::clients::{EthRpcClient, PosClient};
use crate::config::{Address, WalletSection};
use crate::custody;
use crate::error::ExporterError;
use crate::metrics::ExporterMetrics;
use crate::scrape_engine::{Sample, ScrapeFamily};
use crate::units::wei_to_ether;
use crate::Result;

pub const CHAIN_L2: &str = "l2";
pub const CHAIN_L1: &str = "l1";

/// Balance and nonce for every tracked wallet on one chain.
pub struct WalletFamily {
    name: String,
    chain: &'static str,
    rpc: Arc<EthRpcClient>,
    wallets: HashMap<String, Address>,
    metrics: ExporterMetrics,
}

impl WalletFamily {
    pub fn new(
        chain: &'static str,
        rpc: Arc<EthRpcClient>,
        wallets: HashMap<String, Address>,
        metrics: ExporterMetrics,
    ) -> Self {
        Self {
            name: format!("{}-wallet", chain),
            chain,
            rpc,
            wallets,
            metrics,
        }
    }
}

#[async_trait]
impl ScrapeFamily for WalletFamily {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_keys(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    fn failure_label(&self, key: &str) -> String {
        format!("{}-{}", self.name, key)
    }

    async fn read(&self, key: &str) -> Result<Vec<Sample>> {
        let address = self
            .wallets
            .get(key)
            .ok_or_else(|| ExporterError::Configuration(format!("unknown wallet '{}'", key)))?;

        let wei = self.rpc.balance(address).await?;
        let nonce = self.rpc.nonce(address).await?;
        let balance = wei_to_ether(&wei);
        info!(
            "{}: '{}' ({}) balance {} nonce {}",
            self.name, key, address, balance, nonce
        );

        let addr = address.to_string();
        Ok(vec![
            Sample::Gauge {
                gauge: self
                    .metrics
                    .wallet_balance
                    .with_label_values(&[self.chain, &addr, key]),
                value: balance,
            },
            Sample::Counter {
                quantity: Quantity::Nonce,
                counter: self
                    .metrics
                    .wallet_nonce
                    .with_label_values(&[self.chain, &addr, key]),
                value: nonce,
            },
        ])
    }
}

/// Builds the L2 and L1 wallet families from the wallet section. Custody
/// addresses are resolved through the PoS endpoint when one is configured;
/// both families track the same merged wallet set.
pub async fn build_families(
    section: &WalletSection,
    metrics: &ExporterMetrics,
) -> Result<(WalletFamily, WalletFamily)> {
    let pos = match section.pos_endpoint() {
        Some(endpoint) => Some(PosClient::new(endpoint)?),
        None => None,
    };
    let wallets = custody::resolve_wallets(pos.as_ref(), &section.wallets).await?;

    let l2 = Arc::new(EthRpcClient::connect(&section.l2geth).await?);
    let l1 = Arc::new(EthRpcClient::connect(&section.l1geth).await?);

    Ok((
        WalletFamily::new(CHAIN_L2, l2, wallets.clone(), metrics.clone()),
        WalletFamily::new(CHAIN_L1, l1, wallets, metrics.clone()),
    ))
}
