//! Configuration for the sequencer exporter
//!
//! Two layers: process settings from environment variables (envy) and the
//! target configuration file (JSON) naming sequencer endpoints and wallets.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ExporterError;
use crate::Result;

/// Process settings, loaded once from the environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Path to the target configuration file
    #[serde(default = "default_config_path")]
    pub config_path: String,

    /// HTTP listen port for /metrics and /ping
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Scrape cadence for the sequencer families (seconds)
    #[serde(default = "default_sequencer_interval_secs")]
    pub sequencer_scrape_interval_secs: u64,

    /// Scrape cadence for the wallet families (seconds)
    #[serde(default = "default_wallet_interval_secs")]
    pub wallet_scrape_interval_secs: u64,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> std::result::Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn sequencer_interval(&self) -> Duration {
        Duration::from_secs(self.sequencer_scrape_interval_secs)
    }

    pub fn wallet_interval(&self) -> Duration {
        Duration::from_secs(self.wallet_scrape_interval_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            metrics_port: default_metrics_port(),
            sequencer_scrape_interval_secs: default_sequencer_interval_secs(),
            wallet_scrape_interval_secs: default_wallet_interval_secs(),
        }
    }
}

fn default_config_path() -> String {
    "config.json".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_sequencer_interval_secs() -> u64 {
    15
}

fn default_wallet_interval_secs() -> u64 {
    60
}

/// A 20-byte EVM account address. Parsed from 0x-hex, displayed lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        let hex_str = s
            .strip_prefix("0x")
            .ok_or_else(|| ExporterError::InvalidAddress(s.to_string()))?;
        let bytes = hex::decode(hex_str).map_err(|_| ExporterError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ExporterError::InvalidAddress(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Target configuration file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Sequencer alias -> endpoint set
    #[serde(default)]
    pub sequencer: HashMap<String, SequencerEndpoints>,

    /// Wallet monitoring section. Absent means the wallet families are not started.
    #[serde(default)]
    pub wallet: Option<WalletSection>,
}

/// Endpoints for one monitored sequencer. `pos` and `l1dtl` are optional;
/// a missing or empty value excludes the sequencer from that family.
#[derive(Debug, Clone, Deserialize)]
pub struct SequencerEndpoints {
    pub l2geth: String,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub l1dtl: Option<String>,
}

impl SequencerEndpoints {
    pub fn pos_endpoint(&self) -> Option<&str> {
        self.pos.as_deref().filter(|s| !s.is_empty())
    }

    pub fn dtl_endpoint(&self) -> Option<&str> {
        self.l1dtl.as_deref().filter(|s| !s.is_empty())
    }
}

/// Wallet monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletSection {
    /// PoS REST endpoint used to resolve custody addresses. Optional;
    /// absent means only user-configured wallets are tracked.
    #[serde(default)]
    pub pos: Option<String>,

    /// L2 execution RPC used for balance/nonce reads
    pub l2geth: String,

    /// L1 execution RPC used for balance/nonce reads
    pub l1geth: String,

    /// User-configured wallets, alias -> address
    #[serde(default)]
    pub wallets: HashMap<String, Address>,
}

impl WalletSection {
    pub fn pos_endpoint(&self) -> Option<&str> {
        self.pos.as_deref().filter(|s| !s.is_empty())
    }
}

impl Config {
    /// Load and validate the target configuration file. Only `.json` files
    /// are accepted; any parse or validation failure is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {}
            _ => {
                return Err(ExporterError::Configuration(format!(
                    "unsupported config format for '{}', expected a .json file",
                    path.display()
                )))
            }
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExporterError::Configuration(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            ExporterError::Configuration(format!("failed to parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, endpoints) in &self.sequencer {
            if endpoints.l2geth.is_empty() {
                return Err(ExporterError::Configuration(format!(
                    "sequencer '{}' has no l2geth endpoint",
                    name
                )));
            }
        }
        if let Some(wallet) = &self.wallet {
            if wallet.l2geth.is_empty() || wallet.l1geth.is_empty() {
                return Err(ExporterError::Configuration(
                    "wallet section requires both l2geth and l1geth endpoints".to_string(),
                ));
            }
        }
        Ok(())
    }
}
