//! Error types for the sequencer exporter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid address '{0}': expected 0x-prefixed 40-char hex")]
    InvalidAddress(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("RPC response for '{method}' carried no result")]
    EmptyRpcResult { method: String },

    #[error("REST error on {path} (code {code}): {message}")]
    Rest {
        path: String,
        code: i64,
        message: String,
    },

    #[error("Invalid endpoint URL '{0}'")]
    InvalidEndpoint(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metrics registration error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("HTTP server error: {0}")]
    Server(#[from] hyper::Error),

    #[error("Invalid numeric field '{field}': {value}")]
    InvalidNumber { field: String, value: String },

    #[error("Duplicate wallet alias '{alias}' collides with a custody variant")]
    DuplicateWalletAlias { alias: String },

    #[error("Failed to resolve required custody variant '{variant}': {source}")]
    CustodyResolution {
        variant: String,
        #[source]
        source: Box<ExporterError>,
    },

    #[error("Read timed out after {secs}s")]
    ReadTimeout { secs: u64 },

    #[error("Read aborted by shutdown")]
    Cancelled,
}
