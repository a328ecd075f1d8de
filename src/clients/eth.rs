//! Execution-layer JSON-RPC client
//!
//! Thin wrapper over the handful of `eth_*` methods the exporter reads:
//! latest header, account balance, and account nonce. `connect` probes the
//! endpoint once so an unreachable RPC fails at startup instead of on the
//! first tick.

use num_bigint::BigUint;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::clients::HTTP_TIMEOUT;
use crate::config::Address;
use crate::error::ExporterError;
use crate::Result;

/// Latest block header fields the exporter consumes.
#[derive(Debug, Clone, Copy)]
pub struct ChainHead {
    pub number: u64,
    pub timestamp: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    id: u64,
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcBlockHeader {
    number: String,
    timestamp: String,
}

pub struct EthRpcClient {
    http_client: Client,
    rpc_url: String,
}

impl EthRpcClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let http_client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            rpc_url: rpc_url.to_string(),
        })
    }

    /// Builds the client and probes the endpoint once with `eth_chainId`.
    pub async fn connect(rpc_url: &str) -> Result<Self> {
        let client = Self::new(rpc_url)?;
        let chain_id = client.chain_id().await?;
        info!("connected to {} (chain id {})", rpc_url, chain_id);
        Ok(client)
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let id: String = self.rpc_call("eth_chainId", json!([])).await?;
        parse_hex_u64("chainId", &id)
    }

    /// Number and timestamp of the latest block.
    pub async fn latest_header(&self) -> Result<ChainHead> {
        let header: RpcBlockHeader = self
            .rpc_call("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        Ok(ChainHead {
            number: parse_hex_u64("number", &header.number)?,
            timestamp: parse_hex_u64("timestamp", &header.timestamp)?,
        })
    }

    /// Account balance in wei at the latest block.
    pub async fn balance(&self, address: &Address) -> Result<BigUint> {
        let wei: String = self
            .rpc_call("eth_getBalance", json!([address.to_string(), "latest"]))
            .await?;
        parse_hex_biguint("balance", &wei)
    }

    /// Account transaction count at the latest block.
    pub async fn nonce(&self, address: &Address) -> Result<u64> {
        let count: String = self
            .rpc_call(
                "eth_getTransactionCount",
                json!([address.to_string(), "latest"]),
            )
            .await?;
        parse_hex_u64("transactionCount", &count)
    }

    /// Make an HTTP JSON-RPC call
    async fn rpc_call<T>(&self, method: &str, params: Value) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request_body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;

        let rpc_response: JsonRpcResponse<T> = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(ExporterError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| ExporterError::EmptyRpcResult {
            method: method.to_string(),
        })
    }
}

/// Parses a 0x-prefixed hex quantity into a u64.
pub(crate) fn parse_hex_u64(field: &str, hex_str: &str) -> Result<u64> {
    let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    u64::from_str_radix(digits, 16).map_err(|_| ExporterError::InvalidNumber {
        field: field.to_string(),
        value: hex_str.to_string(),
    })
}

/// Parses a 0x-prefixed hex quantity of arbitrary width. Wei balances do not
/// fit in a u64.
pub(crate) fn parse_hex_biguint(field: &str, hex_str: &str) -> Result<BigUint> {
    let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    BigUint::parse_bytes(digits.as_bytes(), 16).ok_or_else(|| ExporterError::InvalidNumber {
        field: field.to_string(),
        value: hex_str.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_hex_u64("n", "0x10").unwrap(), 16);
        assert_eq!(parse_hex_u64("n", "0x0").unwrap(), 0);
        assert_eq!(parse_hex_u64("n", "ff").unwrap(), 255);
        assert!(parse_hex_u64("n", "0xzz").is_err());
        assert!(parse_hex_u64("n", "").is_err());
    }

    #[test]
    fn parses_wide_hex_values() {
        // 1000 ether in wei needs more than 64 bits
        let wei = parse_hex_biguint("balance", "0x3635c9adc5dea00000").unwrap();
        assert_eq!(wei.to_string(), "1000000000000000000000");
        assert!(parse_hex_biguint("balance", "0xnope").is_err());
    }
}
