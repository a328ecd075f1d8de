//! PoS/consensus REST client
//!
//! The PoS API wraps every successful payload in an envelope carrying the
//! chain height the answer was computed at, with the height encoded as a
//! string. Error payloads carry `{code, error}` instead. The exporter uses
//! two endpoints: the latest span and the latest custody address per
//! variant ordinal.

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::clients::HTTP_TIMEOUT;
use crate::config::Address;
use crate::error::ExporterError;
use crate::Result;

/// Envelope around every successful PoS API payload.
#[derive(Debug, Deserialize)]
struct ResponseWithHeight<T> {
    height: String,
    result: T,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: i64,
    error: String,
}

/// Current span summary. Only the fields the exporter consumes are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct Span {
    pub span_id: u64,
    pub start_block: u64,
    pub end_block: u64,
}

/// Custody address record.
#[derive(Debug, Clone, Deserialize)]
pub struct CustodyInfo {
    #[serde(default)]
    pub mpc_id: String,
    #[serde(default)]
    pub threshold: u64,
    pub mpc_address: Address,
    #[serde(default)]
    pub mpc_type: u64,
}

pub struct PosClient {
    http_client: Client,
    base_url: Url,
}

impl PosClient {
    /// Builds a client for `endpoint`. Any path component is dropped; the
    /// API is always addressed from the host root.
    pub fn new(endpoint: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(endpoint).map_err(|_| ExporterError::InvalidEndpoint(endpoint.to_string()))?;
        if !base_url.has_host() {
            return Err(ExporterError::InvalidEndpoint(endpoint.to_string()));
        }
        base_url.set_path("/");
        let http_client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Latest span and the chain height it was reported at.
    pub async fn latest_span(&self) -> Result<(u64, Span)> {
        self.get_with_height("/latest-span").await
    }

    /// Current custody address for one variant ordinal.
    pub async fn custody_address(&self, ordinal: u8) -> Result<CustodyInfo> {
        let (_, info) = self
            .get_with_height(&format!("/mpc/latest/{}", ordinal))
            .await?;
        Ok(info)
    }

    async fn get_with_height<T>(&self, path: &str) -> Result<(u64, T)>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|_| ExporterError::InvalidEndpoint(format!("{}{}", self.base_url, path)))?;
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return match response.json::<ErrorResponse>().await {
                Ok(err) => Err(ExporterError::Rest {
                    path: path.to_string(),
                    code: err.code,
                    message: err.error,
                }),
                Err(_) => Err(ExporterError::Rest {
                    path: path.to_string(),
                    code: i64::from(status.as_u16()),
                    message: status.to_string(),
                }),
            };
        }

        let wrapped: ResponseWithHeight<T> = response.json().await?;
        let height = wrapped
            .height
            .parse::<u64>()
            .map_err(|_| ExporterError::InvalidNumber {
                field: "height".to_string(),
                value: wrapped.height.clone(),
            })?;
        Ok((height, wrapped.result))
    }
}
