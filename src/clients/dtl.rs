//! Data-transport-layer REST client

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::clients::HTTP_TIMEOUT;
use crate::error::ExporterError;
use crate::Result;

#[derive(Debug, Deserialize)]
struct HighestSyncedResponse {
    #[serde(rename = "blockNumber")]
    block_number: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

pub struct DtlClient {
    http_client: Client,
    base_url: Url,
}

impl DtlClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let base_url =
            Url::parse(endpoint).map_err(|_| ExporterError::InvalidEndpoint(endpoint.to_string()))?;
        if !base_url.has_host() {
            return Err(ExporterError::InvalidEndpoint(endpoint.to_string()));
        }
        let http_client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Highest L1 block the transport layer has synced.
    pub async fn highest_synced_l1(&self) -> Result<u64> {
        let path = "/highest/l1";
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
                    code: i64::from(status.as_u16()),
                    message: err.error,
                }),
                Err(_) => Err(ExporterError::Rest {
                    path: path.to_string(),
                    code: i64::from(status.as_u16()),
                    message: status.to_string(),
                }),
            };
        }

        let highest: HighestSyncedResponse = response.json().await?;
        Ok(highest.block_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_highest_synced_payload() {
        let raw = r#"{ "blockNumber": 19234567 }"#;
        let highest: HighestSyncedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(highest.block_number, 19234567);
    }

    #[test]
    fn rejects_unusable_endpoints() {
        assert!(DtlClient::new("not a url").is_err());
        assert!(DtlClient::new("http://localhost:7878").is_ok());
    }
}
