//! HTTP implementation of the backend gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::models::{PageSlice, ResultSet, Row};
use super::{BackendGateway, GatewayError};

/// Gateway over the options-data backend's HTTP API.
///
/// # Arguments to [`HttpGateway::new`]
/// * `base_url` - Base URL of the backend (e.g., "http://127.0.0.1:6789")
/// * `timeout_secs` - Request timeout in seconds; a timed-out request
///   surfaces as `GatewayError::Transport`
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Get the base URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json(&self, path: &str) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("request to {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(GatewayError::Transport(format!(
                "{} returned status {}",
                path,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid response body from {}: {}", path, e)))
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn run_computation(&self) -> Result<Value, GatewayError> {
        debug!("Triggering one-shot option chain computation");
        self.post_json("/optionchain/run").await
    }

    async fn run_refresh(&self) -> Result<ResultSet, GatewayError> {
        debug!("Triggering contract dataset refresh");
        let value = self.post_json("/optionupdater/run").await?;
        let rows: Vec<Row> = serde_json::from_value(value).map_err(|e| {
            GatewayError::Transport(format!("invalid row array from /optionupdater/run: {}", e))
        })?;

        if rows.is_empty() {
            return Err(GatewayError::EmptyResult);
        }
        Ok(ResultSet::from_rows(rows))
    }

    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PageSlice, GatewayError> {
        let path = "/optionchain/preview.csv";
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching preview page {} (page_size {})", page, page_size);

        let response = self
            .client
            .get(&url)
            .query(&[("page", page), ("page_size", page_size)])
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("request to {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(GatewayError::Transport(format!(
                "{} returned status {}",
                path,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid page object from {}: {}", path, e)))
    }

    async fn export_dataset(&self) -> Result<(), GatewayError> {
        debug!("Triggering contract dataset export");
        self.post_json("/optioncontract/run").await?;
        Ok(())
    }
}
