//! HTTP implementation of the gateway client.

use async_trait::async_trait;
use common::{OrderRequest, Pattern};
use serde::de::DeserializeOwned;

use crate::client::GatewayClient;
use crate::error::{GatewayError, Result};
use crate::faults::{ConfigStatus, FaultToggle, ToggleAck};
use crate::response::PlaceOrderResponse;

/// Path of the aggregated fault-injection status endpoint.
pub const CONFIG_STATUS_PATH: &str = "/api/gateway/config/status";

/// Gateway client backed by `reqwest`.
///
/// No request timeout is configured; a call blocks for as long as the
/// transport allows.
#[derive(Debug, Clone)]
pub struct HttpGatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGatewayClient {
    /// Creates a client for the gateway at `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client that reuses an existing `reqwest` client.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Result<Self> {
        let url = base_url.into();
        let parsed = reqwest::Url::parse(&url).map_err(|e| GatewayError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidUrl {
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
                url,
            });
        }

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the absolute URL for a gateway path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| GatewayError::Decode {
            status: status.as_u16(),
            source,
        })
    }

    async fn expect_success<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Self::decode(response).await
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    #[tracing::instrument(skip(self, request), fields(%pattern))]
    async fn place_order(
        &self,
        pattern: Pattern,
        request: &OrderRequest,
    ) -> Result<PlaceOrderResponse> {
        let response = self
            .http
            .post(self.url(pattern.endpoint()))
            .json(request)
            .send()
            .await?;

        tracing::debug!(status = response.status().as_u16(), "gateway responded");

        // Failed orders come back as 5xx with the regular body, so the
        // status alone says nothing about decodability.
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn config_status(&self) -> Result<ConfigStatus> {
        let response = self.http.get(self.url(CONFIG_STATUS_PATH)).send().await?;
        Self::expect_success(response).await
    }

    #[tracing::instrument(skip(self), fields(%toggle))]
    async fn set_toggle(&self, toggle: FaultToggle, enabled: bool) -> Result<ToggleAck> {
        let response = self
            .http
            .post(self.url(&toggle.path(enabled)))
            .send()
            .await?;
        let ack: ToggleAck = Self::expect_success(response).await?;
        tracing::info!(setting = %ack.setting, enabled = ack.enabled, "fault toggle updated");
        Ok(ack)
    }
}
