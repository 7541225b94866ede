//! HTTP wallet service client

use crate::gateway::PaymentGateway;
use async_trait::async_trait;
use config::GatewayConfig;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use types::error::GatewayError;
use types::utils::sanitize_for_logging;
use types::{Result, SplitterError};

const SERVICE_NAME: &str = "wallet";

/// Body of both wallet service calls
#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    address: &'a str,
    amount: f64,
    asset: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReceivedResponse {
    received: bool,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    tx_hash: Option<String>,
}

/// HTTP client for the wallet service
#[derive(Debug, Clone)]
pub struct WalletClient {
    base_url: String,
    asset: String,
    timeout: Duration,
    http_client: Client,
}

impl WalletClient {
    /// Create a new wallet client
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("payout-splitter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SplitterError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            asset: config.asset.clone(),
            timeout,
            http_client,
        })
    }

    /// POST `body` to `{base_url}/{endpoint}` and return the successful response
    async fn post(&self, endpoint: &str, body: &TransferRequest<'_>) -> Result<Response> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = timeout(self.timeout, self.http_client.post(&url).json(body).send())
            .await
            .map_err(|_| GatewayError::ConnectionTimeout {
                service: SERVICE_NAME.to_string(),
            })?
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::ConnectionTimeout {
                        service: SERVICE_NAME.to_string(),
                    }
                } else {
                    GatewayError::HttpError {
                        service: SERVICE_NAME.to_string(),
                        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::HttpError {
                service: SERVICE_NAME.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }

        Ok(response)
    }
}

#[async_trait]
impl PaymentGateway for WalletClient {
    async fn check_tokens_received(&self, address: &str, amount: f64) -> Result<bool> {
        let request = TransferRequest {
            address,
            amount,
            asset: &self.asset,
        };

        let response = self.post("received", &request).await?;
        let body: ReceivedResponse = response.json().await.map_err(|e| {
            GatewayError::InvalidResponse {
                service: SERVICE_NAME.to_string(),
                message: format!("invalid received response: {}", e),
            }
        })?;

        tracing::debug!(
            address = %sanitize_for_logging(address),
            amount = amount,
            received = body.received,
            "Checked incoming payment"
        );

        Ok(body.received)
    }

    async fn send_tokens(&self, amount: f64, address: &str) -> Result<()> {
        let request = TransferRequest {
            address,
            amount,
            asset: &self.asset,
        };

        let response = self.post("send", &request).await?;

        // The wallet service may answer with an empty body.
        let raw_text = response.text().await.unwrap_or_default();
        let tx_hash = serde_json::from_str::<SendResponse>(&raw_text)
            .ok()
            .and_then(|r| r.tx_hash);

        tracing::info!(
            address = %sanitize_for_logging(address),
            amount = amount,
            asset = %self.asset,
            tx_hash = ?tx_hash,
            "Sent tokens"
        );

        Ok(())
    }

    fn name(&self) -> &str {
        SERVICE_NAME
    }
}
