//! HTTP client for the metrics analytics service.
//!
//! One `ServiceClient` wraps a connection-pooled `reqwest::Client` bound to
//! a base URL. The raw endpoint methods return `Result` so callers that
//! need per-status classification (the load profile) can do it themselves;
//! `send_metric` is the generator-facing wrapper that reduces everything to
//! a success boolean.

use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::ErrorCategory;
use crate::payload::MetricRecord;

/// Client bound to one service instance.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    /// Builds a client with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /metrics-data` with the record as JSON body.
    pub async fn submit_metric(
        &self,
        record: &MetricRecord,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(format!("{}/metrics-data", self.base_url))
            .json(record)
            .send()
            .await
    }

    /// `GET /analyze`.
    pub async fn analytics(&self) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(format!("{}/analyze", self.base_url))
            .send()
            .await
    }

    /// `GET /stats`.
    pub async fn stats(&self) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(format!("{}/stats", self.base_url))
            .send()
            .await
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
    }

    /// Submits a record and reduces the outcome to a boolean.
    ///
    /// True iff the service answered 202 Accepted. Any other status and any
    /// transport error is logged and yields false; nothing propagates.
    pub async fn send_metric(&self, record: &MetricRecord) -> bool {
        match self.submit_metric(record).await {
            Ok(response) => {
                let status = response.status();
                drain_body(response).await;

                if status == StatusCode::ACCEPTED {
                    debug!(status = status.as_u16(), "Metric accepted");
                    true
                } else {
                    warn!(status = status.as_u16(), "Unexpected status for metric submission");
                    false
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    category = %ErrorCategory::from_reqwest_error(&e),
                    "Error sending metric"
                );
                false
            }
        }
    }

    /// Best-effort fetch of the service statistics object.
    ///
    /// Used once at generator shutdown; every failure is swallowed.
    pub async fn fetch_final_stats(&self) -> Option<serde_json::Value> {
        let response = self.stats().await.ok()?;
        if response.status() != StatusCode::OK {
            return None;
        }
        response.json().await.ok()
    }
}

/// Streams and discards a response body without buffering it whole.
///
/// Unconsumed bodies accumulate in the connection pool; chunks are read and
/// immediately dropped.
pub async fn drain_body(mut response: reqwest::Response) {
    while let Ok(Some(_chunk)) = response.chunk().await {}
}
