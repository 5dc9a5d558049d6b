//! The downstream-service seam.
//!
//! Matching rules are notified with a JSON POST. The trait exists so
//! dispatcher tests can count and inspect calls without a network.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use super::payload::OutboundPayload;

/// Bound on every downstream round-trip; expiry is a failure for that
/// rule only.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failure talking to a rule's service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A downstream service's answer. Any status code is a valid answer; the
/// dispatcher classifies it.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

/// POSTs outbound payloads to rule URLs.
pub trait ServiceCaller: Send + Sync {
    fn call(
        &self,
        url: &str,
        payload: &OutboundPayload,
    ) -> impl Future<Output = Result<ServiceResponse, ServiceError>> + Send;
}

/// The reqwest-backed caller used in production.
#[derive(Debug, Clone)]
pub struct HttpServiceCaller {
    http: reqwest::Client,
}

impl HttpServiceCaller {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("change-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client construction cannot fail with static configuration");
        HttpServiceCaller { http }
    }
}

impl Default for HttpServiceCaller {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceCaller for HttpServiceCaller {
    async fn call(
        &self,
        url: &str,
        payload: &OutboundPayload,
    ) -> Result<ServiceResponse, ServiceError> {
        debug!(url = %url, "posting payload");
        let response = self.http.post(url).json(payload).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ServiceResponse { status, body })
    }
}
