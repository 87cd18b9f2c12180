//! HTTP transport seam.
//!
//! `WeatherClient` issues its GET requests through the [`Transport`] trait so
//! callers can supply their own HTTP stack. [`ReqwestTransport`] is the default.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::error::TransportError;

const USER_AGENT: &str = concat!("rainman/", env!("CARGO_PKG_VERSION"));

/// Status and raw body of a completed GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues HTTP GET requests.
///
/// Implementations report non-2xx statuses as a normal [`TransportResponse`];
/// `Err` is reserved for failures where no response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError>;
}

/// Default transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}
