//! HTTP transport for the danmaku crate
//!
//! The crawler only needs one capability from the network: send a GET and
//! hand back the status and raw body. `Transport` captures that, so the
//! discovery and collection logic can run against `MockTransport` in tests.

pub mod mock_transport;

use crate::config::RequestHeaders;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as ReqwestClient;
use std::borrow::Cow;
use tracing::{debug, instrument};
use url::Url;

/// Status code and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Transport-level status code
    pub status: u16,

    /// Raw response body
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the transport-level status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Capability to issue a GET request
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status. `Err` is reserved for requests that never completed.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &Url) -> Result<RawResponse>;
}

/// reqwest-backed transport that sends the configured static headers
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Create a client sending `headers` with every request
    pub fn new(headers: &RequestHeaders) -> Result<Self> {
        let mut map = HeaderMap::new();
        for (name, value) in headers.pairs() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidRequest(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                Error::InvalidRequest(format!("Invalid value for header {}: {}", name, e))
            })?;
            map.insert(name, value);
        }

        let client = ReqwestClient::builder().default_headers(map).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpClient {
    #[instrument(skip(self), fields(url = %url), level = "debug")]
    async fn get(&self, url: &Url) -> Result<RawResponse> {
        debug!("Sending GET request");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(status, bytes = body.len(), "Received response");
        Ok(RawResponse { status, body })
    }
}
