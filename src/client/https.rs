//! reqwest-backed HTTPS transport
//!
//! Talks to the Google Translate v2 endpoint (or any host serving the same
//! shape). The response body is returned as-is, including error payloads, so
//! that failure classification stays in the client.

use crate::client::error::{TransportError, TransportResult};
use crate::client::transport::Transport;
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

/// HTTPS transport with a fixed timeout and user agent
#[derive(Clone)]
pub struct HttpsTransport {
    client: reqwest::Client,
    /// `https` in production; tests may point at a plain HTTP listener
    scheme: String,
}

impl HttpsTransport {
    /// Build a transport from the client configuration
    ///
    /// # Errors
    ///
    /// * `TransportError::Network` - if the underlying HTTP client cannot be created
    pub fn new(config: &ClientConfig) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                TransportError::Network(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            scheme: "https".to_string(),
        })
    }

    /// Same as [`new`](Self::new) but speaking plain HTTP
    ///
    /// Only meant for local test servers.
    #[cfg(test)]
    pub(crate) fn insecure(config: &ClientConfig) -> TransportResult<Self> {
        let mut transport = Self::new(config)?;
        transport.scheme = "http".to_string();
        Ok(transport)
    }

    fn url(&self, host: &str, path: &str) -> String {
        format!("{}://{}{}", self.scheme, host, path)
    }
}

impl std::fmt::Debug for HttpsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpsTransport")
            .field("scheme", &self.scheme)
            .finish()
    }
}

#[async_trait]
impl Transport for HttpsTransport {
    async fn post(&self, host: &str, path: &str, body: &str) -> TransportResult<Vec<u8>> {
        let url = self.url(host, path);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, host, "Translation service responded");
        } else {
            warn!(%status, host, "Translation service returned an error status");
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    fn transport_name(&self) -> &str {
        "HTTPS"
    }
}
