//! Transport boundary
//!
//! The client never talks to the network directly. It hands a fully built
//! request to a `Transport`, which performs exactly one POST and returns the
//! raw response body. Swapping the transport is how tests run the whole
//! pipeline without network access.
//!
//! # Example
//!
//! ```ignore
//! use cet_translate::client::{HttpsTransport, Transport};
//! use cet_translate::config::ClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpsTransport::new(&ClientConfig::default())?;
//!     let body = transport
//!         .post(
//!             "translation.googleapis.com",
//!             "/language/translate/v2?key=KEY",
//!             r#"{"q":"Hello","source":"en","target":"fr","format":"text"}"#,
//!         )
//!         .await?;
//!     println!("{}", String::from_utf8_lossy(&body));
//!     Ok(())
//! }
//! ```

use crate::client::error::TransportResult;
use async_trait::async_trait;

/// One-shot HTTPS POST exchange
///
/// Implementations send `body` with `Content-Type: application/json` to
/// `https://{host}{path}` and return the complete response body, whatever
/// the HTTP status. Timeouts are reported as
/// [`TransportError::Timeout`](crate::client::TransportError::Timeout) and
/// every other failure as
/// [`TransportError::Network`](crate::client::TransportError::Network).
/// No retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one POST request and collect the response body
    async fn post(&self, host: &str, path: &str, body: &str) -> TransportResult<Vec<u8>>;

    /// Name used in logs and `status` output
    fn transport_name(&self) -> &str;
}
