/// Translation client
///
/// This module turns translation requests into calls against the Google
/// Translate v2 API while keeping redundant traffic down and tolerating
/// malformed or partial responses.
///
/// # Overview
///
/// 1. **Transport** - one HTTPS POST per request, behind a trait so tests can
///    substitute a scripted mock
/// 2. **TranslationClient** - validation, cache lookup, request building,
///    response extraction, encoding repair and failure classification
///
/// # Example
///
/// ```ignore
/// use cet_translate::client::{MockMode, MockTransport, TranslationClient};
/// use cet_translate::config::ClientConfig;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mock = Arc::new(MockTransport::new(MockMode::Echo));
///     let mut client = TranslationClient::new(ClientConfig::default(), mock);
///     client.initialize("any-key")?;
///
///     assert_eq!(client.translate("hello", "en", "fr").await?, "hello_fr");
///     Ok(())
/// }
/// ```
pub mod error;
pub mod https;
pub mod mock;
pub mod transport;
pub mod translator;


pub use error::{TransportError, TransportResult, TranslateError, TranslationResult};
pub use https::HttpsTransport;
pub use mock::{MockMode, MockTransport, RecordedRequest};
pub use transport::Transport;
pub use translator::{MAX_TEXT_BYTES, TranslationClient, build_request_body, normalize_language};
