//! Caching translation client
//!
//! `TranslationClient` is the entry point for translations. It validates the
//! request, answers from the cache when it can, and otherwise sends one
//! request through its [`Transport`], pulls `translatedText` out of the
//! response, repairs the encoding and caches the result.
//!
//! The client is single-owner: `translate` takes `&mut self`, so one client
//! can never serve two requests at once. Share it behind a
//! `tokio::sync::Mutex` if several tasks need it.
//!
//! # Example
//!
//! ```ignore
//! use cet_translate::client::TranslationClient;
//! use cet_translate::config::ClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = TranslationClient::with_https(ClientConfig::from_env()?)?;
//!     client.initialize(&std::env::var("GOOGLE_TRANSLATE_API_KEY")?)?;
//!
//!     let result = client.translate("Hello, world!", "en", "fr").await?;
//!     println!("{}", result); // "Bonjour le monde!"
//!
//!     // Served from the cache, no second request
//!     let again = client.translate("Hello, world!", "en", "fr").await?;
//!     assert_eq!(result, again);
//!     Ok(())
//! }
//! ```

use crate::cache::{CacheStats, TranslationCache, cache_key};
use crate::client::error::{TranslateError, TranslationResult, TransportResult};
use crate::client::https::HttpsTransport;
use crate::client::transport::Transport;
use crate::codec::{fix_utf8, url_encode};
use crate::config::ClientConfig;
use crate::extract::{TRANSLATED_TEXT_FIELD, extract_api_error, extract_string_field};
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// Longest text accepted in one request (Google Translate v2 limit)
pub const MAX_TEXT_BYTES: usize = 30_000;

static LANGUAGE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2,3}(-[a-z0-9]{2,8})*$").expect("language code pattern is valid")
});

enum ClientState {
    Uninitialized,
    Initialized { api_key: String },
}

/// Translation client with a TTL- and size-bounded cache
pub struct TranslationClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    state: ClientState,
    cache: TranslationCache,
}

impl TranslationClient {
    /// Create an uninitialized client on top of `transport`
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let cache = TranslationCache::new(config.cache_ttl(), config.max_cache_entries);
        Self {
            config,
            transport,
            state: ClientState::Uninitialized,
            cache,
        }
    }

    /// Create an uninitialized client using the reqwest HTTPS transport
    pub fn with_https(config: ClientConfig) -> TransportResult<Self> {
        let transport = HttpsTransport::new(&config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Move to the initialized state with `api_key`
    ///
    /// An already initialized client is shut down first, which also empties
    /// its cache.
    ///
    /// # Errors
    ///
    /// * `TranslateError::InvalidParams` - if the key is blank; the client is
    ///   left uninitialized
    pub fn initialize(&mut self, api_key: &str) -> Result<(), TranslateError> {
        if self.is_initialized() {
            self.shutdown();
        }

        let api_key = api_key.trim();
        if api_key.is_empty() {
            warn!("Refusing to initialize translator without an API key");
            return Err(TranslateError::InvalidParams(
                "API key cannot be empty".to_string(),
            ));
        }

        self.state = ClientState::Initialized {
            api_key: api_key.to_string(),
        };
        info!(
            host = %self.config.host,
            transport = self.transport.transport_name(),
            "Translation client initialized"
        );
        Ok(())
    }

    /// Return to the uninitialized state and drop every cached translation
    pub fn shutdown(&mut self) {
        self.cache.clear();
        self.state = ClientState::Uninitialized;
        info!("Translation client shut down");
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, ClientState::Initialized { .. })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn transport_name(&self) -> &str {
        self.transport.transport_name()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Translate `text` from `from_lang` to `to_lang`
    ///
    /// A live cached translation is returned without touching the network.
    /// Otherwise exactly one request is made; there are no retries.
    ///
    /// # Errors
    ///
    /// * `InvalidParams` - uninitialized client, empty text, or a missing or
    ///   malformed language code
    /// * `NetworkError` - transport failure or an empty response body
    /// * `TimeoutError` - the transport timed out
    /// * `ApiError` - the response held no non-empty `translatedText`
    /// * `EncodingError` - the translation was not salvageable as UTF-8
    pub async fn translate(
        &mut self,
        text: &str,
        from_lang: &str,
        to_lang: &str,
    ) -> TranslationResult {
        let api_key = match &self.state {
            ClientState::Initialized { api_key } => api_key.clone(),
            ClientState::Uninitialized => {
                warn!("Translation requested before the client was initialized");
                return Err(TranslateError::InvalidParams(
                    "translator not initialized".to_string(),
                ));
            }
        };

        if text.is_empty() {
            return Err(TranslateError::InvalidParams("empty text".to_string()));
        }
        if text.len() > MAX_TEXT_BYTES {
            return Err(TranslateError::InvalidParams(format!(
                "text exceeds maximum length of {} bytes",
                MAX_TEXT_BYTES
            )));
        }
        let from_lang = normalize_language(from_lang)?;
        let to_lang = normalize_language(to_lang)?;

        let key = cache_key(text, &from_lang, &to_lang);
        if let Some(cached) = self.cache.get(&key) {
            debug!(from = %from_lang, to = %to_lang, "Translation cache hit");
            return Ok(cached);
        }

        self.cache.sweep_expired();

        let body = build_request_body(text, &from_lang, &to_lang);
        let path = format!("{}?key={}", self.config.path, url_encode(&api_key));
        debug!(
            from = %from_lang,
            to = %to_lang,
            bytes = text.len(),
            "Requesting translation"
        );

        let response = self
            .transport
            .post(&self.config.host, &path, &body)
            .await
            .inspect_err(|e| warn!(error = %e, "Translation request failed"))?;

        if response.is_empty() {
            warn!("Empty response from translation service");
            return Err(TranslateError::NetworkError(
                "empty response from translation service".to_string(),
            ));
        }

        let raw = match extract_string_field(&response, TRANSLATED_TEXT_FIELD) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                let detail = extract_api_error(&response)
                    .unwrap_or_else(|| "response has no translatedText".to_string());
                warn!(
                    detail = %detail,
                    preview = %preview(&response),
                    "Failed to parse translation from response"
                );
                return Err(TranslateError::ApiError(detail));
            }
        };

        let translation = fix_utf8(raw).map_err(|e| {
            warn!(error = %e, "Translated text is not valid UTF-8");
            TranslateError::EncodingError(e.to_string())
        })?;

        self.cache.insert(key, translation.clone());
        self.cache.enforce_capacity();
        debug!(cached = self.cache.len(), "Translation successful");
        Ok(translation)
    }
}

impl std::fmt::Debug for TranslationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let api_key = match self.state {
            ClientState::Initialized { .. } => Some("***"),
            ClientState::Uninitialized => None,
        };
        f.debug_struct("TranslationClient")
            .field("host", &self.config.host)
            .field("transport", &self.transport.transport_name())
            .field("api_key", &api_key)
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Build the v2 request body with every field JSON-escaped
pub fn build_request_body(text: &str, from_lang: &str, to_lang: &str) -> String {
    json!({
        "q": text,
        "source": from_lang,
        "target": to_lang,
        "format": "text"
    })
    .to_string()
}

/// Trim and lowercase a language code, then check its shape
///
/// Accepts ISO 639 codes with optional subtags: `en`, `haw`, `zh-CN`
/// (becomes `zh-cn`).
///
/// # Errors
///
/// * `TranslateError::InvalidParams` - empty or malformed code
pub fn normalize_language(code: &str) -> Result<String, TranslateError> {
    let code = code.trim().to_lowercase();
    if code.is_empty() {
        return Err(TranslateError::InvalidParams(
            "language code is empty".to_string(),
        ));
    }
    if !LANGUAGE_CODE.is_match(&code) {
        return Err(TranslateError::InvalidParams(format!(
            "invalid language code: {}",
            code
        )));
    }
    Ok(code)
}

/// First 200 bytes of a response, for logs
fn preview(body: &[u8]) -> String {
    let end = body.len().min(200);
    String::from_utf8_lossy(&body[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockMode, MockTransport};
    use std::time::Duration;

    fn client_with(mock: &Arc<MockTransport>) -> TranslationClient {
        let mut client = TranslationClient::new(ClientConfig::default(), mock.clone());
        client.initialize("test-key").unwrap();
        client
    }

    // ========== State machine ==========

    #[tokio::test]
    async fn test_uninitialized_rejects() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = TranslationClient::new(ClientConfig::default(), mock.clone());
        assert!(!client.is_initialized());
        let result = client.translate("hello", "en", "fr").await;
        assert!(matches!(result, Err(TranslateError::InvalidParams(_))));
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_initialize_blank_key() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = TranslationClient::new(ClientConfig::default(), mock);
        assert!(client.initialize("   ").is_err());
        assert!(!client.is_initialized());
    }

    #[tokio::test]
    async fn test_shutdown_clears_cache_and_state() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = client_with(&mock);
        client.translate("hello", "en", "fr").await.unwrap();
        assert_eq!(client.cache_stats().entries, 1);

        client.shutdown();
        assert!(!client.is_initialized());
        assert_eq!(client.cache_stats().entries, 0);
        assert!(matches!(
            client.translate("hello", "en", "fr").await,
            Err(TranslateError::InvalidParams(_))
        ));
    }

    #[tokio::test]
    async fn test_reinitialize_clears_cache() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = client_with(&mock);
        client.translate("hello", "en", "fr").await.unwrap();

        client.initialize("other-key").unwrap();
        assert!(client.is_initialized());
        assert_eq!(client.cache_stats().entries, 0);

        client.translate("hello", "en", "fr").await.unwrap();
        assert_eq!(mock.calls(), 2);
        assert!(mock.last_request().unwrap().path.ends_with("key=other-key"));
    }

    // ========== Input validation ==========

    #[tokio::test]
    async fn test_empty_inputs_rejected_without_network() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = client_with(&mock);
        for (text, from, to) in [("", "en", "fr"), ("hi", "", "fr"), ("hi", "en", ""), ("hi", "  ", "fr")] {
            assert!(matches!(
                client.translate(text, from, to).await,
                Err(TranslateError::InvalidParams(_))
            ));
        }
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_text_rejected() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = client_with(&mock);
        let text = "x".repeat(MAX_TEXT_BYTES + 1);
        assert!(matches!(
            client.translate(&text, "en", "fr").await,
            Err(TranslateError::InvalidParams(_))
        ));
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("en").unwrap(), "en");
        assert_eq!(normalize_language(" FR ").unwrap(), "fr");
        assert_eq!(normalize_language("zh-CN").unwrap(), "zh-cn");
        assert_eq!(normalize_language("haw").unwrap(), "haw");
    }

    #[test]
    fn test_normalize_language_invalid() {
        assert!(normalize_language("").is_err());
        assert!(normalize_language("e").is_err());
        assert!(normalize_language("en@US").is_err());
        assert!(normalize_language("fr#bad").is_err());
        assert!(normalize_language("english").is_err());
        assert!(normalize_language("en-").is_err());
    }

    #[test]
    fn test_normalize_language_error_message() {
        match normalize_language("en@US") {
            Err(TranslateError::InvalidParams(msg)) => assert!(msg.contains("en@us")),
            other => panic!("Expected InvalidParams, got {:?}", other),
        }
    }

    // ========== Request construction ==========

    #[test]
    fn test_build_request_body_escapes() {
        let body = build_request_body("say \"hi\"\n\\", "en", "fr");
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["q"], "say \"hi\"\n\\");
        assert_eq!(value["source"], "en");
        assert_eq!(value["target"], "fr");
        assert_eq!(value["format"], "text");
    }

    #[tokio::test]
    async fn test_request_goes_to_configured_endpoint() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = TranslationClient::new(ClientConfig::default(), mock.clone());
        client.initialize("k&y=1").unwrap();
        client.translate("hello", "EN", "fr").await.unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.host, "translation.googleapis.com");
        assert_eq!(request.path, "/language/translate/v2?key=k%26y%3D1");
        let value: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(value["source"], "en");
    }

    // ========== Cache behaviour ==========

    #[tokio::test]
    async fn test_cache_hit_avoids_network() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = client_with(&mock);
        let first = client.translate("hello", "en", "fr").await.unwrap();
        let second = client.translate("hello", "en", "fr").await.unwrap();
        assert_eq!(first, "hello_fr");
        assert_eq!(first, second);
        assert_eq!(mock.calls(), 1);
        assert_eq!(client.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_cache_key_direction_sensitive() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = client_with(&mock);
        assert_eq!(client.translate("hello", "en", "fr").await.unwrap(), "hello_fr");
        assert_eq!(client.translate("hello", "fr", "en").await.unwrap(), "hello_en");
        assert_eq!(mock.calls(), 2);
        assert_eq!(client.cache_stats().entries, 2);
    }

    #[tokio::test]
    async fn test_normalized_codes_share_cache_entry() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let mut client = client_with(&mock);
        client.translate("hello", "en", "fr").await.unwrap();
        client.translate("hello", "EN", " fr").await.unwrap();
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetched() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let config = ClientConfig {
            cache_ttl_secs: 0,
            ..ClientConfig::default()
        };
        let mut client = TranslationClient::new(config, mock.clone());
        client.initialize("k").unwrap();

        client.translate("hello", "en", "fr").await.unwrap();
        client.translate("hello", "en", "fr").await.unwrap();
        assert_eq!(mock.calls(), 2);
        // The stale entry was swept before the second insert
        assert_eq!(client.cache_stats().entries, 1);
    }

    #[tokio::test]
    async fn test_capacity_bound_holds() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let config = ClientConfig {
            max_cache_entries: 4,
            ..ClientConfig::default()
        };
        let mut client = TranslationClient::new(config, mock.clone());
        client.initialize("k").unwrap();

        for i in 0..5 {
            client.translate(&format!("text{}", i), "en", "fr").await.unwrap();
            assert!(client.cache_stats().entries <= 4);
        }
        // Five entries trimmed down to half the cap
        assert_eq!(client.cache_stats().entries, 2);

        // Newest survive, oldest were evicted
        client.translate("text4", "en", "fr").await.unwrap();
        assert_eq!(mock.calls(), 5);
        client.translate("text0", "en", "fr").await.unwrap();
        assert_eq!(mock.calls(), 6);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mock = Arc::new(MockTransport::new(MockMode::Empty));
        let mut client = client_with(&mock);
        let _ = client.translate("hello", "en", "fr").await;
        let _ = client.translate("hello", "en", "fr").await;
        assert_eq!(mock.calls(), 2);
        assert_eq!(client.cache_stats().entries, 0);
    }

    // ========== Failure classification ==========

    #[tokio::test]
    async fn test_empty_response_is_network_error() {
        let mock = Arc::new(MockTransport::new(MockMode::Empty));
        let mut client = client_with(&mock);
        assert!(matches!(
            client.translate("hello", "en", "fr").await,
            Err(TranslateError::NetworkError(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_error_is_network_error() {
        let mock = Arc::new(MockTransport::new(MockMode::Error("refused".to_string())));
        let mut client = client_with(&mock);
        assert_eq!(
            client.translate("hello", "en", "fr").await,
            Err(TranslateError::NetworkError("refused".to_string()))
        );
    }

    #[tokio::test]
    async fn test_timeout_forwarded() {
        let mock = Arc::new(MockTransport::new(MockMode::Timeout));
        let mut client = client_with(&mock);
        assert!(matches!(
            client.translate("hello", "en", "fr").await,
            Err(TranslateError::TimeoutError(_))
        ));
    }

    #[tokio::test]
    async fn test_fieldless_response_is_api_error() {
        let mock = Arc::new(MockTransport::fixed(r#"{"data":{"translations":[]}}"#));
        let mut client = client_with(&mock);
        assert!(matches!(
            client.translate("hello", "en", "fr").await,
            Err(TranslateError::ApiError(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_translation_is_api_error() {
        let mock = Arc::new(MockTransport::fixed(r#"{"translatedText":""}"#));
        let mut client = client_with(&mock);
        assert!(matches!(
            client.translate("hello", "en", "fr").await,
            Err(TranslateError::ApiError(_))
        ));
    }

    #[tokio::test]
    async fn test_api_error_carries_service_message() {
        let mock = Arc::new(MockTransport::fixed(
            r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#,
        ));
        let mut client = client_with(&mock);
        assert_eq!(
            client.translate("hello", "en", "fr").await,
            Err(TranslateError::ApiError("API key not valid.".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unrecoverable_encoding_is_encoding_error() {
        // A lone high surrogate decodes to bytes that are not UTF-8
        let mock = Arc::new(MockTransport::fixed(r#"{"translatedText":"\ud800"}"#));
        let mut client = client_with(&mock);
        assert!(matches!(
            client.translate("hello", "en", "fr").await,
            Err(TranslateError::EncodingError(_))
        ));
    }

    #[tokio::test]
    async fn test_partially_broken_encoding_repaired() {
        let mock = Arc::new(MockTransport::fixed(r#"{"translatedText":"ok \ud800"}"#));
        let mut client = client_with(&mock);
        let text = client.translate("hello", "en", "fr").await.unwrap();
        assert!(text.starts_with("ok "));
        assert!(text.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_unicode_escapes_decoded() {
        let mock = Arc::new(MockTransport::fixed(
            r#"{"data":{"translations":[{"translatedText":"Caf\u00e9"}]}}"#,
        ));
        let mut client = client_with(&mock);
        assert_eq!(client.translate("Coffee", "en", "fr").await.unwrap(), "Café");
    }

    #[tokio::test]
    async fn test_slow_transport_still_single_call() {
        let mock = Arc::new(MockTransport::with_delay(MockMode::Echo, 20));
        let mut client = client_with(&mock);
        let start = std::time::Instant::now();
        client.translate("hello", "en", "fr").await.unwrap();
        client.translate("hello", "en", "fr").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_debug_masks_key() {
        let mock = Arc::new(MockTransport::new(MockMode::Echo));
        let client = client_with(&mock);
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains("test-key"));
    }
}
