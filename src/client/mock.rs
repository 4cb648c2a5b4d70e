//! Mock transport for testing
//!
//! A deterministic, network-free [`Transport`] that answers with canned
//! Google-shaped bodies or simulates failures. It counts calls and remembers
//! the last request so tests can assert on cache behaviour and payloads.
//!
//! # Example
//!
//! ```ignore
//! use cet_translate::client::{MockMode, MockTransport, Transport};
//!
//! #[tokio::test]
//! async fn test_echo() {
//!     let mock = MockTransport::new(MockMode::Echo);
//!     let body = mock
//!         .post("h", "/p", r#"{"q":"hello","source":"en","target":"fr","format":"text"}"#)
//!         .await
//!         .unwrap();
//!     assert!(String::from_utf8(body).unwrap().contains("hello_fr"));
//! }
//! ```

use crate::client::error::{TransportError, TransportResult};
use crate::client::transport::Transport;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock response modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Answer `{"translatedText": "<q>_<target>"}` in the v2 envelope
    Echo,

    /// Answer with this exact body for every request
    Fixed(Vec<u8>),

    /// Answer with an empty body
    Empty,

    /// Fail with a transport timeout
    Timeout,

    /// Fail with a network error carrying this message
    Error(String),
}

/// A request as the mock saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub host: String,
    pub path: String,
    pub body: String,
}

/// Mock transport that simulates service responses
#[derive(Debug)]
pub struct MockTransport {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    calls: AtomicUsize,
    last_request: Mutex<Option<RecordedRequest>>,
}

impl MockTransport {
    /// Create a new MockTransport with the given mode
    pub fn new(mode: MockMode) -> Self {
        Self::with_delay(mode, 0)
    }

    /// Create a MockTransport with simulated network delay
    ///
    /// ```ignore
    /// let mock = MockTransport::with_delay(MockMode::Echo, 50);
    /// // Each request will take ~50ms
    /// ```
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            mode,
            delay_ms,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Shorthand for a fixed body given as text
    pub fn fixed(body: &str) -> Self {
        Self::new(MockMode::Fixed(body.as_bytes().to_vec()))
    }

    /// Number of `post` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    /// Google-shaped body echoing the request text with a target suffix
    fn echo_body(request_body: &str) -> TransportResult<Vec<u8>> {
        let request: Value = serde_json::from_str(request_body)
            .map_err(|e| TransportError::Network(format!("Mock got invalid JSON: {}", e)))?;
        let text = request["q"].as_str().unwrap_or_default();
        let target = request["target"].as_str().unwrap_or_default();

        let response = json!({
            "data": {
                "translations": [
                    { "translatedText": format!("{}_{}", text, target) }
                ]
            }
        });
        Ok(response.to_string().into_bytes())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, host: &str, path: &str, body: &str) -> TransportResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(RecordedRequest {
                host: host.to_string(),
                path: path.to_string(),
                body: body.to_string(),
            });
        }

        self.apply_delay().await;

        match &self.mode {
            MockMode::Echo => Self::echo_body(body),
            MockMode::Fixed(bytes) => Ok(bytes.clone()),
            MockMode::Empty => Ok(Vec::new()),
            MockMode::Timeout => Err(TransportError::Timeout(
                "mock transport timed out".to_string(),
            )),
            MockMode::Error(msg) => Err(TransportError::Network(msg.clone())),
        }
    }

    fn transport_name(&self) -> &str {
        "Mock"
    }
}
