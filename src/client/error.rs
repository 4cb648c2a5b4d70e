/// Why a translation request failed
///
/// Every `translate` call ends in exactly one of these or in a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// Client not initialized, or empty/invalid text or language code
    InvalidParams(String),
    /// Transport failure, or the service answered with an empty body
    NetworkError(String),
    /// A body arrived but held no usable `translatedText`
    ApiError(String),
    /// The translated text could not be turned into UTF-8
    EncodingError(String),
    /// The transport gave up waiting for the service
    TimeoutError(String),
}

impl TranslateError {
    /// Short label used in command replies ("network error", "timeout", ...)
    pub fn label(&self) -> &'static str {
        match self {
            TranslateError::InvalidParams(_) => "invalid parameters",
            TranslateError::NetworkError(_) => "network error",
            TranslateError::ApiError(_) => "API error",
            TranslateError::EncodingError(_) => "encoding error",
            TranslateError::TimeoutError(_) => "timeout",
        }
    }
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateError::InvalidParams(msg) => write!(f, "Invalid parameters: {}", msg),
            TranslateError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            TranslateError::ApiError(msg) => write!(f, "API error: {}", msg),
            TranslateError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            TranslateError::TimeoutError(msg) => write!(f, "Timeout: {}", msg),
        }
    }
}

impl std::error::Error for TranslateError {}

/// Transport-level failures reported by a [`Transport`](super::Transport)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response within the configured timeout
    Timeout(String),
    /// Connection, TLS or I/O failure
    Network(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Timeout(msg) => write!(f, "Request timed out: {}", msg),
            TransportError::Network(msg) => write!(f, "Request failed: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for TranslateError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(msg) => TranslateError::TimeoutError(msg),
            TransportError::Network(msg) => TranslateError::NetworkError(msg),
        }
    }
}

/// The request URL carries the API key, so it is stripped from the message
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Result of a single `translate` call
pub type TranslationResult = Result<String, TranslateError>;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
