//! Error types for markscrape.
//!
//! Most failures in this crate are recovered locally and surface as typed
//! results (`success: false`, fallback metadata). This enum covers the
//! failures that travel through `Result` between internal layers.

/// Error type for extraction, selector and network operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A CSS selector could not be parsed by the selector engine.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        /// The selector text as supplied.
        selector: String,
        /// Parser message.
        reason: String,
    },

    /// The heuristic (Readability) extractor failed to parse the document.
    #[error("readability extraction failed: {0}")]
    Readability(String),

    /// No extractable content was found in the document.
    #[error("no extractable content found")]
    NoContent,

    /// The server answered with a non-success status code.
    #[error("HTTP error: {status}")]
    Http {
        /// Numeric HTTP status.
        status: u16,
    },

    /// The request did not complete before its deadline.
    #[error("request timed out after {after_ms} ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        after_ms: u64,
    },

    /// Transport-level request failure (DNS, TLS, connection reset, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// Every pipeline state was exhausted without producing content.
    #[error("pipeline failed: {0}")]
    Pipeline(String),

    /// Configuration JSON could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether a batch request hitting this error may be attempted again.
    ///
    /// Includes pages that loaded but yielded no content.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Timeout { .. } | Self::Request(_) | Self::NoContent
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for markscrape operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_retryable() {
        assert!(Error::Http { status: 503 }.is_retryable());
        assert!(Error::Timeout { after_ms: 10 }.is_retryable());
        assert!(Error::Request("reset".to_string()).is_retryable());
        assert!(Error::NoContent.is_retryable());
        assert!(!Error::Config("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidSelector {
            selector: "div[".to_string(),
            reason: "unexpected end".to_string(),
        };
        assert_eq!(err.to_string(), "invalid selector `div[`: unexpected end");
        assert_eq!(Error::Http { status: 404 }.to_string(), "HTTP error: 404");
    }

    #[test]
    fn test_config_error_from_serde() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, Error::Config(_)));
    }
}
