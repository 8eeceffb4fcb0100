//! Error handling types
//!
//! A single error taxonomy shared across the indexing pipeline. Every failure
//! falls into one of six kinds: validation, not-found, transient, permanent,
//! cancelled, or I/O. Transient errors are retried by the workers; permanent
//! errors are final. The classifier that decides which is which lives here so
//! that callers never pattern-match on message strings themselves.

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Retry classification of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retryable - timeouts, 5xx, 429, circuit open, rate limited, transient I/O
    Transient,
    /// Non-retryable - 4xx (non-429), validation, decoder failures
    Permanent,
}

/// Main error type for Semdex
#[derive(Error, Debug)]
pub enum Error {
    /// Invariant violated at model construction
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the violated invariant
        message: String,
    },

    /// Path, chunk, or embedding absent when required by the contract
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Retryable failure
    #[error("Transient error: {message}")]
    Transient {
        /// Description of the transient failure
        message: String,
        /// Optional HTTP status that produced this failure
        status: Option<u16>,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Non-retryable failure
    #[error("Permanent error: {message}")]
    Permanent {
        /// Description of the permanent failure
        message: String,
        /// Optional HTTP status that produced this failure
        status: Option<u16>,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Cancellation observed
    #[error("Operation cancelled")]
    Cancelled,

    /// File system or store I/O not otherwise classified
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

// Basic error creation methods
impl Error {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a transient error
    pub fn transient<S: Into<String>>(message: S) -> Self {
        Self::Transient {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Create a transient error with source
    pub fn transient_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Transient {
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a permanent error
    pub fn permanent<S: Into<String>>(message: S) -> Self {
        Self::Permanent {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Create a permanent error with source
    pub fn permanent_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Permanent {
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create an I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Provider-facing error constructors
impl Error {
    /// Create an error from an HTTP status code returned by a provider
    ///
    /// 5xx and 429 are transient; any other 4xx is permanent.
    pub fn http_status<S: Into<String>>(status: u16, message: S) -> Self {
        if status >= 500 || status == 429 {
            Self::Transient {
                message: message.into(),
                status: Some(status),
                source: None,
            }
        } else {
            Self::Permanent {
                message: message.into(),
                status: Some(status),
                source: None,
            }
        }
    }

    /// Transient rejection emitted when the circuit breaker is open
    pub fn circuit_open() -> Self {
        Self::transient("circuit breaker is open")
    }

    /// Transient rejection emitted when the rate limit is exceeded
    pub fn rate_limited() -> Self {
        Self::transient("rate limit exceeded")
    }
}

/// Message substrings that mark an otherwise-unclassified error as transient
const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "rate limit",
    "throttle",
    "service unavailable",
    "temporarily unavailable",
    "circuit breaker",
    "connection reset",
    "connection closed",
];

fn message_is_transient(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Classify an arbitrary error chain as transient or permanent
///
/// Walks the `source()` chain looking for transient markers; defaults to
/// permanent when nothing in the chain qualifies.
pub fn classify_error_chain(error: &(dyn std::error::Error + 'static)) -> FailureKind {
    if let Some(io) = error.downcast_ref::<std::io::Error>() {
        use std::io::ErrorKind;
        if matches!(
            io.kind(),
            ErrorKind::TimedOut
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::Interrupted
                | ErrorKind::WouldBlock
        ) {
            return FailureKind::Transient;
        }
    }
    if message_is_transient(&error.to_string()) {
        return FailureKind::Transient;
    }
    match error.source() {
        Some(inner) => classify_error_chain(inner),
        None => FailureKind::Permanent,
    }
}

impl Error {
    /// Decide whether this error should be retried
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transient { .. } | Self::Cancelled => FailureKind::Transient,
            Self::Validation { .. } | Self::NotFound { .. } | Self::Permanent { .. } => {
                FailureKind::Permanent
            }
            Self::Io { message, source } => {
                if message_is_transient(message) {
                    return FailureKind::Transient;
                }
                match source {
                    Some(inner) => classify_error_chain(inner.as_ref()),
                    None => FailureKind::Permanent,
                }
            }
        }
    }

    /// Convenience shorthand for `failure_kind() == Transient`
    pub fn is_transient(&self) -> bool {
        self.failure_kind() == FailureKind::Transient
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    // Decoder failures are final
    fn from(err: serde_json::Error) -> Self {
        Self::Permanent {
            message: format!("JSON error: {}", err),
            status: None,
            source: Some(Box::new(err)),
        }
    }
}
