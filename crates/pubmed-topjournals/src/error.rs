//! Error types for the search pipeline.
//!
//! Uses `thiserror` for structured error handling, one enum per layer:
//! reference data ([`DataLoadError`]), the remote API ([`RemoteError`]),
//! and the orchestrator ([`PipelineError`]).

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Errors loading the journal metrics reference table. Fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum DataLoadError {
    /// None of the candidate locations exists.
    #[error("journal metrics file not found (looked in: {})", .candidates.join(", "))]
    NotFound {
        /// Paths that were tried, in order.
        candidates: Vec<String>,
    },

    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a JSON array of journal entries.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Two entries share a canonical name after normalization.
    #[error("duplicate journal name '{name}' (entries {first} and {second})")]
    DuplicateName { name: String, first: usize, second: usize },

    /// An entry has an invalid field value.
    #[error("invalid journal entry at index {index}: {message}")]
    InvalidEntry { index: usize, message: String },

    /// Two entries claim the same alias (strict alias policy only).
    #[error("alias '{alias}' is claimed by both '{kept}' and '{rejected}'")]
    AliasCollision { alias: String, kept: String, rejected: String },
}

/// Retry classification for remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteErrorKind {
    /// Worth retrying: timeouts, 5xx, rate limiting, garbled bodies.
    Transient,
    /// Retrying will not help: bad query, rejected credentials.
    PermanentFailure,
}

/// Errors from the E-utilities client layer.
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    /// HTTP transport error (connection, DNS, TLS, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by NCBI (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry, from `Retry-After`
        retry_after: Option<Duration>,
    },

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Credentials or identification rejected (401/403 response)
    #[error("Access rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Invalid request parameters (400/404 response)
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// The search term was rejected by PubMed
    #[error("PubMed rejected the query: {message}")]
    MalformedQuery { message: String },

    /// Body parsed but lacks the expected envelope
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RemoteError {
    /// Create a rate limited error with an optional retry-after in seconds.
    #[must_use]
    pub fn rate_limited(seconds: Option<u64>) -> Self {
        Self::RateLimited { retry_after: seconds.map(Duration::from_secs) }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a malformed query error.
    #[must_use]
    pub fn malformed_query(message: impl Into<String>) -> Self {
        Self::MalformedQuery { message: message.into() }
    }

    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse { message: message.into() }
    }

    /// Classify this error for the retry policy.
    #[must_use]
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::Http(e) if e.is_builder() => RemoteErrorKind::PermanentFailure,
            Self::Http(_)
            | Self::RateLimited { .. }
            | Self::Server { .. }
            | Self::InvalidResponse { .. }
            | Self::Parse(_) => RemoteErrorKind::Transient,
            Self::Unauthorized { .. }
            | Self::BadRequest { .. }
            | Self::UnexpectedStatus { .. }
            | Self::MalformedQuery { .. } => RemoteErrorKind::PermanentFailure,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == RemoteErrorKind::Transient
    }

    /// Get the retry-after duration if this is a rate limit error.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Some detail batches were dropped after exhausting retries.
///
/// Not an error: the search still returns the records it could fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialResultWarning {
    /// Number of detail batches that were given up on.
    pub dropped_batches: usize,
    /// Number of identifiers in those batches.
    pub missing_records: usize,
}

impl PartialResultWarning {
    /// Record one dropped batch of `size` identifiers.
    pub fn record_dropped_batch(&mut self, size: usize) {
        self.dropped_batches += 1;
        self.missing_records += size;
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.dropped_batches == 0
    }
}

impl fmt::Display for PartialResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Some results may be missing: {} of the requested articles could not be fetched \
             ({} batch{} failed)",
            self.missing_records,
            self.dropped_batches,
            if self.dropped_batches == 1 { "" } else { "es" }
        )
    }
}

/// Errors surfaced by the pipeline to its caller.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Criteria failed validation before any network call
    #[error("Invalid search criteria: {field}: {message}")]
    InvalidCriteria {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Transport or server failure that outlasted the retry policy
    #[error("Network error: {0}")]
    Network(#[source] RemoteError),

    /// NCBI kept rate limiting us
    #[error("Rate limited: {0}")]
    RateLimited(#[source] RemoteError),

    /// PubMed could not interpret the composed query
    #[error("Malformed query: {message}")]
    MalformedQuery { message: String },

    /// PubMed refused the request (credentials, identification)
    #[error("Request rejected: {0}")]
    Rejected(#[source] RemoteError),

    /// Top-journal filtering requested without a metrics table
    #[error("Journal metrics are unavailable")]
    MetricsUnavailable,

    /// The metrics table failed to load at startup
    #[error("Journal metrics failed to load: {0}")]
    DataLoad(#[from] DataLoadError),
}

impl PipelineError {
    /// Create an invalid criteria error.
    #[must_use]
    pub fn invalid_criteria(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCriteria { field: field.into(), message: message.into() }
    }

    /// Map a client failure onto the caller-facing taxonomy.
    #[must_use]
    pub fn from_remote(err: RemoteError) -> Self {
        match err {
            RemoteError::MalformedQuery { message } | RemoteError::BadRequest { message } => {
                Self::MalformedQuery { message }
            }
            RemoteError::RateLimited { .. } => Self::RateLimited(err),
            RemoteError::Unauthorized { .. } | RemoteError::UnexpectedStatus { .. } => {
                Self::Rejected(err)
            }
            RemoteError::Http(_)
            | RemoteError::Server { .. }
            | RemoteError::InvalidResponse { .. }
            | RemoteError::Parse(_) => Self::Network(err),
        }
    }

    /// Convert to a user-friendly error message for the presentation layer.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::InvalidCriteria { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            Self::Network(_) => "Could not connect to PubMed. Please check your internet \
                                 connection and try again."
                .to_string(),
            Self::RateLimited(err) => match err.retry_after() {
                Some(wait) => format!(
                    "PubMed is rate limiting requests. Please wait {wait:?} and try again."
                ),
                None => "PubMed is rate limiting requests. Please wait a moment and try again."
                    .to_string(),
            },
            Self::MalformedQuery { message } => {
                format!("PubMed could not process the search: {message}. Please rephrase the query.")
            }
            Self::Rejected(_) => "PubMed refused the request. Check the configured API key and \
                                  contact email, then try again."
                .to_string(),
            Self::MetricsUnavailable => "Journal metrics are not loaded, so results cannot be \
                                         limited to top journals. Switch to all journals."
                .to_string(),
            Self::DataLoad(err) => format!("Journal metrics could not be loaded: {err}"),
        }
    }
}

impl From<RemoteError> for PipelineError {
    fn from(err: RemoteError) -> Self {
        Self::from_remote(err)
    }
}

/// Result type alias for client operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
