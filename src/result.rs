//! Structured result envelope returned by every lookup operation.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Coarse failure classification carried by an error result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Connection, DNS or timeout failure.
    #[serde(rename = "network_error")]
    NetworkError,
    /// Provider answered with a non-2xx status.
    #[serde(rename = "http_error")]
    HttpStatusError,
    /// Body was not JSON or was structurally unusable.
    #[serde(rename = "data_error")]
    MalformedBodyError,
    /// Every provider of a fallback chain failed.
    #[serde(rename = "all_providers_failed")]
    AllProvidersFailed,
    /// The retry wrapper ran out of attempts.
    #[serde(rename = "max_retries_exceeded")]
    RetriesExhausted,
    /// The caller passed something that is not an IP address.
    #[serde(rename = "invalid_address")]
    InvalidAddress,
}

impl ErrorKind {
    /// Tag used as `error_type` in serialized results.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "network_error",
            ErrorKind::HttpStatusError => "http_error",
            ErrorKind::MalformedBodyError => "data_error",
            ErrorKind::AllProvidersFailed => "all_providers_failed",
            ErrorKind::RetriesExhausted => "max_retries_exceeded",
            ErrorKind::InvalidAddress => "invalid_address",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a resolution call.
///
/// Only constructible through [`LookupResult::success`] and
/// [`LookupResult::error`], so a success always carries data and a provider
/// name and an error never carries data.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult<T> {
    status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    provider_used: Option<String>,

    #[serde(rename = "error_type", skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    timestamp: DateTime<Utc>,
}

impl<T> LookupResult<T> {
    /// Create a success result served by `provider`.
    ///
    /// Provider names come from validated configuration, which rejects empty
    /// names before an agent is built.
    pub fn success(data: T, provider: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            data: Some(data),
            provider_used: Some(provider.into()),
            error_kind: None,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Create an error result.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: None,
            provider_used: None,
            error_kind: Some(kind),
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    /// Outcome of the lookup.
    pub fn status(&self) -> Status {
        self.status
    }

    /// True if a provider answered.
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// True if no provider answered.
    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    /// Normalized payload, present only on success.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Consume the result, keeping only the data.
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Name of the provider that served a success.
    pub fn provider_used(&self) -> Option<&str> {
        self.provider_used.as_deref()
    }

    /// Failure classification, present only on error.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// Human-readable failure description.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// When the result was created.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Re-wrap an error result with a different data type.
    ///
    /// Returns `None` for success results.
    pub fn cast_error<U>(&self) -> Option<LookupResult<U>> {
        match (self.error_kind, &self.message) {
            (Some(kind), Some(message)) => Some(LookupResult {
                status: Status::Error,
                data: None,
                provider_used: None,
                error_kind: Some(kind),
                message: Some(message.clone()),
                timestamp: self.timestamp,
            }),
            _ => None,
        }
    }
}
