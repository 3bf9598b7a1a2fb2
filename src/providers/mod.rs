//! Upstream reputation providers.

pub mod domainrep;
pub mod ipdata;

use crate::cache::{Subject, SubjectKind};
use async_trait::async_trait;

/// Raw verdict payload from an upstream reputation service.
///
/// Opaque to this crate: fields vary per provider and are passed
/// through to callers and into the cache verbatim.
pub type RawVerdict = serde_json::Value;

/// Error from a reputation provider.
#[derive(Debug)]
pub enum ProviderError {
    /// Request timed out.
    Timeout,
    /// Upstream service could not be reached.
    Unreachable(String),
    /// Upstream returned a response we could not use.
    InvalidResponse(String),
    /// API key rejected by the upstream.
    Unauthorized,
}

impl ProviderError {
    /// Whether a caller-level retry with backoff could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Timeout | ProviderError::Unreachable(_))
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Timeout => write!(f, "Request timed out"),
            ProviderError::Unreachable(msg) => write!(f, "Provider unreachable: {}", msg),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::Unauthorized => write!(f, "Unauthorized: API key rejected"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_connect() {
            ProviderError::Unreachable(e.to_string())
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::Unreachable(e.to_string())
        }
    }
}

/// Trait for upstream reputation lookups, one implementation per
/// subject kind.
///
/// Implementations are stateless request/response translators: exactly
/// one outbound call per `lookup`, no retries, no caching. Malformed
/// subjects are forwarded as-is and any upstream rejection surfaces as
/// a [`ProviderError`].
#[async_trait]
pub trait ReputationProvider: Send + Sync {
    /// Fetch the raw verdict for a subject.
    async fn lookup(&self, subject: &Subject) -> Result<RawVerdict, ProviderError>;

    /// Provider name for logging.
    fn name(&self) -> &str;

    /// The subject kind this provider handles.
    fn kind(&self) -> SubjectKind;
}

/// Map an HTTP error status to a provider error.
pub(crate) fn status_to_error(status: reqwest::StatusCode, body: String) -> ProviderError {
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            ProviderError::Unauthorized
        }
        _ => ProviderError::InvalidResponse(format!("HTTP {}: {}", status, body)),
    }
}
