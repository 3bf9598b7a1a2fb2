//! Cache-then-provider reputation resolution.

use crate::cache::{Subject, SubjectKind, VerdictEnvelope, VerdictStore, VERDICT_TTL};
use crate::providers::{ProviderError, RawVerdict, ReputationProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// A reputation lookup request as supplied by the inbound caller.
#[derive(Debug, Clone, Default)]
pub struct LookupQuery {
    pub ip: Option<String>,
    pub domain: Option<String>,
    /// Origin port observed with the request.
    pub port: Option<u16>,
    /// Identifier of the application that triggered the lookup.
    pub package_name: String,
}

impl LookupQuery {
    /// The subject this query asks about. IP takes precedence when both
    /// are supplied; empty strings count as not supplied.
    pub fn subject(&self) -> Option<Subject> {
        if let Some(ip) = self.ip.as_deref().filter(|v| !v.is_empty()) {
            return Some(Subject::Ip(ip.to_string()));
        }
        if let Some(domain) = self.domain.as_deref().filter(|v| !v.is_empty()) {
            return Some(Subject::Domain(domain.to_string()));
        }
        None
    }
}

/// Error from a resolution attempt.
#[derive(Debug)]
pub enum ResolveError {
    /// Neither an IP nor a domain was supplied. Rejected before any
    /// cache or network access.
    NoSubjectProvided,
    /// The matching provider failed; propagated unchanged.
    Provider(ProviderError),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::NoSubjectProvided => {
                write!(f, "No IP address or domain provided")
            }
            ResolveError::Provider(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<ProviderError> for ResolveError {
    fn from(e: ProviderError) -> Self {
        ResolveError::Provider(e)
    }
}

/// Orchestrates cache-then-provider lookups.
///
/// On a hit the cached raw verdict is returned with no further side
/// effects. On a miss the provider matching the subject kind is called
/// exactly once and a successful verdict is written back with the
/// 7-day production TTL. Cache failures degrade to a direct provider
/// call; provider failures never write to the cache.
///
/// Concurrent misses for the same subject may each reach the provider;
/// the last writeback wins, which the store's full-replace `put` makes
/// safe.
pub struct ReputationResolver {
    store: Arc<dyn VerdictStore>,
    ip_provider: Arc<dyn ReputationProvider>,
    domain_provider: Arc<dyn ReputationProvider>,
}

impl ReputationResolver {
    /// Create a new resolver over a store and one provider per kind.
    pub fn new(
        store: Arc<dyn VerdictStore>,
        ip_provider: Arc<dyn ReputationProvider>,
        domain_provider: Arc<dyn ReputationProvider>,
    ) -> Self {
        Self {
            store,
            ip_provider,
            domain_provider,
        }
    }

    fn provider_for(&self, kind: SubjectKind) -> &Arc<dyn ReputationProvider> {
        match kind {
            SubjectKind::Ip => &self.ip_provider,
            SubjectKind::Domain => &self.domain_provider,
        }
    }

    /// Resolve a query to a raw verdict.
    pub async fn resolve(&self, query: &LookupQuery) -> Result<RawVerdict, ResolveError> {
        let subject = query.subject().ok_or(ResolveError::NoSubjectProvided)?;

        match self.store.get(&subject).await {
            Ok(Some(envelope)) => {
                debug!(subject = %subject, "Verdict cache hit");
                return Ok(envelope.report);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(subject = %subject, error = %e, "Cache read failed, degrading to provider");
            }
        }

        let provider = self.provider_for(subject.kind());
        debug!(subject = %subject, provider = provider.name(), "Verdict cache miss");

        let report = provider.lookup(&subject).await?;

        let envelope = VerdictEnvelope {
            subject: subject.clone(),
            port: query.port,
            package_name: query.package_name.clone(),
            report: report.clone(),
            stored_at: Instant::now(),
            ttl: VERDICT_TTL,
        };

        if let Err(e) = self.store.put(envelope, VERDICT_TTL).await {
            warn!(subject = %subject, error = %e, "Cache write failed, verdict served uncached");
        }

        Ok(report)
    }
}
