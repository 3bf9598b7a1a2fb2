//! TTL-bounded verdict cache keyed by subject.

use crate::providers::RawVerdict;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Production TTL for cached verdicts: 7 days.
pub const VERDICT_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Kind of subject a verdict answers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    Ip,
    Domain,
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectKind::Ip => write!(f, "ip"),
            SubjectKind::Domain => write!(f, "domain"),
        }
    }
}

/// The identity a reputation verdict is requested for.
///
/// The key namespace is partitioned by kind: an IP subject and a domain
/// subject never collide even when their text is identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// IP address in dotted-quad form (not validated for routability).
    Ip(String),
    /// Domain name.
    Domain(String),
}

impl Subject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Ip(_) => SubjectKind::Ip,
            Subject::Domain(_) => SubjectKind::Domain,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Subject::Ip(v) | Subject::Domain(v) => v,
        }
    }

    /// Kind-prefixed store key, e.g. `ip:1.2.3.4` or `domain:example.com`.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.kind(), self.value())
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cache_key())
    }
}

/// Cached verdict plus the request context it was fetched under.
#[derive(Debug, Clone)]
pub struct VerdictEnvelope {
    /// The subject this envelope answers for.
    pub subject: Subject,
    /// Origin port observed with the request, when one was supplied.
    pub port: Option<u16>,
    /// Identifier of the application that triggered the lookup.
    /// Audit only: two apps querying the same subject share one entry.
    pub package_name: String,
    /// Unmodified provider response.
    pub report: RawVerdict,
    /// When this envelope was stored.
    pub stored_at: Instant,
    /// Validity window starting at `stored_at`.
    pub ttl: Duration,
}

impl VerdictEnvelope {
    /// Check if this envelope's validity window has elapsed.
    pub fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }

    /// Persisted form of this envelope.
    pub fn to_record(&self) -> EnvelopeRecord {
        EnvelopeRecord {
            port: self.port,
            package_name: self.package_name.clone(),
            report: self.report.clone(),
        }
    }
}

/// Wire/store layout of an envelope: `{port, package_name, report}`.
///
/// `report` is the nested raw provider payload and round-trips
/// byte-for-byte as JSON. The in-memory store keeps envelopes as
/// structs and never serializes; this type pins the layout for store
/// implementations that persist JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeRecord {
    pub port: Option<u16>,
    pub package_name: String,
    pub report: RawVerdict,
}

/// Error from the verdict store.
#[derive(Debug)]
pub enum CacheError {
    /// The store is unreachable. Callers treat this as a miss: the
    /// cache is a performance optimization, not a correctness
    /// dependency.
    Unavailable(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Unavailable(msg) => write!(f, "Cache unavailable: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

/// Time-bounded key-value store for verdict envelopes.
///
/// Keys are the kind-prefixed subject strings from
/// [`Subject::cache_key`]. `get` must report an expired entry as
/// absent; `put` is a full replace that restarts the ttl countdown and
/// must never expose a torn read to a concurrent `get`.
#[async_trait]
pub trait VerdictStore: Send + Sync {
    async fn get(&self, subject: &Subject) -> Result<Option<VerdictEnvelope>, CacheError>;

    async fn put(&self, envelope: VerdictEnvelope, ttl: Duration) -> Result<(), CacheError>;
}

/// In-process verdict store.
///
/// Expiry is enforced on read: an expired entry behaves as absent
/// without requiring a sweep from callers. Capacity overflow evicts
/// expired entries first, then the oldest live entry.
pub struct MemoryVerdictStore {
    entries: RwLock<HashMap<String, VerdictEnvelope>>,
    max_entries: usize,
}

impl MemoryVerdictStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Remove expired entries.
    pub fn cleanup(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, v| !v.is_expired());
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

#[async_trait]
impl VerdictStore for MemoryVerdictStore {
    async fn get(&self, subject: &Subject) -> Result<Option<VerdictEnvelope>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        match entries.get(&subject.cache_key()) {
            // Expired entries stay until cleanup; a read lock is enough
            Some(entry) if !entry.is_expired() => Ok(Some(entry.clone())),
            _ => Ok(None),
        }
    }

    async fn put(&self, mut envelope: VerdictEnvelope, ttl: Duration) -> Result<(), CacheError> {
        envelope.stored_at = Instant::now();
        envelope.ttl = ttl;
        let key = envelope.subject.cache_key();

        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            entries.retain(|_, v| !v.is_expired());

            if entries.len() >= self.max_entries {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, v)| v.stored_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(key, envelope);
        Ok(())
    }
}
