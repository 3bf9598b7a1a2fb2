//! Reputation gateway for mobile threat analysis.
//!
//! Accepts IP-address and domain reputation queries, forwards them to
//! upstream reputation services, and caches verdicts to keep redundant
//! outbound calls off the dynamic-analysis hot path.
//!
//! # Features
//!
//! - **ipdata Integration** - Query the ipdata threat API for IP reputation
//! - **Domain Scoring** - Query a domain reputation-scoring service
//! - **Verdict Caching** - Cache verdict envelopes with a 7-day TTL,
//!   kind-partitioned so IP and domain keys never collide
//! - **Graceful Degradation** - A failing cache degrades to direct
//!   provider calls instead of failing the request
//!
//! # Example Configuration
//!
//! ```yaml
//! server:
//!   listen: "0.0.0.0:8080"
//!
//! cache:
//!   max_entries: 10000
//!
//! ipdata:
//!   enabled: true
//!   api_key: "${IPDATA_API_KEY}"
//!
//! domain_reputation:
//!   enabled: true
//!   api_key: "${DOMAIN_REPUTATION_API_KEY}"
//!   endpoint: "https://api.domainrep.example/v1/score"
//! ```

pub mod cache;
pub mod config;
pub mod providers;
pub mod resolver;
pub mod server;

pub use cache::{MemoryVerdictStore, Subject, SubjectKind, VerdictEnvelope, VERDICT_TTL};
pub use config::Config;
pub use resolver::{LookupQuery, ReputationResolver};
