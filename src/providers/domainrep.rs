//! Domain reputation-scoring provider.

use super::{status_to_error, ProviderError, RawVerdict, ReputationProvider};
use crate::cache::{Subject, SubjectKind};
use crate::config::DomainReputationConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Domain reputation provider.
///
/// Posts `{"host": "<domain>"}` to the configured scoring endpoint with
/// the API key in an `X-Api-Key` header and returns the score payload
/// verbatim.
pub struct DomainReputationProvider {
    config: DomainReputationConfig,
    client: Client,
}

impl DomainReputationProvider {
    /// Create a new domain reputation provider.
    pub fn new(config: DomainReputationConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl ReputationProvider for DomainReputationProvider {
    async fn lookup(&self, subject: &Subject) -> Result<RawVerdict, ProviderError> {
        debug!(domain = subject.value(), "Querying domain reputation");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-Api-Key", &self.config.api_key)
            .json(&json!({ "host": subject.value() }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(status, body));
        }

        let verdict: RawVerdict = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        debug!(domain = subject.value(), "Domain reputation lookup complete");

        Ok(verdict)
    }

    fn name(&self) -> &str {
        "domain-reputation"
    }

    fn kind(&self) -> SubjectKind {
        SubjectKind::Domain
    }
}
