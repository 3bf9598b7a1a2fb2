//! ipdata threat reputation provider for IP subjects.

use super::{status_to_error, ProviderError, RawVerdict, ReputationProvider};
use crate::cache::{Subject, SubjectKind};
use crate::config::IpdataConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// IP threat/geo reputation provider backed by the ipdata API.
///
/// Authenticates with a query-string API key and returns the threat
/// report verbatim.
pub struct IpdataProvider {
    config: IpdataConfig,
    client: Client,
}

impl IpdataProvider {
    /// Create a new ipdata provider.
    pub fn new(config: IpdataConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl ReputationProvider for IpdataProvider {
    async fn lookup(&self, subject: &Subject) -> Result<RawVerdict, ProviderError> {
        let url = format!(
            "{}/{}/threat?api-key={}",
            self.config.base_url.trim_end_matches('/'),
            subject.value(),
            self.config.api_key
        );

        debug!(ip = subject.value(), "Querying ipdata");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(status, body));
        }

        let verdict: RawVerdict = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        debug!(ip = subject.value(), "ipdata lookup complete");

        Ok(verdict)
    }

    fn name(&self) -> &str {
        "ipdata"
    }

    fn kind(&self) -> SubjectKind {
        SubjectKind::Ip
    }
}
