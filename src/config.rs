//! Configuration types for the reputation gateway.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Global settings.
    #[serde(default)]
    pub settings: Settings,

    /// Inbound HTTP server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Verdict cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// IP threat reputation provider (ipdata).
    #[serde(default)]
    pub ipdata: Option<IpdataConfig>,

    /// Domain reputation-scoring provider.
    #[serde(default)]
    pub domain_reputation: Option<DomainReputationConfig>,
}

/// Global settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Master enable/disable switch.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Inbound HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

/// Verdict cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum number of cached envelopes.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

fn default_max_entries() -> usize {
    10_000
}

/// ipdata provider configuration (IP subjects).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IpdataConfig {
    /// Enable ipdata lookups.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// API key (supports ${ENV_VAR} syntax).
    pub api_key: String,

    /// API base URL.
    #[serde(default = "default_ipdata_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_ipdata_base_url() -> String {
    "https://api.ipdata.co".to_string()
}

/// Domain reputation provider configuration (domain subjects).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainReputationConfig {
    /// Enable domain reputation lookups.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// API key (supports ${ENV_VAR} syntax), sent as X-Api-Key.
    pub api_key: String,

    /// Scoring endpoint URL.
    pub endpoint: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_timeout() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .listen
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("Invalid listen address '{}': {}", self.server.listen, e))?;

        if self.cache.max_entries == 0 {
            anyhow::bail!("cache.max_entries must be greater than zero");
        }

        if let Some(ref ipdata) = self.ipdata {
            if ipdata.enabled && ipdata.api_key.is_empty() {
                anyhow::bail!("ipdata is enabled but api_key is empty");
            }
        }

        if let Some(ref domain) = self.domain_reputation {
            if domain.enabled && domain.api_key.is_empty() {
                anyhow::bail!("domain_reputation is enabled but api_key is empty");
            }
            if domain.enabled && domain.endpoint.is_empty() {
                anyhow::bail!("domain_reputation is enabled but endpoint is empty");
            }
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example() -> String {
        r#"# Reputation Gateway Configuration

settings:
  enabled: true

server:
  listen: "0.0.0.0:8080"

# Verdict cache (entries expire after 7 days)
cache:
  max_entries: 10000

# IP threat reputation provider
ipdata:
  enabled: true
  api_key: "${IPDATA_API_KEY}"     # Use environment variable
  base_url: "https://api.ipdata.co"
  timeout_ms: 5000                 # API timeout

# Domain reputation-scoring provider
domain_reputation:
  enabled: true
  api_key: "${DOMAIN_REPUTATION_API_KEY}"
  endpoint: "https://api.domainrep.example/v1/score"
  timeout_ms: 5000
"#
        .to_string()
    }
}

/// Expand environment variables in the format ${VAR_NAME}.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let var_value = std::env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
