//! Command-line and environment configuration.

use std::time::Duration;

use clap::Parser;
use github::GitHubConfig;
use listener::WebhookConfig;
use registry::{CredentialsError, RegistryConfig, RegistryCredentials};
use reqwest::Url;
use thiserror::Error;

use crate::telemetry::LogFormat;

/// Start-up configuration that parsed but does not make sense.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--quay-auth` is not `username:password`.
    #[error("invalid --quay-auth: {0}")]
    QuayAuth(#[from] CredentialsError),

    /// An upstream HTTP client could not be initialised.
    #[error("failed to build {upstream} HTTP client: {source}")]
    HttpClient {
        /// Which upstream the client was for.
        upstream: &'static str,
        /// The client builder's error.
        #[source]
        source: reqwest::Error,
    },
}

/// Reports Quay builds to GitHub and retags built images.
///
/// Each upstream runs offline, against in-memory stand-ins, until its
/// credentials are supplied.
#[derive(Debug, Clone, Parser)]
#[command(name = "quayd", version, about)]
pub struct Config {
    /// Port the webhook server listens on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// GitHub token used for commit lookups and status creation.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub REST API root.
    #[arg(long, env = "GITHUB_API_URL", default_value = github::DEFAULT_API_URL)]
    pub github_api_url: Url,

    /// Registry credentials as `username:password`.
    #[arg(long, env = "QUAY_AUTH", hide_env_values = true)]
    pub quay_auth: Option<String>,

    /// Registry root.
    #[arg(long, env = "REGISTRY_URL", default_value = registry::DEFAULT_REGISTRY_URL)]
    pub registry_url: Url,

    /// Context attached to every created status.
    #[arg(long, env = "STATUS_CONTEXT", default_value = domain::DEFAULT_CONTEXT)]
    pub status_context: String,

    /// Trigger kind whose builds are reported. Repeatable.
    #[arg(
        long = "trigger-kind",
        env = "TRIGGER_KINDS",
        value_delimiter = ',',
        default_values = listener::DEFAULT_TRIGGER_KINDS
    )]
    pub trigger_kinds: Vec<String>,

    /// Per-request timeout for upstream calls, in seconds.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// OTLP/gRPC endpoint spans are exported to.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    fn timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }

    /// GitHub connection settings, or `None` when no token is configured.
    pub fn github(&self) -> Option<GitHubConfig> {
        let token = self.github_token.as_deref().filter(|t| !t.is_empty())?;
        Some(GitHubConfig {
            api_url: self.github_api_url.clone(),
            token: token.to_string(),
            timeout: self.timeout(),
        })
    }

    /// Registry connection settings, or `None` when no credentials are
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::QuayAuth`] when the credentials are malformed.
    pub fn registry(&self) -> Result<Option<RegistryConfig>, ConfigError> {
        let Some(auth) = self.quay_auth.as_deref().filter(|a| !a.is_empty()) else {
            return Ok(None);
        };
        let credentials: RegistryCredentials = auth.parse()?;
        Ok(Some(RegistryConfig {
            base_url: self.registry_url.clone(),
            credentials: Some(credentials),
            timeout: self.timeout(),
        }))
    }

    /// Which events the receiver acts on.
    pub fn webhook(&self) -> WebhookConfig {
        WebhookConfig::new(
            self.trigger_kinds
                .iter()
                .map(|kind| kind.trim())
                .filter(|kind| !kind.is_empty()),
        )
    }
}
