//! quayd entry point.
//!
//! This binary is the composition root for the whole system:
//!
//! 1. **Parse configuration** from flags and environment ([`config::Config`]).
//! 2. **Wire observability**: `tracing-subscriber` with an env filter and a
//!    JSON or pretty formatter, plus an OpenTelemetry OTLP exporter when an
//!    endpoint is configured.
//! 3. **Bind capabilities**: start from the in-memory stand-ins and bind the
//!    GitHub and registry adapters for every upstream with credentials.
//! 4. **Serve** the webhook router until interrupted.

mod config;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use github::{GitHubClient, GitHubCommitResolver, GitHubStatusesRepository};
use listener::{router, AppState};
use orchestrator::{Capabilities, Orchestrator};
use registry::{RegistryClient, RegistryTagResolver, RegistryTagger};
use tokio::net::TcpListener;

use crate::config::{Config, ConfigError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    let result = serve(config).await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "quayd stopped");
    }
    telemetry.shutdown();
    result
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(&config)?;
    let state = AppState::new(Arc::new(orchestrator), config.webhook());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Listening for build events");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server failed")
}

/// Binds a real adapter for every upstream that has credentials; the rest
/// fall back to [`Capabilities::offline`].
fn build_orchestrator(config: &Config) -> Result<Orchestrator, ConfigError> {
    let mut builder =
        Orchestrator::builder(Capabilities::offline()).context(config.status_context.clone());

    match config.github() {
        Some(github) => {
            tracing::info!(api_url = %github.api_url, "Reporting statuses to GitHub");
            let client = GitHubClient::new(github).map_err(|source| ConfigError::HttpClient {
                upstream: "GitHub",
                source,
            })?;
            builder = builder
                .commit_resolver(Arc::new(GitHubCommitResolver::new(client.clone())))
                .statuses(Arc::new(GitHubStatusesRepository::new(client)));
        }
        None => tracing::warn!("No GitHub token configured; statuses are only logged"),
    }

    match config.registry()? {
        Some(registry) => {
            tracing::info!(registry_url = %registry.base_url, "Retagging images in the registry");
            let client =
                RegistryClient::new(registry).map_err(|source| ConfigError::HttpClient {
                    upstream: "registry",
                    source,
                })?;
            builder = builder
                .tag_resolver(Arc::new(RegistryTagResolver::new(client.clone())))
                .tagger(Arc::new(RegistryTagger::new(client)));
        }
        None => tracing::warn!("No registry credentials configured; tags are only logged"),
    }

    Ok(builder.build())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_context_flag_reaches_the_orchestrator() {
        let config =
            Config::try_parse_from(["quayd", "--status-context", "ci/image"]).expect("valid");
        let orchestrator = build_orchestrator(&config).expect("builds");
        assert_eq!(orchestrator.context(), "ci/image");
    }

    #[test]
    fn credentials_bind_real_clients() {
        let config = Config::try_parse_from([
            "quayd",
            "--github-token",
            "t0ken",
            "--quay-auth",
            "robot:hunter2",
            "--upstream-timeout-secs",
            "3",
        ])
        .expect("valid");
        assert!(build_orchestrator(&config).is_ok());
    }

    #[test]
    fn malformed_registry_credentials_stop_start_up() {
        let config = Config::try_parse_from(["quayd", "--quay-auth", "robot"]).expect("valid");
        assert!(build_orchestrator(&config).is_err());
    }
}
