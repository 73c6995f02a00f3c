//! HTTP surface: routes, shared state, and the build-event handler.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use domain::{BuildState, DeliveryId, RepositoryId};
use orchestrator::Orchestrator;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::error::{ValidationError, WebhookError};
use crate::event::WebhookEvent;

/// Trigger kinds accepted when none are configured.
pub const DEFAULT_TRIGGER_KINDS: [&str; 2] = ["github", "automated"];

/// Which events drive status and tag updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    accepted_trigger_kinds: BTreeSet<String>,
}

impl WebhookConfig {
    /// Accepts events whose trigger kind is one of `kinds`.
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted_trigger_kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` when `event` came from an accepted automated trigger.
    ///
    /// Manually started builds never qualify.
    pub fn qualifies(&self, event: &WebhookEvent) -> bool {
        !event.is_manual && self.accepted_trigger_kinds.contains(&event.trigger_kind)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_KINDS)
    }
}

/// Shared state for all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    config: Arc<WebhookConfig>,
}

impl AppState {
    /// Creates handler state around `orchestrator`.
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>, config: WebhookConfig) -> Self {
        Self {
            orchestrator,
            config: Arc::new(config),
        }
    }
}

/// Builds the webhook router.
///
/// | Route | Purpose |
/// |-------|---------|
/// | `POST /build-events/:status` | build-lifecycle webhook |
/// | `GET /healthz` | liveness probe |
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/build-events/:status", post(receive_build_event))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Validates, filters, and dispatches one build event.
///
/// - unknown status token or malformed event: 400;
/// - manual or unrecognised trigger: 204, nothing invoked;
/// - `success`: retag the image, then report the status;
/// - any other state: report the status;
/// - any upstream failure: 500 with the failure text.
async fn receive_build_event(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let span = tracing::info_span!(
        "webhook",
        delivery_id = %DeliveryId::new_random(),
        status = %token,
        repository = tracing::field::Empty,
    );
    dispatch(&state, &token, &body).instrument(span).await
}

async fn dispatch(state: &AppState, token: &str, body: &[u8]) -> Result<StatusCode, WebhookError> {
    let build_state: BuildState = token.parse().map_err(ValidationError::from)?;
    let event: WebhookEvent =
        serde_json::from_slice(body).map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
    tracing::Span::current().record("repository", event.repository.as_str());

    if !state.config.qualifies(&event) {
        tracing::info!(
            trigger_kind = %event.trigger_kind,
            is_manual = event.is_manual,
            "Ignoring build event from non-automated trigger"
        );
        return Ok(StatusCode::NO_CONTENT);
    }

    let repository =
        RepositoryId::parse(event.repository.as_str()).map_err(ValidationError::from)?;
    let reference = event.revision()?;
    tracing::debug!(metadata = ?event.trigger_metadata, "Processing build event");

    if build_state == BuildState::Success {
        let tag = event.first_tag()?;
        state
            .orchestrator
            .load_image_tags(&tag, &repository, &reference)
            .await?;
    }

    state
        .orchestrator
        .handle(&repository, &reference, event.build_url.as_deref(), build_state)
        .await?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(trigger_kind: &str, is_manual: bool) -> WebhookEvent {
        WebhookEvent {
            trigger_kind: trigger_kind.to_string(),
            is_manual,
            ..WebhookEvent::default()
        }
    }

    #[test]
    fn default_config_accepts_automated_triggers() {
        let config = WebhookConfig::default();
        assert!(config.qualifies(&event("github", false)));
        assert!(config.qualifies(&event("automated", false)));
    }

    #[test]
    fn manual_builds_never_qualify() {
        assert!(!WebhookConfig::default().qualifies(&event("github", true)));
    }

    #[test]
    fn unknown_trigger_kinds_do_not_qualify() {
        let config = WebhookConfig::new(["bitbucket"]);
        assert!(config.qualifies(&event("bitbucket", false)));
        assert!(!config.qualifies(&event("github", false)));
        assert!(!config.qualifies(&event("", false)));
    }
}
