//! Webhook error types and HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{IdentifierError, UnknownBuildState};
use orchestrator::OrchestratorError;
use thiserror::Error;

/// An inbound event that cannot be processed as sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The path token is not a known build state.
    #[error(transparent)]
    InvalidStatus(#[from] UnknownBuildState),

    /// The body is not a JSON build event.
    #[error("malformed event body: {0}")]
    MalformedBody(String),

    /// The repository field is not `owner/name`.
    #[error(transparent)]
    InvalidRepository(#[from] IdentifierError),

    /// The event does not name the revision that was built.
    #[error("event carries no build_name revision")]
    MissingRevision,

    /// A success event carries no image tag to resolve.
    #[error("success event carries no docker tags")]
    MissingTag,
}

/// Why a webhook delivery was not processed successfully.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Rejected before reaching the orchestrator.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An upstream capability failed.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

impl WebhookError {
    /// Returns the HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Orchestrator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        match &self {
            Self::Validation(_) => tracing::warn!(error = %message, "Rejected build event"),
            Self::Orchestrator(_) => tracing::error!(error = %message, "Failed to process build event"),
        }
        (status, message).into_response()
    }
}
