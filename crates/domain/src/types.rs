//! Commit status value types.
//!
//! A [`Status`] is what the hosting API displays next to a commit. It is
//! built once per reported build event and never mutated afterwards.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CommitSha, RepositoryId};

/// Default display context label for statuses reported by this service.
pub const DEFAULT_CONTEXT: &str = "Docker Image";

// ---------------------------------------------------------------------------
// Build state
// ---------------------------------------------------------------------------

/// Lifecycle state of an image build, as reported by the build service.
///
/// `Pending` is the only non-terminal state; a build moves from `Pending` to
/// exactly one of the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    /// The image is building.
    Pending,
    /// The image was built and pushed.
    Success,
    /// The build service failed to run the build.
    Error,
    /// The build ran and failed.
    Failure,
}

impl BuildState {
    /// Every state, in lifecycle order.
    pub const ALL: [BuildState; 4] = [Self::Pending, Self::Success, Self::Error, Self::Failure];

    /// Returns the wire token for this state (as used in webhook paths and
    /// the hosting API's status payload).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
            Self::Failure => "failure",
        }
    }

    /// Returns the human-readable description reported alongside this state.
    pub fn description(self) -> &'static str {
        match self {
            Self::Pending => "Image is building",
            Self::Success => "Image was built",
            Self::Error => "Image build errored",
            Self::Failure => "Image failed to build",
        }
    }
}

/// Returned when a token does not name a [`BuildState`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status: {0}")]
pub struct UnknownBuildState(pub String);

impl FromStr for BuildState {
    type Err = UnknownBuildState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownBuildState(s.to_string()))
    }
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// A commit status attached to a fully resolved revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Repository the commit belongs to.
    pub repository: RepositoryId,

    /// The resolved commit the status is attached to.
    pub sha: CommitSha,

    /// Reported build state.
    pub state: BuildState,

    /// Display context label; statuses with the same context on the same
    /// commit supersede one another in the hosting UI.
    pub context: String,

    /// Link followed from the status (the build's page in the registry).
    pub target_url: Option<String>,

    /// Short human-readable description.
    pub description: Option<String>,
}

impl Status {
    /// Builds the status for `state` with its mapped description.
    pub fn for_build(
        repository: RepositoryId,
        sha: CommitSha,
        state: BuildState,
        context: impl Into<String>,
        target_url: Option<String>,
    ) -> Self {
        Self {
            repository,
            sha,
            state,
            context: context.into(),
            target_url,
            description: Some(state.description().to_string()),
        }
    }
}
