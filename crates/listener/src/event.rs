//! Inbound build-event payload.

use domain::{ImageTag, RevisionRef};
use serde::Deserialize;

use crate::error::ValidationError;

/// A build-lifecycle notification as posted by the build service.
///
/// Every field is optional on the wire; absent fields decode to their empty
/// value and are validated only once the event is known to qualify.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WebhookEvent {
    /// Repository in `owner/name` form.
    pub repository: String,

    /// What started the build (e.g. `"github"` for a push trigger).
    pub trigger_kind: String,

    /// `true` when a user started the build by hand.
    pub is_manual: bool,

    /// Tags the build service applied to the built image.
    pub docker_tags: Vec<String>,

    /// Build name; the build service sets it to the short revision built.
    pub build_name: String,

    /// Link to the build's page.
    #[serde(rename = "homepage")]
    pub build_url: Option<String>,

    /// Trigger-specific details. Carried for logging; not interpreted.
    pub trigger_metadata: serde_json::Map<String, serde_json::Value>,
}

impl WebhookEvent {
    /// Returns the revision that was built.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingRevision`] when `build_name` is empty.
    pub fn revision(&self) -> Result<RevisionRef, ValidationError> {
        RevisionRef::new(self.build_name.trim()).ok_or(ValidationError::MissingRevision)
    }

    /// Returns the first tag the build service applied.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingTag`] when there is no non-empty first tag.
    pub fn first_tag(&self) -> Result<ImageTag, ValidationError> {
        self.docker_tags
            .first()
            .and_then(|tag| ImageTag::new(tag.as_str()))
            .ok_or(ValidationError::MissingTag)
    }
}
