//! Capability port traits.
//!
//! The orchestrator depends only on these four traits. Infrastructure crates
//! (`github`, `registry`) implement them against the real APIs; [`crate::memory`]
//! implements them in process memory for tests and offline runs.

use async_trait::async_trait;

use crate::{
    CommitSha, ImageId, ImageTag, RepositoryId, ResolutionError, RevisionRef, Status,
    StatusCreationError, TagResolutionError, TaggingError,
};

/// Resolves a short revision reference to a full commit SHA.
#[async_trait]
pub trait CommitResolver: Send + Sync {
    /// Resolves `reference` within `repository`.
    ///
    /// Resolving an already-full SHA returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] when the reference is unknown or
    /// ambiguous, or when the lookup itself fails.
    async fn resolve(
        &self,
        repository: &RepositoryId,
        reference: &RevisionRef,
    ) -> Result<CommitSha, ResolutionError>;
}

/// Creates commit statuses.
#[async_trait]
pub trait StatusesRepository: Send + Sync {
    /// Records `status` against its commit.
    ///
    /// Repeated statuses with the same commit and context are not
    /// deduplicated; the hosting API shows the latest.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusCreationError`] on transport failure or when the
    /// hosting API rejects the status.
    async fn create(&self, status: &Status) -> Result<(), StatusCreationError>;
}

/// Resolves an image tag to the content identifier it currently points at.
#[async_trait]
pub trait TagResolver: Send + Sync {
    /// Looks up `tag` in `repository`.
    ///
    /// # Errors
    ///
    /// Returns [`TagResolutionError::TagNotFound`] for unknown tags and
    /// [`TagResolutionError::Transport`] for everything else.
    async fn resolve(
        &self,
        repository: &RepositoryId,
        tag: &ImageTag,
    ) -> Result<ImageId, TagResolutionError>;
}

/// Points tags at images.
#[async_trait]
pub trait Tagger: Send + Sync {
    /// Points `tag` at `image` in `repository`.
    ///
    /// Idempotent: re-pointing a tag at the image it already names is a
    /// no-op from the registry's point of view.
    ///
    /// # Errors
    ///
    /// Returns a [`TaggingError`] when the registry rejects the write or the
    /// request cannot be sent.
    async fn tag(
        &self,
        repository: &RepositoryId,
        image: &ImageId,
        tag: &ImageTag,
    ) -> Result<(), TaggingError>;
}
