//! In-memory capability stand-ins.
//!
//! These implement the four ports without any I/O.
//!
//! | Stand-in | Retains | Used as |
//! |----------|---------|---------|
//! | [`InMemoryCommitResolver`] | fixed table | offline default, test double |
//! | [`InMemoryTagResolver`] | fixed table | offline default (deriving), test double |
//! | [`LoggingStatusesRepository`] | nothing | offline default |
//! | [`LoggingTagger`] | nothing | offline default |
//! | [`InMemoryStatusesRepository`] | every status | test double |
//! | [`RecordingTagger`] | every call | test double |
//!
//! The recording doubles keep an append-only log behind a [`Mutex`] so they
//! can be shared across concurrently running handlers; tests call `reset()`
//! between cases instead of relying on isolation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::{
    CommitResolver, CommitSha, ImageId, ImageTag, RepositoryId, ResolutionError, RevisionRef,
    Status, StatusCreationError, StatusesRepository, TagResolutionError, TagResolver,
    TaggingError, Tagger, FULL_SHA_LEN,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test must not poison the log for the cases that follow.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Commit resolution
// ---------------------------------------------------------------------------

/// Resolves revisions from a fixed table, expanding hex prefixes otherwise.
///
/// Lookup order:
///
/// 1. an explicitly registered mapping for the reference;
/// 2. a hex reference of at most 40 characters, right-padded with `0` to a
///    full SHA (a full SHA therefore resolves to itself);
/// 3. [`ResolutionError::UnknownRevision`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryCommitResolver {
    revisions: HashMap<String, CommitSha>,
}

impl InMemoryCommitResolver {
    /// Creates a resolver with no registered mappings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `reference` as resolving to `sha`.
    #[must_use]
    pub fn with_revision(mut self, reference: impl Into<String>, sha: CommitSha) -> Self {
        self.revisions.insert(reference.into(), sha);
        self
    }
}

#[async_trait]
impl CommitResolver for InMemoryCommitResolver {
    async fn resolve(
        &self,
        repository: &RepositoryId,
        reference: &RevisionRef,
    ) -> Result<CommitSha, ResolutionError> {
        if let Some(sha) = self.revisions.get(reference.as_str()) {
            return Ok(sha.clone());
        }

        let short = reference.as_str();
        if short.len() <= FULL_SHA_LEN && short.bytes().all(|b| b.is_ascii_hexdigit()) {
            let padded = format!("{short:0<width$}", width = FULL_SHA_LEN);
            if let Ok(sha) = CommitSha::parse(padded) {
                return Ok(sha);
            }
        }

        Err(ResolutionError::UnknownRevision {
            repository: repository.clone(),
            reference: reference.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// Keeps every created status in creation order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusesRepository {
    statuses: Arc<Mutex<Vec<Status>>>,
    failure: Option<StatusCreationError>,
}

impl InMemoryStatusesRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository that rejects every status with `error`.
    #[must_use]
    pub fn failing(error: StatusCreationError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Returns a snapshot of the statuses created so far.
    pub fn statuses(&self) -> Vec<Status> {
        lock(&self.statuses).clone()
    }

    /// Forgets every recorded status.
    pub fn reset(&self) {
        lock(&self.statuses).clear();
    }
}

#[async_trait]
impl StatusesRepository for InMemoryStatusesRepository {
    async fn create(&self, status: &Status) -> Result<(), StatusCreationError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        lock(&self.statuses).push(status.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tag resolution
// ---------------------------------------------------------------------------

/// Serves image identifiers from a fixed table.
///
/// A strict resolver (the default) reports unknown tags as
/// [`TagResolutionError::TagNotFound`]. A deriving resolver answers any tag
/// with the identifier `image-{tag}`, which keeps offline runs flowing end to
/// end.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTagResolver {
    images: HashMap<(RepositoryId, ImageTag), ImageId>,
    derive_missing: bool,
}

impl InMemoryTagResolver {
    /// Creates a strict resolver with no registered tags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver that derives an identifier for unregistered tags.
    #[must_use]
    pub fn deriving() -> Self {
        Self {
            derive_missing: true,
            ..Self::default()
        }
    }

    /// Registers `tag` in `repository` as pointing at `image`.
    #[must_use]
    pub fn with_image(mut self, repository: RepositoryId, tag: ImageTag, image: ImageId) -> Self {
        self.images.insert((repository, tag), image);
        self
    }
}

#[async_trait]
impl TagResolver for InMemoryTagResolver {
    async fn resolve(
        &self,
        repository: &RepositoryId,
        tag: &ImageTag,
    ) -> Result<ImageId, TagResolutionError> {
        if let Some(image) = self.images.get(&(repository.clone(), tag.clone())) {
            return Ok(image.clone());
        }
        if self.derive_missing {
            if let Some(image) = ImageId::new(format!("image-{tag}")) {
                return Ok(image);
            }
        }
        Err(TagResolutionError::TagNotFound {
            repository: repository.clone(),
            tag: tag.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tagging
// ---------------------------------------------------------------------------

/// One recorded [`Tagger::tag`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCall {
    /// Repository the tag was applied in.
    pub repository: RepositoryId,
    /// Image the tag points at.
    pub image: ImageId,
    /// The applied tag.
    pub tag: ImageTag,
}

/// Records every tag call in order; optionally rejects one tag name.
#[derive(Debug, Clone, Default)]
pub struct RecordingTagger {
    calls: Arc<Mutex<Vec<TagCall>>>,
    rejected_tag: Option<ImageTag>,
}

impl RecordingTagger {
    /// Creates a tagger that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tagger that rejects calls applying `tag` with HTTP 403.
    ///
    /// Rejected calls are not recorded.
    #[must_use]
    pub fn rejecting(tag: ImageTag) -> Self {
        Self {
            rejected_tag: Some(tag),
            ..Self::default()
        }
    }

    /// Returns a snapshot of the accepted calls so far.
    pub fn calls(&self) -> Vec<TagCall> {
        lock(&self.calls).clone()
    }

    /// Forgets every recorded call.
    pub fn reset(&self) {
        lock(&self.calls).clear();
    }
}

#[async_trait]
impl Tagger for RecordingTagger {
    async fn tag(
        &self,
        repository: &RepositoryId,
        image: &ImageId,
        tag: &ImageTag,
    ) -> Result<(), TaggingError> {
        if self.rejected_tag.as_ref() == Some(tag) {
            return Err(TaggingError::Rejected {
                status: 403,
                message: format!("tag '{tag}' is protected"),
            });
        }
        lock(&self.calls).push(TagCall {
            repository: repository.clone(),
            image: image.clone(),
            tag: tag.clone(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Offline reporting
// ---------------------------------------------------------------------------

/// Accepts every status and logs it. Nothing is retained.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingStatusesRepository;

#[async_trait]
impl StatusesRepository for LoggingStatusesRepository {
    async fn create(&self, status: &Status) -> Result<(), StatusCreationError> {
        tracing::info!(
            repository = %status.repository,
            sha = %status.sha,
            state = %status.state,
            context = %status.context,
            "Offline: status not reported upstream"
        );
        Ok(())
    }
}

/// Accepts every tag call and logs it. Nothing is retained.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTagger;

#[async_trait]
impl Tagger for LoggingTagger {
    async fn tag(
        &self,
        repository: &RepositoryId,
        image: &ImageId,
        tag: &ImageTag,
    ) -> Result<(), TaggingError> {
        tracing::info!(
            repository = %repository,
            image = %image,
            tag = %tag,
            "Offline: tag not applied upstream"
        );
        Ok(())
    }
}
