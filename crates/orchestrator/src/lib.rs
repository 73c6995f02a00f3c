//! quayd orchestration layer.
//!
//! [`Orchestrator`] sequences calls between the four capability ports defined
//! in the [`domain`] crate. It contains no transport details and no domain
//! rules of its own beyond the order in which capabilities are invoked:
//!
//! - a revision is always resolved before a status is created for it;
//! - an image's identifier is always resolved before any tag is pointed at it.
//!
//! ## Capability bindings
//!
//! Each capability is either bound explicitly through [`OrchestratorBuilder`]
//! or left unset. Unset capabilities fall back to the [`Capabilities`] value
//! supplied at construction, typically [`Capabilities::offline`] built once
//! in `main`. Bindings never change after [`OrchestratorBuilder::build`].

use std::sync::Arc;

use domain::{
    BuildState, CommitResolver, ImageTag, InMemoryCommitResolver, InMemoryTagResolver,
    LoggingStatusesRepository, LoggingTagger, RepositoryId, ResolutionError, RevisionRef, Status,
    StatusCreationError, StatusesRepository, TagResolutionError, TagResolver, TaggingError,
    Tagger, DEFAULT_CONTEXT,
};
use thiserror::Error;

/// Any capability failure surfaced by the orchestrator.
///
/// Every variant is transparent: the message is exactly the capability's.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// Revision resolution failed.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Status creation failed.
    #[error(transparent)]
    StatusCreation(#[from] StatusCreationError),

    /// Tag resolution failed.
    #[error(transparent)]
    TagResolution(#[from] TagResolutionError),

    /// Tagging failed.
    #[error(transparent)]
    Tagging(#[from] TaggingError),
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// A complete set of capability implementations.
///
/// Used as the fallback for any capability an [`Orchestrator`] was not
/// explicitly given.
#[derive(Clone)]
pub struct Capabilities {
    /// Revision resolution.
    pub commit_resolver: Arc<dyn CommitResolver>,
    /// Status creation.
    pub statuses: Arc<dyn StatusesRepository>,
    /// Tag resolution.
    pub tag_resolver: Arc<dyn TagResolver>,
    /// Tagging.
    pub tagger: Arc<dyn Tagger>,
}

impl Capabilities {
    /// Builds the inert set: hex prefixes resolve by padding, every tag
    /// resolves to a derived identifier, and statuses and tag calls are
    /// logged and dropped.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            commit_resolver: Arc::new(InMemoryCommitResolver::new()),
            statuses: Arc::new(LoggingStatusesRepository),
            tag_resolver: Arc::new(InMemoryTagResolver::deriving()),
            tagger: Arc::new(LoggingTagger),
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("commit_resolver", &"<CommitResolver>")
            .field("statuses", &"<StatusesRepository>")
            .field("tag_resolver", &"<TagResolver>")
            .field("tagger", &"<Tagger>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Binds capabilities for an [`Orchestrator`].
#[derive(Debug)]
pub struct OrchestratorBuilder {
    defaults: Capabilities,
    bindings: Bindings,
    context: String,
}

#[derive(Default)]
struct Bindings {
    commit_resolver: Option<Arc<dyn CommitResolver>>,
    statuses: Option<Arc<dyn StatusesRepository>>,
    tag_resolver: Option<Arc<dyn TagResolver>>,
    tagger: Option<Arc<dyn Tagger>>,
}

impl std::fmt::Debug for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bindings")
            .field("commit_resolver", &self.commit_resolver.is_some())
            .field("statuses", &self.statuses.is_some())
            .field("tag_resolver", &self.tag_resolver.is_some())
            .field("tagger", &self.tagger.is_some())
            .finish()
    }
}

impl OrchestratorBuilder {
    /// Starts a builder whose unset capabilities fall back to `defaults`.
    #[must_use]
    pub fn new(defaults: Capabilities) -> Self {
        Self {
            defaults,
            bindings: Bindings::default(),
            context: DEFAULT_CONTEXT.to_string(),
        }
    }

    /// Binds revision resolution.
    #[must_use]
    pub fn commit_resolver(mut self, resolver: Arc<dyn CommitResolver>) -> Self {
        self.bindings.commit_resolver = Some(resolver);
        self
    }

    /// Binds status creation.
    #[must_use]
    pub fn statuses(mut self, statuses: Arc<dyn StatusesRepository>) -> Self {
        self.bindings.statuses = Some(statuses);
        self
    }

    /// Binds tag resolution.
    #[must_use]
    pub fn tag_resolver(mut self, resolver: Arc<dyn TagResolver>) -> Self {
        self.bindings.tag_resolver = Some(resolver);
        self
    }

    /// Binds tagging.
    #[must_use]
    pub fn tagger(mut self, tagger: Arc<dyn Tagger>) -> Self {
        self.bindings.tagger = Some(tagger);
        self
    }

    /// Overrides the display context label attached to every status.
    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Freezes the bindings.
    #[must_use]
    pub fn build(self) -> Orchestrator {
        Orchestrator {
            defaults: self.defaults,
            bindings: self.bindings,
            context: self.context,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Reports commit statuses and retags built images.
#[derive(Debug)]
pub struct Orchestrator {
    defaults: Capabilities,
    bindings: Bindings,
    context: String,
}

impl Orchestrator {
    /// Creates an orchestrator that uses `defaults` for every capability.
    #[must_use]
    pub fn new(defaults: Capabilities) -> Self {
        OrchestratorBuilder::new(defaults).build()
    }

    /// Starts a builder whose unset capabilities fall back to `defaults`.
    #[must_use]
    pub fn builder(defaults: Capabilities) -> OrchestratorBuilder {
        OrchestratorBuilder::new(defaults)
    }

    /// Returns the context label attached to every status.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Resolves `reference` and reports `state` against the resulting commit.
    ///
    /// The status carries `target_url` unchanged and the description mapped
    /// from `state`. Returns the status that was created.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Resolution`] (and creates nothing) when
    /// the reference cannot be resolved, or
    /// [`OrchestratorError::StatusCreation`] when the status is rejected.
    #[tracing::instrument(
        skip_all,
        fields(repository = %repository, reference = %reference, state = %state),
        err(Display)
    )]
    pub async fn handle(
        &self,
        repository: &RepositoryId,
        reference: &RevisionRef,
        target_url: Option<&str>,
        state: BuildState,
    ) -> Result<Status, OrchestratorError> {
        let sha = self.commit_resolver().resolve(repository, reference).await?;

        let status = Status::for_build(
            repository.clone(),
            sha,
            state,
            self.context.clone(),
            target_url.map(str::to_string),
        );
        self.statuses().create(&status).await?;

        tracing::info!(sha = %status.sha, "Created commit status");
        Ok(status)
    }

    /// Points two extra tags at the image built for `reference`.
    ///
    /// Resolves `reference` to a full SHA and `tag` to the image it names,
    /// then tags that image with the SHA and with its own identifier. The
    /// second tag gives callers a tag-shaped handle equivalent to addressing
    /// the image by content identifier, which the registry does not support.
    ///
    /// # Errors
    ///
    /// Returns the first failure among the two resolutions and the two tag
    /// writes. A tag applied before the failure is left in place.
    #[tracing::instrument(
        skip_all,
        fields(repository = %repository, tag = %tag, reference = %reference),
        err(Display)
    )]
    pub async fn load_image_tags(
        &self,
        tag: &ImageTag,
        repository: &RepositoryId,
        reference: &RevisionRef,
    ) -> Result<(), OrchestratorError> {
        let sha = self.commit_resolver().resolve(repository, reference).await?;
        let image = self.tag_resolver().resolve(repository, tag).await?;

        let tagger = self.tagger();
        tagger.tag(repository, &image, &sha.to_tag()).await?;
        tagger.tag(repository, &image, &image.to_tag()).await?;

        tracing::info!(sha = %sha, image = %image, "Tagged image with commit and image id");
        Ok(())
    }

    fn commit_resolver(&self) -> &dyn CommitResolver {
        self.bindings
            .commit_resolver
            .as_deref()
            .unwrap_or(self.defaults.commit_resolver.as_ref())
    }

    fn statuses(&self) -> &dyn StatusesRepository {
        self.bindings
            .statuses
            .as_deref()
            .unwrap_or(self.defaults.statuses.as_ref())
    }

    fn tag_resolver(&self) -> &dyn TagResolver {
        self.bindings
            .tag_resolver
            .as_deref()
            .unwrap_or(self.defaults.tag_resolver.as_ref())
    }

    fn tagger(&self) -> &dyn Tagger {
        self.bindings
            .tagger
            .as_deref()
            .unwrap_or(self.defaults.tagger.as_ref())
    }
}
