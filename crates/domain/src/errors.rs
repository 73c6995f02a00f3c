//! Capability error taxonomy.
//!
//! Each capability port has its own error type so callers can tell a lookup
//! miss from a rejected write from a transport failure. None of them are
//! retried by this service: every error ends the handling of the webhook
//! delivery that caused it.

use thiserror::Error;

use crate::{ImageTag, RepositoryId, RevisionRef};

/// Failure to resolve a revision reference to a full commit SHA.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The hosting API has no commit matching the reference.
    #[error("unknown revision '{reference}' in {repository}")]
    UnknownRevision {
        /// Repository the lookup ran against.
        repository: RepositoryId,
        /// The reference that could not be resolved.
        reference: RevisionRef,
    },

    /// The reference matches more than one commit, or is not a commit-ish.
    #[error("ambiguous revision '{reference}' in {repository}: {message}")]
    AmbiguousRevision {
        /// Repository the lookup ran against.
        repository: RepositoryId,
        /// The reference that could not be resolved.
        reference: RevisionRef,
        /// Upstream explanation.
        message: String,
    },

    /// The hosting API answered, but not with a full commit SHA.
    #[error("invalid commit lookup response: {message}")]
    InvalidResponse {
        /// Description of what was wrong with the response.
        message: String,
    },

    /// The request could not be completed.
    #[error("commit lookup failed: {message}")]
    Transport {
        /// Description of the network or HTTP failure.
        message: String,
    },
}

/// Failure to create a commit status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusCreationError {
    /// The hosting API answered with a non-success status code.
    #[error("status creation rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the hosting API.
        status: u16,
        /// Response body or upstream message.
        message: String,
    },

    /// The request could not be completed.
    #[error("status creation failed: {message}")]
    Transport {
        /// Description of the network failure.
        message: String,
    },
}

/// Failure to resolve an image tag to its content identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagResolutionError {
    /// The registry has no such tag in the repository.
    #[error("tag '{tag}' not found in {repository}")]
    TagNotFound {
        /// Repository the lookup ran against.
        repository: RepositoryId,
        /// The missing tag.
        tag: ImageTag,
    },

    /// The request failed, was rejected, or its body could not be decoded.
    #[error("tag lookup failed: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },
}

/// Failure to point a tag at an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaggingError {
    /// The registry answered with a non-2xx status code.
    #[error("tagging rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the registry.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The request could not be sent.
    #[error("tagging failed: {message}")]
    Transport {
        /// Description of the network failure.
        message: String,
    },
}
