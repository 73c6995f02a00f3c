//! Newtype domain identifiers.
//!
//! Every identifier that crosses a capability boundary is a distinct newtype.
//! This keeps a short revision reference from being passed where a fully
//! resolved [`CommitSha`] is required, and an [`ImageTag`] from being passed
//! where an [`ImageId`] is expected, even though all of them are strings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Length of a fully resolved Git commit SHA, in hexadecimal characters.
pub const FULL_SHA_LEN: usize = 40;

/// Reasons an identifier failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The repository identifier is not in `owner/name` form.
    #[error("invalid repository '{0}': expected 'owner/name'")]
    InvalidRepository(String),

    /// The value is not a 40-character hexadecimal commit SHA.
    #[error("invalid commit sha '{0}': expected 40 hexadecimal characters")]
    InvalidCommitSha(String),

    /// A required identifier was empty.
    #[error("{kind} must not be empty")]
    Empty {
        /// Human-readable identifier kind (e.g. `"image tag"`).
        kind: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes with no structure beyond non-emptiness.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// A revision reference as supplied by the build service: a short SHA
    /// prefix, a full SHA, or any alias the hosting API accepts.
    RevisionRef
}

string_id! {
    /// A human-assigned, mutable image tag (e.g. `"latest"`, `"v1"`).
    ImageTag
}

string_id! {
    /// An immutable, content-derived image identifier as reported by the
    /// registry for a tag.
    ImageId
}

impl ImageId {
    /// Returns this identifier as a tag name.
    ///
    /// The registry cannot be addressed by content identifier directly, so an
    /// image is also tagged with its own identifier to give callers a stable
    /// tag-shaped handle.
    pub fn to_tag(&self) -> ImageTag {
        ImageTag(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Identifies a repository in `"owner/name"` format.
///
/// The same identifier addresses the source repository on the hosting API
/// and the image repository in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId {
    full: String,
    split: usize,
}

impl RepositoryId {
    /// Parses an `owner/name` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidRepository`] unless the value
    /// contains exactly one `/` separating two non-empty segments.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let full = value.into();
        let split = full
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
            .map(|(owner, _)| owner.len());
        match split {
            Some(split) => Ok(Self { full, split }),
            None => Err(IdentifierError::InvalidRepository(full)),
        }
    }

    /// Returns the owning account or organisation.
    pub fn owner(&self) -> &str {
        &self.full[..self.split]
    }

    /// Returns the repository name without its owner.
    pub fn name(&self) -> &str {
        &self.full[self.split + 1..]
    }

    /// Returns the full `owner/name` string.
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl FromStr for RepositoryId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<RepositoryId> for String {
    fn from(value: RepositoryId) -> Self {
        value.full
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full)
    }
}

// ---------------------------------------------------------------------------
// Commit SHA
// ---------------------------------------------------------------------------

/// A fully resolved Git commit SHA (40-character lowercase hex string).
///
/// Statuses can only be built from this type, so a short reference can never
/// reach the hosting API's status endpoint unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitSha(String);

impl CommitSha {
    /// Validates and normalises a full commit SHA.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidCommitSha`] unless the value is
    /// exactly [`FULL_SHA_LEN`] ASCII hex digits.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let v = value.into();
        if v.len() == FULL_SHA_LEN && v.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(v.to_ascii_lowercase()))
        } else {
            Err(IdentifierError::InvalidCommitSha(v))
        }
    }

    /// Returns the SHA as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns this SHA as a tag name, so the image built from it can be
    /// addressed by source commit.
    pub fn to_tag(&self) -> ImageTag {
        ImageTag(self.0.clone())
    }
}

impl FromStr for CommitSha {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CommitSha {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CommitSha> for String {
    fn from(value: CommitSha) -> Self {
        value.0
    }
}

impl std::fmt::Display for CommitSha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// Identifies a single inbound webhook delivery.
///
/// Generated fresh for every request and attached to its tracing span so all
/// upstream calls made on behalf of one delivery can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(Uuid);

impl DeliveryId {
    /// Generates a new random delivery identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
