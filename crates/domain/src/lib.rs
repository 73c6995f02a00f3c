//! Core domain for quayd.
//!
//! This crate contains every identifier, value type, capability port, and
//! capability error used throughout the service. Infrastructure crates
//! implement the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business types + port definitions.** This crate has no I/O dependencies.
//! It defines *what* the orchestrator needs from the hosting API and the
//! registry; the `github` and `registry` crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryId`, `CommitSha`, `ImageId`, etc.) |
//! | [`types`] | `BuildState` and `Status` |
//! | [`errors`] | One error type per capability |
//! | [`ports`] | The four capability traits |
//! | [`memory`] | In-memory stand-ins for every port |

pub mod errors;
pub mod identifiers;
pub mod memory;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ResolutionError, StatusCreationError, TagResolutionError, TaggingError};
pub use identifiers::{
    CommitSha, DeliveryId, IdentifierError, ImageId, ImageTag, RepositoryId, RevisionRef,
    FULL_SHA_LEN,
};
pub use memory::{
    InMemoryCommitResolver, InMemoryStatusesRepository, InMemoryTagResolver,
    LoggingStatusesRepository, LoggingTagger, RecordingTagger, TagCall,
};
pub use ports::{CommitResolver, StatusesRepository, TagResolver, Tagger};
pub use types::{BuildState, Status, UnknownBuildState, DEFAULT_CONTEXT};
