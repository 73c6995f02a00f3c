//! quayd container registry adapter.
//!
//! Implements the registry ports defined in the [`domain`] crate
//! ([`domain::TagResolver`] and [`domain::Tagger`]) against Quay's v1 tag API:
//!
//! | Port | Request | Body |
//! |------|---------|------|
//! | [`RegistryTagResolver`] | `GET /v1/repositories/{repo}/tags/{tag}` | response: JSON string image id |
//! | [`RegistryTagger`] | `PUT /v1/repositories/{repo}/tags/{tag}` | request: JSON string image id |
//!
//! Requests carry HTTP basic-auth credentials when configured.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** No domain rules live here.

mod client;
mod tags;


pub use client::{
    CredentialsError, RegistryClient, RegistryConfig, RegistryCredentials, DEFAULT_REGISTRY_URL,
};
pub use tags::{RegistryTagResolver, RegistryTagger};
