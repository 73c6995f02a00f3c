//! quayd GitHub infrastructure adapter.
//!
//! Implements the hosting-API ports defined in the [`domain`] crate
//! ([`domain::CommitResolver`] and [`domain::StatusesRepository`]) against the
//! GitHub REST API using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. URL
//! construction, authentication, and the mapping of HTTP status codes onto
//! domain errors all live here; the orchestrator never sees them.
//!
//! ## Endpoints
//!
//! | Port | Request |
//! |------|---------|
//! | [`GitHubCommitResolver`] | `GET /repos/{owner}/{repo}/commits/{ref}` |
//! | [`GitHubStatusesRepository`] | `POST /repos/{owner}/{repo}/statuses/{sha}` |
//!
//! Both authenticate with a bearer token supplied at start-up.

mod client;
mod commits;
mod statuses;


pub use client::{GitHubClient, GitHubConfig, DEFAULT_API_URL};
pub use commits::GitHubCommitResolver;
pub use statuses::GitHubStatusesRepository;
