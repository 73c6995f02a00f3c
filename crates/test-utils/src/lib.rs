//! Test helpers shared by the upstream adapter crates.
//!
//! [`upstream`] plays the part of a remote HTTP API: it answers every request
//! with a canned response and records what it was sent.

pub mod upstream;
