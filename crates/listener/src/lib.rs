//! quayd event source infrastructure.
//!
//! Receives build-lifecycle webhooks from the registry's build service over
//! HTTP and drives the [`orchestrator::Orchestrator`] from them:
//!
//! ```text
//! POST /build-events/{status}
//!   ├─ status not in {pending, success, error, failure} ─► 400
//!   ├─ body not a JSON build event                      ─► 400
//!   ├─ manual build or unaccepted trigger kind          ─► 204
//!   ├─ success ─► load_image_tags ─► handle             ─► 200
//!   └─ other   ─► handle                                ─► 200
//!                 any upstream failure                  ─► 500 (error text)
//! ```
//!
//! Image retagging completes before the `success` status is reported, so a
//! viewer following the status link finds the image already retagged.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, payload decoding, and HTTP status mapping
//! live here. The orchestrator sees only domain identifiers.

mod error;
mod event;
mod router;

pub use error::{ValidationError, WebhookError};
pub use event::WebhookEvent;
pub use router::{router, AppState, WebhookConfig, DEFAULT_TRIGGER_KINDS};
