//! HTTP surface: the questionnaire page, its submission handler, and a
//! health check. Pages are rendered server-side as plain HTML.

pub mod endpoints;
pub mod error;
pub mod render;
pub mod router;
pub mod server;
pub mod types;

pub use router::triage_router;
pub use server::{start_server, ServerError, TriageServer};
pub use types::ApiContext;
