//! HTTP surface (axum).
//!
//! Handlers are thin: they parse the request, hand the work to an
//! application service on the blocking pool and shape the JSON reply.

mod error;
mod handlers;
mod router;
mod server;
mod state;

pub use error::{ApiError, ErrorBody, ErrorDetail};
pub use router::build_router;
pub use server::serve;
pub use state::AppState;
