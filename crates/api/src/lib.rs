//! HTTP API layer for the polling service.
//!
//! - **Endpoints**: poll administration, the vote workflow, result reads
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: token resolution, shared application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
