//! API endpoints.

mod polls;
mod results;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/polls", polls::router())
        .nest("/votes", votes::router())
        .nest("/results", results::router())
}
