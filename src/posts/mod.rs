use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod follow;
pub mod handlers;
pub mod services;

/// The index route carries the page cache layer, so it needs the state up front.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes(state))
        .merge(handlers::write_routes())
        .merge(follow::follow_routes())
}
