pub mod browser;
pub mod error;
pub mod github;
pub mod revmap;
pub mod tickets;

use crate::middleware::correlation::correlation_middleware;
use crate::{AppState, openapi};
use axum::Router;
use axum::middleware;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(revmap::router(state.clone()))
        .merge(tickets::router(state.clone()))
        .merge(openapi::router());

    Router::new()
        .merge(github::router(state.clone()))
        .merge(browser::router(state))
        .nest("/api", api)
        .layer(middleware::from_fn(correlation_middleware))
        .layer(TraceLayer::new_for_http())
}
