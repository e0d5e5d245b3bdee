use crate::{AppState, build_bridge};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tb_core::redirect::{browser_redirect, changeset_redirect};
use tb_core::types::CommitLookup;
use tracing::{debug, warn};
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrowserQuery {
    /// Revision to browse instead of the default branch.
    pub rev: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/browser", get(browse_root))
        .route("/browser/{*path}", get(browse))
        .route("/changeset/{*path}", get(changeset))
        .with_state(state)
}

pub(crate) async fn browse_root(
    State(state): State<AppState>,
    Query(query): Query<BrowserQuery>,
) -> Response {
    redirect_browser(&state, "", query.rev.as_deref())
}

#[utoipa::path(
    get,
    path = "/browser/{path}",
    params(("path" = String, Path, description = "Repository path"), BrowserQuery),
    responses(
        (status = 303, description = "Redirect to the GitHub source browser"),
        (status = 404, description = "No browser configured")
    )
)]
pub(crate) async fn browse(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<BrowserQuery>,
) -> Response {
    redirect_browser(&state, &format!("/{path}"), query.rev.as_deref())
}

fn redirect_browser(state: &AppState, path: &str, rev: Option<&str>) -> Response {
    let Some(browser) = state.config.browser() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let target = browser_redirect(browser, path, rev);
    debug!(%target, "browser redirect");
    Redirect::to(&target).into_response()
}

#[utoipa::path(
    get,
    path = "/changeset/{path}",
    params(("path" = String, Path, description = "Commit hash or legacy revision, optionally followed by a path")),
    responses(
        (status = 303, description = "Redirect to the GitHub commit view"),
        (status = 404, description = "No browser configured")
    )
)]
pub(crate) async fn changeset(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let Some(browser) = state.config.browser() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let target = changeset_redirect(browser, &path, |reference| resolve(&state, reference));
    debug!(%target, "changeset redirect");
    Redirect::to(&target).into_response()
}

fn resolve(state: &AppState, reference: &str) -> Vec<CommitLookup> {
    if !state.config.github.enable_revmap {
        return Vec::new();
    }
    let result = build_bridge(state).and_then(|bridge| bridge.revmap().resolve(reference));
    result.unwrap_or_else(|err| {
        warn!(reference, "revmap lookup failed: {err}");
        Vec::new()
    })
}
