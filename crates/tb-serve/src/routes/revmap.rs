use crate::middleware::correlation::CorrelationId;
use crate::routes::error::map_error;
use crate::{AppState, build_bridge};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use tb_core::links;
use tb_core::types::CommitLookup;
use utoipa::ToSchema;

/// Prefix of the changeset links produced by `linkify`.
pub const CHANGESET_BASE: &str = "/changeset";

#[derive(Debug, Deserialize, ToSchema)]
pub struct LinkifyInput {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LinkifyOutput {
    pub html: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/revmap/{reference}", get(lookup))
        .route("/linkify", post(linkify))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/revmap/{reference}",
    params(("reference" = String, Path, description = "`r<N>` legacy revision or 5..40 char hash prefix")),
    responses((status = 200, body = Vec<CommitLookup>))
)]
pub(crate) async fn lookup(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(reference): Path<String>,
) -> Response {
    if !state.config.github.enable_revmap {
        return Json(Vec::<CommitLookup>::new()).into_response();
    }
    let bridge = match build_bridge(&state) {
        Ok(bridge) => bridge,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match bridge.revmap().resolve(&reference) {
        Ok(hits) => Json(hits).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/linkify",
    request_body = LinkifyInput,
    responses((status = 200, body = LinkifyOutput))
)]
pub(crate) async fn linkify(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Json(input): Json<LinkifyInput>,
) -> Response {
    let options = state.config.link_options(CHANGESET_BASE);
    if !options.revmap_enabled {
        let html = links::escape_html(&input.text);
        return Json(LinkifyOutput { html }).into_response();
    }
    let bridge = match build_bridge(&state) {
        Ok(bridge) => bridge,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let html = bridge.revmap().linkify(&input.text, &options);
    Json(LinkifyOutput { html }).into_response()
}

#[cfg(test)]
mod tests {
    use crate::app;
    use crate::test_support::{body_json, state, store};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::json;
    use tb_core::Bridge;
    use tb_core::config::BridgeConfig;
    use tb_events::bus::EventBus;
    use tower::ServiceExt;

    const HASH: &str = "eb390eca04394a9d4e6c8c2b5bd4e0fbcbd0f3a1";

    fn enabled() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.github.enable_revmap = true;
        config
    }

    #[tokio::test]
    async fn test_lookup_by_revision_and_prefix() {
        let (_dir, state) = state(enabled());
        Bridge::new(store(&state), EventBus::new(1))
            .revmap()
            .append(1432, HASH, "Fix the frobnicator")
            .unwrap();

        for (uri, query) in [("/api/revmap/r1432", "1432"), ("/api/revmap/EB390ECA04", "EB390ECA04")] {
            let response = app(state.clone())
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                body_json(response).await,
                json!([{ "hash": HASH, "message": "Fix the frobnicator", "query": query }])
            );
        }
    }

    #[tokio::test]
    async fn test_lookup_disabled_is_empty() {
        let (_dir, state) = state(BridgeConfig::default());
        let response = app(state)
            .oneshot(Request::get("/api/revmap/r1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_linkify_endpoint() {
        let (_dir, state) = state(enabled());
        Bridge::new(store(&state), EventBus::new(1))
            .revmap()
            .append(7, HASH, "Seven")
            .unwrap();
        let response = app(state)
            .oneshot(
                Request::post("/api/linkify")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "text": "see r7 <now>" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["html"],
            format!(r#"see <a class="changeset" href="/changeset/{HASH}" title="Seven">r7</a> &lt;now&gt;"#)
        );
    }
}
