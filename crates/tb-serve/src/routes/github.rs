use crate::middleware::correlation::CorrelationId;
use crate::{AppState, build_bridge};
use axum::body::to_bytes;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Form, Router};
use serde::Deserialize;
use tb_core::config::BridgeConfig;
use tb_core::hook::PushReport;
use tb_core::types::PushPayload;
use tb_vcs::backend::Fetcher;
use tb_vcs::git::GitFetcher;
use tracing::{debug, error, info, warn};

const MAX_PAYLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct DeliveryForm {
    payload: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/github", post(receive_plain))
        .route("/github/{token}", post(receive_with_token))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/github/{token}",
    params(("token" = String, Path, description = "Configured api token")),
    request_body(content = PushPayload, description = "GitHub push event, as JSON or form field `payload`"),
    responses(
        (status = 204, description = "Delivery accepted"),
        (status = 404, description = "Unknown token")
    )
)]
pub(crate) async fn receive_with_token(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(token): Path<String>,
    request: Request,
) -> Response {
    receive(state, correlation, Some(token), request).await
}

#[utoipa::path(
    post,
    path = "/github",
    request_body(content = PushPayload, description = "GitHub push event, as JSON or form field `payload`"),
    responses(
        (status = 204, description = "Delivery accepted"),
        (status = 404, description = "A token is configured")
    )
)]
pub(crate) async fn receive_plain(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    request: Request,
) -> Response {
    receive(state, correlation, None, request).await
}

async fn receive(
    state: AppState,
    correlation: CorrelationId,
    token: Option<String>,
    request: Request,
) -> Response {
    if !state.config.token_matches(token.as_deref()) {
        debug!(correlation = %correlation.0, "webhook token mismatch");
        return StatusCode::NOT_FOUND.into_response();
    }

    let Some(payload) = decode_delivery(request).await else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let worker_state = state.clone();
    let result = tokio::task::spawn_blocking(move || process_delivery(&worker_state, &payload)).await;
    match result {
        Ok(Some(report)) => info!(
            correlation = %correlation.0,
            repo = %report.repository,
            commits = report.commits.len(),
            updated = report.updated_count(),
            failed = report.failed_count(),
            "processed push"
        ),
        Ok(None) => {}
        Err(err) => error!(correlation = %correlation.0, "hook worker panicked: {err}"),
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Undecodable deliveries are logged and dropped.
async fn decode_delivery(request: Request) -> Option<PushPayload> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    let raw = if is_form {
        match Form::<DeliveryForm>::from_request(request, &()).await {
            Ok(Form(DeliveryForm {
                payload: Some(payload),
            })) => payload.into_bytes(),
            Ok(Form(DeliveryForm { payload: None })) => {
                debug!("form delivery without payload field");
                return None;
            }
            Err(err) => {
                warn!("undecodable form delivery: {err}");
                return None;
            }
        }
    } else {
        match to_bytes(request.into_body(), MAX_PAYLOAD_BYTES).await {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => {
                warn!("cannot read delivery body: {err}");
                return None;
            }
        }
    };

    match serde_json::from_slice::<PushPayload>(&raw) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!("undecodable push payload: {err}");
            None
        }
    }
}

fn process_delivery(state: &AppState, payload: &PushPayload) -> Option<PushReport> {
    if state.config.github.autofetch {
        autofetch(&state.config);
    }
    let bridge = match build_bridge(state) {
        Ok(bridge) => bridge,
        Err(err) => {
            error!(repo = %payload.repository.name, "cannot open ticket store: {err}");
            return None;
        }
    };
    let options = state.config.hook_options(&payload.repository.name);
    Some(bridge.hooks().process_push(payload, &options))
}

fn autofetch(config: &BridgeConfig) {
    let fetcher = GitFetcher::new(
        config.repository_dir(),
        config.github.fetch_command.clone(),
        config.fetch_timeout(),
    );
    debug!(repo = %fetcher.repo_dir().display(), "autofetching");
    match fetcher.fetch() {
        Ok(outcome) => info!(head = ?outcome.head, "fetched repository"),
        Err(err) => error!(repo = %fetcher.repo_dir().display(), "git fetch failed: {err}"),
    }
}
