use utoipa::OpenApi;

use crate::routes::revmap::{LinkifyInput, LinkifyOutput};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tb_core::hook::{HookReport, PushReport, TicketFailure};
use tb_core::types::{
    CommitAuthor, CommitEvent, CommitLookup, FieldChange, PushPayload, PushRepository, Ticket,
    TicketChange, TicketId,
};
use tb_events::types::TicketNotification;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::github::receive_with_token,
        crate::routes::github::receive_plain,
        crate::routes::browser::browse,
        crate::routes::browser::changeset,
        crate::routes::revmap::lookup,
        crate::routes::revmap::linkify,
        crate::routes::tickets::get_ticket,
        crate::routes::tickets::changelog
    ),
    components(schemas(
        PushPayload,
        PushRepository,
        CommitEvent,
        CommitAuthor,
        CommitLookup,
        LinkifyInput,
        LinkifyOutput,
        Ticket,
        TicketId,
        TicketChange,
        FieldChange,
        TicketNotification,
        HookReport,
        PushReport,
        TicketFailure
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn router() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
