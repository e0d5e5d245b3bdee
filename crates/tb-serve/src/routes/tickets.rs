use crate::middleware::correlation::CorrelationId;
use crate::routes::error::map_error;
use crate::{AppState, build_bridge};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use tb_core::BridgeError;
use tb_core::error::TicketError;
use tb_core::types::{Ticket, TicketChange, TicketId};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/changelog", get(changelog))
        .with_state(state)
}

fn parse_id(id: &str) -> Result<TicketId, BridgeError> {
    id.parse::<TicketId>().map_err(|err| {
        BridgeError::Ticket(TicketError::InvalidInput {
            message: err.to_string(),
        })
    })
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(("id" = u64, Path, description = "Ticket number")),
    responses((status = 200, body = Ticket), (status = 404, description = "Unknown ticket"))
)]
pub(crate) async fn get_ticket(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
) -> Response {
    let result = parse_id(&id).and_then(|id| build_bridge(&state)?.tickets().get(id));
    match result {
        Ok(ticket) => Json(ticket).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}/changelog",
    params(("id" = u64, Path, description = "Ticket number")),
    responses((status = 200, body = Vec<TicketChange>), (status = 404, description = "Unknown ticket"))
)]
pub(crate) async fn changelog(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
) -> Response {
    let result = parse_id(&id).and_then(|id| build_bridge(&state)?.tickets().changelog(id));
    match result {
        Ok(changes) => Json(changes).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}
