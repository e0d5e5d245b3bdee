use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use tb_core::error::{
    BridgeError, ConfigError, ImportError, NotifyError, RevmapError, TicketError,
};
use tb_vcs::backend::VcsError;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &BridgeError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code, message) = match err {
        BridgeError::Ticket(ticket) => map_ticket_error(ticket),
        BridgeError::Revmap(revmap) => map_revmap_error(revmap),
        BridgeError::Import(import) => map_import_error(import),
        BridgeError::Config(config) => map_config_error(config),
        BridgeError::Notify(notify) => map_notify_error(notify),
        BridgeError::Vcs(vcs) => map_vcs_error(vcs),
        BridgeError::Internal { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            message.clone(),
        ),
    };

    (
        status,
        Json(ErrorEnvelope {
            code,
            message,
            correlation_id,
        }),
    )
}

fn map_ticket_error(err: &TicketError) -> (StatusCode, &'static str, String) {
    match err {
        TicketError::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        TicketError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
    }
}

fn map_revmap_error(err: &RevmapError) -> (StatusCode, &'static str, String) {
    match err {
        RevmapError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
    }
}

fn map_import_error(err: &ImportError) -> (StatusCode, &'static str, String) {
    match err {
        ImportError::Io(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_format",
            err.to_string(),
        ),
    }
}

fn map_config_error(err: &ConfigError) -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "config_error",
        err.to_string(),
    )
}

fn map_notify_error(err: &NotifyError) -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        err.to_string(),
    )
}

fn map_vcs_error(err: &VcsError) -> (StatusCode, &'static str, String) {
    match err {
        VcsError::RepoNotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        VcsError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout", err.to_string()),
        VcsError::InvalidCommand { .. }
        | VcsError::CommandFailed { .. }
        | VcsError::BackendError { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}
