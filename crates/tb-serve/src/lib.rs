pub mod middleware;
pub mod openapi;
pub mod routes;

use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tb_core::config::BridgeConfig;
use tb_core::{Bridge, BridgeError};
use tb_db::schema;
use tb_db::store::DbStore;
use tb_events::bus::EventBus;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub db_path: PathBuf,
    pub config: Arc<BridgeConfig>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(config: BridgeConfig, event_bus: EventBus) -> Self {
        Self {
            db_path: config.server.db_path.clone(),
            config: Arc::new(config),
            event_bus,
        }
    }
}

/// One connection per request; SQLite's busy timeout serializes writers.
pub fn build_bridge(state: &AppState) -> Result<Bridge<DbStore, EventBus>, BridgeError> {
    let conn = schema::open_and_migrate(&state.db_path).map_err(|err| BridgeError::Internal {
        message: err.to_string(),
    })?;
    Ok(Bridge::new(DbStore::new(conn), state.event_bus.clone()))
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app(state)).await
}
