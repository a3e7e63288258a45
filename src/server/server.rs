use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use axum::{extract::State, middleware, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::metrics::metrics_handler;
use super::roles_routes::make_roles_routes;
use super::{log_requests, state::*, ServerConfig};
use crate::query::CohortRegistry;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub cohorts: Vec<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        cohorts: state.cohorts.names(),
    };
    Json(stats)
}

pub fn make_app(config: ServerConfig, cohorts: Arc<CohortRegistry>) -> Result<Router> {
    let state = ServerState::new(config, cohorts);

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let app: Router = home_router
        .merge(make_roles_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(cohorts: Arc<CohortRegistry>, config: ServerConfig) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, cohorts)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result.context("HTTP server failed")
        }
        result = axum::serve(metrics_listener, make_metrics_app()) => {
            result.context("Metrics server failed")
        }
    }
}
