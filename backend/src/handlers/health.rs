//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub fast_path: String,
    pub payment_gateway: String,
    pub realtime_subscribers: usize,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check database connectivity
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let fast_path = match &state.fast_path {
        Some(store) if store.ping().await => "connected",
        Some(_) => "unreachable",
        None => "not_configured",
    };

    Json(HealthResponse {
        status: if db_status == "connected" { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status.to_string(),
        fast_path: fast_path.to_string(),
        payment_gateway: if state.gateway.is_some() { "configured" } else { "not_configured" }.to_string(),
        realtime_subscribers: state.hub.subscriber_count(),
    })
}
