//! HTTP handlers for the production workflow

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use shared::{Action, Production, Resource};

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::production::{ProductionFilter, ResolveInput, ResolveResult};
use crate::services::ProductionService;
use crate::AppState;

pub async fn list_productions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<ProductionFilter>,
) -> AppResult<Json<Vec<Production>>> {
    check_permission(&current_user.0, Resource::Produksi, Action::View)?;
    let productions = ProductionService::from_state(&state).list(&filter).await?;
    Ok(Json(productions))
}

pub async fn get_production(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Production>> {
    check_permission(&current_user.0, Resource::Produksi, Action::View)?;
    let production = ProductionService::from_state(&state).get(id).await?;
    Ok(Json(production))
}

/// Approve or cancel a pending production
pub async fn update_production_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ResolveInput>,
) -> AppResult<Json<ResolveResult>> {
    check_permission(&current_user.0, Resource::Produksi, Action::Approve)?;
    let result = ProductionService::from_state(&state).resolve(id, input).await?;
    Ok(Json(result))
}
