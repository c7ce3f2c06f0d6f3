//! HTTP handlers for the catalog

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{Action, Barang, Resource};

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::barang::{BarangFilter, CreateBarangInput, UpdateBarangInput};
use crate::services::BarangService;
use crate::AppState;

pub async fn list_barang(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<BarangFilter>,
) -> AppResult<Json<Vec<Barang>>> {
    check_permission(&current_user.0, Resource::Barang, Action::View)?;
    let barang = BarangService::from_state(&state).list(&filter).await?;
    Ok(Json(barang))
}

pub async fn get_barang(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Barang>> {
    check_permission(&current_user.0, Resource::Barang, Action::View)?;
    let barang = BarangService::from_state(&state).get(id).await?;
    Ok(Json(barang))
}

pub async fn create_barang(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateBarangInput>,
) -> AppResult<(StatusCode, Json<Barang>)> {
    check_permission(&current_user.0, Resource::Barang, Action::Create)?;
    let barang = BarangService::from_state(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(barang)))
}

pub async fn update_barang(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBarangInput>,
) -> AppResult<Json<Barang>> {
    check_permission(&current_user.0, Resource::Barang, Action::Edit)?;
    let barang = BarangService::from_state(&state).update(id, input).await?;
    Ok(Json(barang))
}

pub async fn delete_barang(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    check_permission(&current_user.0, Resource::Barang, Action::Delete)?;
    BarangService::from_state(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
