//! HTTP handlers for sales

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{Action, PaginatedResponse, Resource, SaleStatus, Transaksi, UserRole};

use crate::error::AppResult;
use crate::middleware::{check_permission, check_role, CurrentUser};
use crate::services::transaksi::{CreateSaleInput, SaleOutcome, TransaksiFilter};
use crate::services::TransaksiService;
use crate::AppState;

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: SaleStatus,
}

pub async fn create_transaksi(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<(StatusCode, Json<SaleOutcome>)> {
    check_permission(&current_user.0, Resource::Transaksi, Action::Create)?;
    let outcome = TransaksiService::from_state(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn list_transaksi(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<TransaksiFilter>,
) -> AppResult<Json<PaginatedResponse<Transaksi>>> {
    check_permission(&current_user.0, Resource::Transaksi, Action::View)?;
    let page = TransaksiService::from_state(&state).list(&filter).await?;
    Ok(Json(page))
}

pub async fn get_transaksi(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Transaksi>> {
    check_permission(&current_user.0, Resource::Transaksi, Action::View)?;
    let transaksi = TransaksiService::from_state(&state).get(id).await?;
    Ok(Json(transaksi))
}

pub async fn update_transaksi_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> AppResult<Json<SaleOutcome>> {
    check_permission(&current_user.0, Resource::Transaksi, Action::Edit)?;
    let outcome = TransaksiService::from_state(&state)
        .update_status(id, body.status)
        .await?;
    Ok(Json(outcome))
}

pub async fn cancel_transaksi(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SaleOutcome>> {
    check_permission(&current_user.0, Resource::Transaksi, Action::Edit)?;
    let outcome = TransaksiService::from_state(&state).cancel(id).await?;
    Ok(Json(outcome))
}

pub async fn delete_transaksi(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    check_role(&current_user.0, &[UserRole::Admin])?;
    TransaksiService::from_state(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
