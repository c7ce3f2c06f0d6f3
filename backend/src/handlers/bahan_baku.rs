//! HTTP handlers for raw-material lots and chef claims

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{Action, BahanBaku, Resource};

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::bahan_baku::{BahanBakuInput, ClaimInput, ClaimResult};
use crate::services::BahanBakuService;
use crate::AppState;

pub async fn list_bahan_baku(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<BahanBaku>>> {
    check_permission(&current_user.0, Resource::BahanBaku, Action::View)?;
    let lots = BahanBakuService::new(state.db).list().await?;
    Ok(Json(lots))
}

pub async fn get_bahan_baku(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BahanBaku>> {
    check_permission(&current_user.0, Resource::BahanBaku, Action::View)?;
    let lot = BahanBakuService::new(state.db).get(id).await?;
    Ok(Json(lot))
}

pub async fn create_bahan_baku(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BahanBakuInput>,
) -> AppResult<(StatusCode, Json<BahanBaku>)> {
    check_permission(&current_user.0, Resource::BahanBaku, Action::Create)?;
    let lot = BahanBakuService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(lot)))
}

pub async fn update_bahan_baku(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<BahanBakuInput>,
) -> AppResult<Json<BahanBaku>> {
    check_permission(&current_user.0, Resource::BahanBaku, Action::Edit)?;
    let lot = BahanBakuService::new(state.db).update(id, input).await?;
    Ok(Json(lot))
}

pub async fn delete_bahan_baku(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    check_permission(&current_user.0, Resource::BahanBaku, Action::Delete)?;
    BahanBakuService::new(state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Chef takes raw material for production
pub async fn claim_bahan_baku(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ClaimInput>,
) -> AppResult<(StatusCode, Json<ClaimResult>)> {
    check_permission(&current_user.0, Resource::Produksi, Action::Create)?;
    let result = BahanBakuService::new(state.db)
        .claim(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}
