//! HTTP handlers for the capital ledger

use axum::{
    extract::{Path, State},
    Json,
};

use shared::{Action, ModalUtama, Resource, ResepProduk};

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::modal::{CapitalInput, ExpenseInput};
use crate::services::ModalService;
use crate::AppState;

pub async fn get_modal(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ModalUtama>> {
    check_permission(&current_user.0, Resource::Modal, Action::View)?;
    let ledger = ModalService::new(state.db).get().await?;
    Ok(Json(ledger))
}

pub async fn add_capital(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CapitalInput>,
) -> AppResult<Json<ModalUtama>> {
    check_permission(&current_user.0, Resource::Modal, Action::Create)?;
    let ledger = ModalService::new(state.db).add_capital(input).await?;
    Ok(Json(ledger))
}

pub async fn withdraw_capital(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CapitalInput>,
) -> AppResult<Json<ModalUtama>> {
    check_permission(&current_user.0, Resource::Modal, Action::Edit)?;
    let ledger = ModalService::new(state.db).withdraw_capital(input).await?;
    Ok(Json(ledger))
}

pub async fn record_expense(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ExpenseInput>,
) -> AppResult<Json<ModalUtama>> {
    check_permission(&current_user.0, Resource::Modal, Action::Create)?;
    let ledger = ModalService::new(state.db).record_expense(input).await?;
    Ok(Json(ledger))
}

/// Create or replace a master recipe
pub async fn upsert_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(resep): Json<ResepProduk>,
) -> AppResult<Json<ModalUtama>> {
    check_permission(&current_user.0, Resource::Modal, Action::Edit)?;
    let ledger = ModalService::new(state.db).upsert_recipe(resep).await?;
    Ok(Json(ledger))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(nama_produk): Path<String>,
) -> AppResult<Json<ModalUtama>> {
    check_permission(&current_user.0, Resource::Modal, Action::Delete)?;
    let ledger = ModalService::new(state.db).delete_recipe(&nama_produk).await?;
    Ok(Json(ledger))
}
