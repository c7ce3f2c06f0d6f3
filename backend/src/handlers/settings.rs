//! Shop settings handlers

use axum::{extract::State, Json};

use shared::{Action, Resource, Settings};

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::settings::UpdateSettingsInput;
use crate::services::SettingsService;
use crate::AppState;

/// Current settings; defaults when none have been saved
pub async fn get_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Settings>> {
    check_permission(&current_user.0, Resource::Settings, Action::View)?;
    let settings = SettingsService::new(state.db).find().await?.unwrap_or_default();
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<UpdateSettingsInput>,
) -> AppResult<Json<Settings>> {
    check_permission(&current_user.0, Resource::Settings, Action::Edit)?;
    let settings = SettingsService::new(state.db).update(input).await?;
    Ok(Json(settings))
}
