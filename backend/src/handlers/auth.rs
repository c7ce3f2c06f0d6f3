//! Authentication and staff account handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{Action, Resource, User};

use crate::error::AppResult;
use crate::middleware::{check_permission, CurrentUser};
use crate::services::auth::{CreateUserInput, LoginInput, LoginResponse};
use crate::services::AuthService;
use crate::AppState;

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.login(body).await?;
    Ok(Json(response))
}

/// Current user from the token
pub async fn me(current_user: CurrentUser) -> Json<MeResponse> {
    let user = current_user.0;
    Json(MeResponse {
        user_id: user.user_id,
        username: user.username,
        role: user.role.to_string(),
        permissions: user.permissions,
    })
}

pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    check_permission(&current_user.0, Resource::User, Action::Create)?;
    let user = AuthService::new(state.db.clone(), &state.config)
        .create_user(body)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    check_permission(&current_user.0, Resource::User, Action::View)?;
    let users = AuthService::new(state.db.clone(), &state.config)
        .list_users()
        .await?;
    Ok(Json(users))
}

/// Active cashiers, for the till's cashier picker
pub async fn list_kasir(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    let users = AuthService::new(state.db.clone(), &state.config)
        .list_kasir()
        .await?;
    Ok(Json(users))
}

pub async fn set_user_active(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SetActiveRequest>,
) -> AppResult<Json<User>> {
    check_permission(&current_user.0, Resource::User, Action::Edit)?;
    let user = AuthService::new(state.db.clone(), &state.config)
        .set_active(id, body.is_active)
        .await?;
    Ok(Json(user))
}
