//! Authentication middleware
//!
//! JWT authentication and role-based access control middleware

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorDetail, ErrorResponse};
use crate::AppState;
use shared::{Action, Resource, UserRole};

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub permissions: Vec<String>,
}

impl AuthUser {
    /// Check if user has a specific permission
    pub fn has_permission(&self, resource: Resource, action: Action) -> bool {
        let permission = format!("{}:{}", resource.as_str(), action.as_str());
        self.permissions.contains(&permission)
    }

    pub fn has_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: UserRole,
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Decode and validate a JWT into an [`AuthUser`]
pub fn decode_token(token: &str, secret: &str) -> AppResult<AuthUser> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        username: claims.username,
        role: claims.role,
        permissions: claims.permissions,
    })
}

/// Authentication middleware that validates the bearer token and stores the
/// [`AuthUser`] in request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let auth_user = match decode_token(token, &state.config.jwt.secret) {
        Ok(user) => user,
        Err(e) => return unauthorized_response(&e.to_string()),
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail::new("UNAUTHORIZED", message),
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail::new("UNAUTHORIZED", "Authentication required"),
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

/// Permission guard for use in handlers
pub fn check_permission(user: &AuthUser, resource: Resource, action: Action) -> AppResult<()> {
    if user.has_permission(resource, action) {
        Ok(())
    } else {
        tracing::debug!(
            username = %user.username,
            "Permission denied: requires {}:{}",
            resource.as_str(),
            action.as_str()
        );
        Err(AppError::InsufficientPermissions)
    }
}

/// Role guard for endpoints restricted to specific roles
pub fn check_role(user: &AuthUser, roles: &[UserRole]) -> AppResult<()> {
    if user.has_role(roles) {
        Ok(())
    } else {
        Err(AppError::InsufficientPermissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(role: UserRole, secret: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "kasir1".to_string(),
            role,
            permissions: role.permission_strings(),
            exp: now + exp_offset,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let token = token_for(UserRole::Kasir, "secret", 3600);
        let user = decode_token(&token, "secret").unwrap();
        assert_eq!(user.role, UserRole::Kasir);
        assert_eq!(user.username, "kasir1");
        assert!(user.has_permission(Resource::Transaksi, Action::Create));
        assert!(!user.has_permission(Resource::Settings, Action::Edit));
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let token = token_for(UserRole::Admin, "secret", 3600);
        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let token = token_for(UserRole::Admin, "secret", -3600);
        assert!(decode_token(&token, "secret").is_err());
    }

    #[test]
    fn test_guards() {
        let token = token_for(UserRole::Chef, "secret", 3600);
        let chef = decode_token(&token, "secret").unwrap();
        assert!(check_permission(&chef, Resource::Produksi, Action::Approve).is_ok());
        assert!(check_permission(&chef, Resource::Modal, Action::Edit).is_err());
        assert!(check_role(&chef, &[UserRole::Admin]).is_err());
        assert!(check_role(&chef, &[UserRole::Admin, UserRole::Chef]).is_ok());
    }
}
