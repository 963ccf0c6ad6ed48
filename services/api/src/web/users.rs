//! services/api/src/web/users.rs
//!
//! Current-user endpoints: profile lookup and the one-off role selection.

use axum::{extract::State, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::AuthUser;
use crate::web::respond::ApiResult;
use crate::web::state::AppState;
use nearserve_core::domain::{User, UserRole};
use nearserve_core::ports::PortError;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// The public view of a user, hashed credential excluded.
#[derive(Serialize, ToSchema)]
pub struct UserPayload {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[schema(value_type = String)]
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserPayload {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            avatar: user.avatar,
            phone: user.phone,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SetRoleRequest {
    pub role: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /users/me - Current user profile
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = UserPayload),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state.store.get_user(auth.id).await?;
    Ok(Json(json!({
        "success": true,
        "user": UserPayload::from(user),
    })))
}

/// PUT /users/set-role - Pick the marketplace role
#[utoipa::path(
    put,
    path = "/users/set-role",
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserPayload),
        (status = 400, description = "Unknown role"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = []))
)]
pub async fn set_role_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let role = match req.role.as_str() {
        "customer" => UserRole::Customer,
        "provider" => UserRole::Provider,
        _ => {
            return Err(PortError::Validation(
                "Invalid role. Must be either \"customer\" or \"provider\"".to_string(),
            )
            .into())
        }
    };

    let user = state.store.set_user_role(auth.id, role).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Role updated to {} successfully", req.role),
        "user": UserPayload::from(user),
    })))
}
