//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::token::TokenError;
use crate::web::respond::ApiFailure;
use crate::web::state::AppState;
use nearserve_core::ports::PortError;

/// The authenticated caller, inserted into request extensions by
/// [`require_auth`] and picked up by handlers via `Extension<AuthUser>`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Middleware that validates the bearer token and extracts the caller.
///
/// Each failure mode gets its own 401 message so clients can tell an
/// expired session apart from a missing or mangled header.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            PortError::Unauthorized(
                "No token provided. Authorization header is required.".to_string(),
            )
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        PortError::Unauthorized("Invalid token format. Use \"Bearer <token>\"".to_string())
    })?;

    if token.is_empty() {
        return Err(PortError::Unauthorized("Token is empty".to_string()).into());
    }

    let (user_id, email) = state.tokens.verify(token).map_err(|err| {
        let message = match err {
            TokenError::Expired => "Token has expired. Please login again.".to_string(),
            TokenError::Invalid | TokenError::Malformed(_) => {
                "Invalid token. Authentication failed.".to_string()
            }
        };
        PortError::Unauthorized(message)
    })?;

    req.extensions_mut().insert(AuthUser { id: user_id, email });
    Ok(next.run(req).await)
}
