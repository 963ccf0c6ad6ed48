//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: registration, login, and the Google OAuth
//! code-exchange callback.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::respond::{ApiFailure, ApiResult};
use crate::web::state::AppState;
use crate::web::users::UserPayload;
use nearserve_core::domain::User;
use nearserve_core::ports::{NewUser, PortError};
use nearserve_core::validate::{is_valid_email, MIN_PASSWORD_LEN};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GoogleCallbackRequest {
    pub code: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn auth_response(message: &str, token: String, user: User) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": message,
        "token": token,
        "user": UserPayload::from(user),
    }))
}

fn hash_password(password: &str) -> Result<String, ApiFailure> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            error!("failed to hash password: {err}");
            PortError::Unexpected("Failed to hash password".to_string()).into()
        })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new account with email and password
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserPayload),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.email.is_empty() || req.password.is_empty() || req.name.is_empty() {
        return Err(
            PortError::Validation("Email, password, and name are required".to_string()).into(),
        );
    }
    if !is_valid_email(&req.email) {
        return Err(PortError::Validation("Invalid email format".to_string()).into());
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(PortError::Validation(
            "Password must be at least 6 characters long".to_string(),
        )
        .into());
    }

    let hashed = hash_password(&req.password)?;
    let user = state
        .store
        .create_user(NewUser {
            email: req.email,
            name: req.name,
            hashed_password: Some(hashed),
            google_id: None,
            avatar: None,
        })
        .await?;

    let token = state
        .tokens
        .issue(user.id, &user.email)
        .map_err(|err| PortError::Unexpected(err.to_string()))?;
    Ok((
        StatusCode::CREATED,
        auth_response("User registered successfully", token, user),
    ))
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserPayload),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(PortError::Validation("Email and password are required".to_string()).into());
    }

    let invalid = || PortError::Unauthorized("Invalid email or password".to_string());

    let credentials = state
        .store
        .find_credentials_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    // Google-originated accounts have no usable password.
    let stored_hash = credentials.hashed_password.ok_or_else(invalid)?;
    let parsed = PasswordHash::new(&stored_hash).map_err(|err| {
        error!("failed to parse stored password hash: {err}");
        PortError::Unexpected("Authentication error".to_string())
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(invalid().into());
    }

    let user = state.store.get_user(credentials.user_id).await?;
    let token = state
        .tokens
        .issue(user.id, &user.email)
        .map_err(|err| PortError::Unexpected(err.to_string()))?;
    Ok((StatusCode::OK, auth_response("Login successful", token, user)))
}

/// POST /auth/google/callback - Exchange a Google OAuth code for a session
#[utoipa::path(
    post,
    path = "/auth/google/callback",
    request_body = GoogleCallbackRequest,
    responses(
        (status = 200, description = "Authenticated", body = UserPayload),
        (status = 400, description = "Invalid code or profile without email"),
        (status = 401, description = "Code exchange refused")
    )
)]
pub async fn google_callback_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoogleCallbackRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.code.is_empty() {
        return Err(PortError::Validation("Invalid code".to_string()).into());
    }
    let identity = state.identity.as_ref().ok_or_else(|| {
        PortError::Unexpected("Google sign-in is not configured".to_string())
    })?;

    let profile = identity.exchange_code(&req.code).await?;

    let user = match state.store.find_user_by_email(&profile.email).await? {
        Some(existing) => {
            if existing.google_id.is_none() {
                state
                    .store
                    .link_google_account(existing.id, &profile.subject, profile.avatar.as_deref())
                    .await?;
            }
            state.store.get_user(existing.id).await?
        }
        None => {
            state
                .store
                .create_user(NewUser {
                    email: profile.email.clone(),
                    name: profile.name.unwrap_or_else(|| profile.email.clone()),
                    hashed_password: None,
                    google_id: Some(profile.subject),
                    avatar: profile.avatar,
                })
                .await?
        }
    };

    let token = state
        .tokens
        .issue(user.id, &user.email)
        .map_err(|err| PortError::Unexpected(err.to_string()))?;
    Ok((
        StatusCode::OK,
        auth_response("Authenticated Successfully", token, user),
    ))
}
