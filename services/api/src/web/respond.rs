//! services/api/src/web/respond.rs
//!
//! The one place where `PortError` meets HTTP. Every handler returns
//! `ApiResult<T>`; failures render as the `{"success": false, "message"}`
//! envelope the clients consume.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nearserve_core::ports::PortError;
use serde_json::json;
use tracing::error;

/// A `PortError` on its way out of the API.
#[derive(Debug)]
pub struct ApiFailure(pub PortError);

pub type ApiResult<T> = Result<T, ApiFailure>;

impl From<PortError> for ApiFailure {
    fn from(err: PortError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            PortError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            PortError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            PortError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            PortError::Unexpected(msg) => {
                error!("request failed unexpectedly: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

/// Success envelope for endpoints whose only payload is a message.
pub fn message(text: &str) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        let cases = [
            (PortError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (PortError::Unauthorized("u".into()), StatusCode::UNAUTHORIZED),
            (PortError::Forbidden("f".into()), StatusCode::FORBIDDEN),
            (PortError::NotFound("n".into()), StatusCode::NOT_FOUND),
            (PortError::Conflict("c".into()), StatusCode::CONFLICT),
            (
                PortError::Unexpected("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiFailure(err).into_response().status(), expected);
        }
    }

    #[test]
    fn message_renders_the_bare_success_envelope() {
        let Json(body) = message("done");
        assert_eq!(body, json!({ "success": true, "message": "done" }));
    }
}
