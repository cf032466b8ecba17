//! HTTP error envelope
//!
//! Every failure leaves the server as `{"message", "status"}`. Outside
//! production a `detail` field carries the underlying error for local
//! debugging; in production it is withheld. An expired access token gets
//! its own machine-readable body so clients know to hit the refresh
//! endpoint instead of sending the user back to login.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::error;

use auth::{AuthError, GateError, TokenError};
use social_core::{FeedError, GraphError, PostError, ProfileError};
use storage::StoreError;

static PRODUCTION: AtomicBool = AtomicBool::new(false);

/// Set once at bootstrap; controls whether error details leak to clients
pub fn init_error_mode(production: bool) {
    PRODUCTION.store(production, Ordering::Relaxed);
}

/// A failure ready to be rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
    expired_token: bool,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
            expired_token: false,
        }
    }

    /// An internal failure: generic message outward, real error as detail
    pub(crate) fn internal(source: impl std::fmt::Display) -> Self {
        error!(error = %source, "internal error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
            detail: Some(source.to_string()),
            expired_token: false,
        }
    }

    fn expired_access_token(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
            detail: None,
            expired_token: true,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.expired_token {
            let body = json!({
                "error": "expired_access_token",
                "error_description": self.message,
            });
            return (self.status, Json(body)).into_response();
        }

        let mut body = json!({
            "message": self.message,
            "status": self.status.as_u16(),
        });
        if !PRODUCTION.load(Ordering::Relaxed) {
            if let Some(detail) = &self.detail {
                body["detail"] = json!(detail);
            }
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let status = match &e {
            AuthError::Validation
            | AuthError::DuplicateUsernameAndEmail
            | AuthError::DuplicateEmail
            | AuthError::DuplicateUsername => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound | AuthError::EmailNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Token(TokenError::Expired) => StatusCode::FORBIDDEN,
            AuthError::Token(_) => StatusCode::UNAUTHORIZED,
            AuthError::Password(_) | AuthError::Store(_) => return ApiError::internal(e),
        };
        ApiError::new(status, e.to_string())
    }
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Unauthenticated => ApiError::new(StatusCode::UNAUTHORIZED, e.to_string()),
            GateError::ExpiredAccessToken => ApiError::expired_access_token(e.to_string()),
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        match &e {
            GraphError::SelfFollow => ApiError::new(StatusCode::BAD_REQUEST, e.to_string()),
            GraphError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, e.to_string()),
            GraphError::PartialUpdate { .. } | GraphError::Store(_) => ApiError::internal(e),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(e: PostError) -> Self {
        match &e {
            PostError::Validation => ApiError::new(StatusCode::BAD_REQUEST, e.to_string()),
            PostError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, e.to_string()),
            PostError::NotOwner => ApiError::new(StatusCode::FORBIDDEN, e.to_string()),
            PostError::PartialUpdate { .. } | PostError::Store(_) => ApiError::internal(e),
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(e: FeedError) -> Self {
        match &e {
            FeedError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, e.to_string()),
            FeedError::Store(_) => ApiError::internal(e),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        match &e {
            ProfileError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, e.to_string()),
            ProfileError::Store(_) => ApiError::internal(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::internal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(
            ApiError::from(AuthError::Validation).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::DuplicateEmail).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Token(TokenError::Expired)).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_expired_gate_error_is_machine_readable() {
        let err = ApiError::from(GateError::ExpiredAccessToken);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(err.expired_token);
    }

    #[test]
    fn test_internal_errors_hide_the_cause_in_message() {
        let err = ApiError::from(StoreError::Backend("disk on fire".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
        assert!(err.detail.as_deref().unwrap().contains("disk on fire"));
    }

    #[test]
    fn test_not_owner_maps_to_forbidden() {
        let err = ApiError::from(PostError::NotOwner);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
