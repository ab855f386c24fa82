//! Request-boundary errors and their HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;
use tracing::error;

use crate::access::AccessError;
use crate::forms::FormView;
use crate::storage::DatabaseError;

/// Everything a handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Login required")]
    Unauthenticated { next: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(Box<FormView>),

    /// Link quota full; the flash message is already queued.
    #[error("Link quota exceeded")]
    QuotaExceeded,

    #[error(transparent)]
    Database(DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DatabaseError> for AppError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(_) => Self::NotFound,
            other => Self::Database(other),
        }
    }
}

impl From<AccessError> for AppError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Forbidden(msg) => Self::Forbidden(msg),
            AccessError::QuotaExceeded { .. } => Self::QuotaExceeded,
        }
    }
}

impl From<FormView> for AppError {
    fn from(form: FormView) -> Self {
        Self::Validation(Box::new(form))
    }
}

/// Login redirect target carrying the originally requested path.
pub fn login_url(next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("/login/?{query}")
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => error_body(StatusCode::NOT_FOUND, "Not found"),
            Self::Forbidden(msg) => error_body(StatusCode::FORBIDDEN, &msg),
            Self::Unauthenticated { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, &msg),
            Self::Validation(form) => (StatusCode::UNPROCESSABLE_ENTITY, Json(*form)).into_response(),
            Self::QuotaExceeded => Redirect::to("/links/").into_response(),
            Self::Database(e) => {
                error!(error = %e, "Database error while handling request");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
            Self::Internal(msg) => {
                error!(error = %msg, "Internal error while handling request");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Forbidden("no".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::BadRequest("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(DatabaseError::Query("boom".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_rows_become_not_found() {
        let err: AppError = DatabaseError::NotFound("Link 3".into()).into();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn unauthenticated_redirects_to_login_with_next() {
        let resp = AppError::Unauthenticated {
            next: "/links/?page=2".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers()["location"].to_str().unwrap();
        assert_eq!(location, "/login/?next=%2Flinks%2F%3Fpage%3D2");
    }

    #[test]
    fn quota_redirects_to_link_list() {
        let resp = AppError::QuotaExceeded.into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/links/");
    }
}
