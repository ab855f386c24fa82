//! Shared response shapes and extractors for page handlers.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;

use super::error::AppError;
use super::session::AuthSession;
use super::AppState;
use crate::listing::Page;
use crate::storage::{FlashLevel, FlashMessage};

/// Integer primary key from the path. Anything else is a 404.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for RecordId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        Ok(Self(id))
    }
}

/// A list page with the messages queued for it.
#[derive(Debug, Serialize)]
pub struct ListView<T> {
    pub title: &'static str,
    pub query: String,
    pub status_filter: Option<i64>,
    pub page: Page<T>,
    pub messages: Vec<FlashMessage>,
}

/// Delete confirmation page.
#[derive(Debug, Serialize)]
pub struct ConfirmView<T> {
    pub title: String,
    pub record: T,
}

/// Queue a flash message and redirect (303) to `to`.
pub async fn flash_redirect(
    state: &AppState,
    session: &AuthSession,
    level: FlashLevel,
    message: &str,
    to: &str,
) -> Result<Response, AppError> {
    session.flash(state, level, message).await?;
    Ok(Redirect::to(to).into_response())
}
