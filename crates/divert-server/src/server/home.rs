//! Home page, liveness check and the diversion pages.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::{Value, json};

use super::AppState;
use super::error::AppError;
use super::session::AuthSession;
use crate::storage::{AccountSummary, Announcement, FlashMessage};

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub account: AccountSummary,
    pub announcements: Vec<Announcement>,
    pub messages: Vec<FlashMessage>,
}

/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<HomeView>, AppError> {
    Ok(Json(HomeView {
        account: session.account.summary(),
        announcements: state.db.active_announcements().await?,
        messages: session.messages(&state).await?,
    }))
}

/// `GET /healthz`
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub page_title: &'static str,
}

pub async fn diversion_home(_session: AuthSession) -> Json<PageView> {
    Json(PageView {
        page_title: "Diversion home",
    })
}

pub async fn page_one(_session: AuthSession) -> Json<PageView> {
    Json(PageView {
        page_title: "Page one",
    })
}

pub async fn page_two(_session: AuthSession) -> Json<PageView> {
    Json(PageView {
        page_title: "Page two",
    })
}
