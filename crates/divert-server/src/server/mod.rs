//! HTTP server for the Divert back office.
//!
//! JSON pages over axum: session login, account-scoped CRUD for links, work
//! orders and numbers, the diversion pages and the staff admin panel.

pub mod admin;
pub mod auth_routes;
pub mod error;
pub mod home;
pub mod links;
pub mod numbers;
pub mod references;
pub mod respond;
pub mod session;
pub mod work_orders;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use divert_core::config::SiteConfig;

use crate::auth::JwtManager;
use crate::storage::Database;

pub use error::AppError;
pub use session::{AuthSession, MaybeSession, SESSION_COOKIE};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub site: Arc<SiteConfig>,
    pub session_ttl_secs: i64,
}

impl AppState {
    pub fn new(db: Database, secret: &[u8], session_ttl_secs: i64, site: SiteConfig) -> Self {
        Self {
            db,
            jwt: Arc::new(JwtManager::new(secret, session_ttl_secs)),
            site: Arc::new(site),
            session_ttl_secs,
        }
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(home::healthz))
        .route("/", get(home::index))
        .route(
            "/login/",
            get(auth_routes::login_form).post(auth_routes::login),
        )
        .route(
            "/logout/",
            get(auth_routes::logout).post(auth_routes::logout),
        )
        .route("/links/", get(links::list))
        .route("/links/add/", get(links::add_form).post(links::add))
        .route(
            "/links/edit/{id}/",
            get(links::edit_form).post(links::edit),
        )
        .route(
            "/links/delete/{id}/",
            get(links::delete_confirm).post(links::delete),
        )
        .route("/workorders/", get(work_orders::list))
        .route(
            "/workorders/add/",
            get(work_orders::add_form).post(work_orders::add),
        )
        .route(
            "/workorders/edit/{id}/",
            get(work_orders::edit_form).post(work_orders::edit),
        )
        .route(
            "/workorders/delete/{id}/",
            get(work_orders::delete_confirm).post(work_orders::delete),
        )
        .route("/numbers/", get(numbers::list))
        .route("/numbers/add/", get(numbers::add_form).post(numbers::add))
        .route(
            "/numbers/edit/{id}/",
            get(numbers::edit_form).post(numbers::edit),
        )
        .route(
            "/numbers/delete/{id}/",
            get(numbers::delete_confirm).post(numbers::delete),
        )
        .route("/diversion/", get(home::diversion_home))
        .route("/diversion/page-one/", get(home::page_one))
        .route("/diversion/page-two/", get(home::page_two))
        .merge(admin::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
