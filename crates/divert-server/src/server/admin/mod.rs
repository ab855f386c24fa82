//! Staff admin panel.
//!
//! Unlike the account-scoped pages, superusers see every owner's records here
//! and non-superusers see only their own; anything outside that scope is a
//! 404. Creation skips the link quota.

pub mod accounts;
pub mod announcements;
pub mod diversion;
pub mod records;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::AppState;
use super::error::AppError;
use super::session::AuthSession;
use crate::access::can_access;
use crate::forms::{Cleaned, FormErrors};
use crate::listing::Page;
use crate::storage::{Account, FlashMessage, Owned};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(index))
        .route("/admin/links/", get(records::list_links))
        .route(
            "/admin/links/add/",
            get(records::add_link_form).post(records::add_link),
        )
        .route(
            "/admin/links/{id}/edit/",
            get(records::edit_link_form).post(records::edit_link),
        )
        .route("/admin/links/{id}/status/", post(records::link_status))
        .route("/admin/links/{id}/delete/", post(records::delete_link))
        .route("/admin/workorders/", get(records::list_work_orders))
        .route(
            "/admin/workorders/add/",
            get(records::add_work_order_form).post(records::add_work_order),
        )
        .route(
            "/admin/workorders/{id}/edit/",
            get(records::edit_work_order_form).post(records::edit_work_order),
        )
        .route(
            "/admin/workorders/{id}/status/",
            post(records::work_order_status),
        )
        .route(
            "/admin/workorders/{id}/delete/",
            post(records::delete_work_order),
        )
        .route("/admin/numbers/", get(records::list_numbers))
        .route(
            "/admin/numbers/add/",
            get(records::add_number_form).post(records::add_number),
        )
        .route(
            "/admin/numbers/{id}/edit/",
            get(records::edit_number_form).post(records::edit_number),
        )
        .route("/admin/numbers/{id}/status/", post(records::number_status))
        .route("/admin/numbers/{id}/delete/", post(records::delete_number))
        .route("/admin/accounts/", get(accounts::list))
        .route(
            "/admin/accounts/add/",
            get(accounts::add_form).post(accounts::add),
        )
        .route(
            "/admin/accounts/{id}/edit/",
            get(accounts::edit_form).post(accounts::edit),
        )
        .route("/admin/accounts/{id}/delete/", post(accounts::delete))
        .route("/admin/announcements/", get(announcements::list))
        .route(
            "/admin/announcements/add/",
            get(announcements::add_form).post(announcements::add),
        )
        .route(
            "/admin/announcements/{id}/edit/",
            get(announcements::edit_form).post(announcements::edit),
        )
        .route(
            "/admin/announcements/{id}/delete/",
            post(announcements::delete),
        )
        .route("/admin/diversion/traffic/", get(diversion::list_traffic))
        .route(
            "/admin/diversion/traffic/{id}/",
            get(diversion::traffic_detail),
        )
        .route(
            "/admin/diversion/traffic/add/",
            get(diversion::add_traffic_form).post(diversion::add_traffic),
        )
        .route(
            "/admin/diversion/traffic/{id}/edit/",
            get(diversion::edit_traffic_form).post(diversion::edit_traffic),
        )
        .route(
            "/admin/diversion/traffic/{id}/delete/",
            post(diversion::delete_traffic),
        )
        .route("/admin/diversion/rules/", get(diversion::list_rules))
        .route(
            "/admin/diversion/rules/add/",
            get(diversion::add_rule_form).post(diversion::add_rule),
        )
        .route(
            "/admin/diversion/rules/{id}/edit/",
            get(diversion::edit_rule_form).post(diversion::edit_rule),
        )
        .route(
            "/admin/diversion/rules/{id}/delete/",
            post(diversion::delete_rule),
        )
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Section {
    pub name: &'static str,
    pub url: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AdminIndex {
    pub site_header: String,
    pub site_title: String,
    pub index_title: String,
    pub sections: Vec<Section>,
    pub messages: Vec<FlashMessage>,
}

const SECTIONS: &[Section] = &[
    Section {
        name: "Links",
        url: "/admin/links/",
    },
    Section {
        name: "Work orders",
        url: "/admin/workorders/",
    },
    Section {
        name: "Numbers",
        url: "/admin/numbers/",
    },
    Section {
        name: "Announcements",
        url: "/admin/announcements/",
    },
    Section {
        name: "Diverted traffic",
        url: "/admin/diversion/traffic/",
    },
    Section {
        name: "Divert rules",
        url: "/admin/diversion/rules/",
    },
];

const ACCOUNTS_SECTION: Section = Section {
    name: "Accounts",
    url: "/admin/accounts/",
};

/// `GET /admin/`
pub async fn index(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<AdminIndex>, AppError> {
    session.require_staff()?;

    let mut sections = Vec::with_capacity(SECTIONS.len() + 1);
    if session.account.is_superuser {
        sections.push(ACCOUNTS_SECTION);
    }
    sections.extend(SECTIONS.iter().copied());

    Ok(Json(AdminIndex {
        site_header: state.site.site_header.clone(),
        site_title: state.site.site_title.clone(),
        index_title: state.site.index_title.clone(),
        sections,
        messages: session.messages(&state).await?,
    }))
}

/// An admin changelist page.
#[derive(Debug, Serialize)]
pub struct ChangeList<T> {
    pub title: &'static str,
    pub site_header: String,
    pub query: String,
    pub page: Page<T>,
    pub messages: Vec<FlashMessage>,
}

impl<T> ChangeList<T> {
    pub async fn new(
        state: &AppState,
        session: &AuthSession,
        title: &'static str,
        query: Option<String>,
        page: Page<T>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            title,
            site_header: state.site.site_header.clone(),
            query: query.unwrap_or_default(),
            page,
            messages: session.messages(state).await?,
        })
    }
}

/// Cleaned values, or the field errors that stopped cleaning. Either way the
/// caller keeps adding its own checks to the errors.
pub(crate) fn split(result: Result<Cleaned, FormErrors>) -> (Option<Cleaned>, FormErrors) {
    match result {
        Ok(cleaned) => (Some(cleaned), FormErrors::default()),
        Err(errors) => (None, errors),
    }
}

/// Rows outside the actor's admin scope do not exist for them.
pub fn in_scope<T: Owned>(account: &Account, record: T) -> Result<T, AppError> {
    if can_access(account, &record) {
        Ok(record)
    } else {
        Err(AppError::NotFound)
    }
}
