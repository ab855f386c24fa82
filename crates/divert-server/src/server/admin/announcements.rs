//! Announcement administration.

use axum::Form;
use axum::Json;
use axum::extract::{Query, State};
use axum::response::Response;
use tracing::{info, instrument};

use super::ChangeList;
use crate::forms::admin::{self as admin_form, ANNOUNCEMENT_FORM};
use crate::forms::{ChoiceOptions, FormData, FormErrors, FormView};
use crate::listing::{ADMIN_PAGE_SIZE, AdminQuery, Page, Paginator};
use crate::server::AppState;
use crate::server::error::AppError;
use crate::server::respond::{RecordId, flash_redirect};
use crate::server::session::AuthSession;
use crate::storage::{Announcement, AnnouncementParams, Condition, FlashLevel, ListFilter};

const LIST_PATH: &str = "/admin/announcements/";

fn form_view(title: &str, values: &FormData, errors: &FormErrors) -> FormView {
    ANNOUNCEMENT_FORM.render(title, values, errors, &ChoiceOptions::new())
}

fn clean(title: &str, data: &FormData) -> Result<AnnouncementParams, AppError> {
    ANNOUNCEMENT_FORM
        .clean(data)
        .map(|cleaned| admin_form::announcement_params(&cleaned))
        .map_err(|errors| form_view(title, data, &errors).into())
}

/// `GET /admin/announcements/`
pub async fn list(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ChangeList<Announcement>>, AppError> {
    session.require_staff()?;
    let active = query.active_filter().map_err(AppError::BadRequest)?;
    let (date_from, date_to) = query.date_range().map_err(AppError::BadRequest)?;
    let filter = ListFilter {
        date_from,
        date_to,
        ..ListFilter::default()
    }
    .search(query.q.as_deref())
    .with(active.map(Condition::Active));

    let paginator = Paginator::new(
        state.db.count_announcements(&filter).await?,
        ADMIN_PAGE_SIZE,
    );
    let window = paginator.window(query.page.as_deref());
    let rows = state
        .db
        .list_announcements(&filter, window.limit, window.offset)
        .await?;
    let page = Page::new(rows, window, &paginator);
    Ok(Json(
        ChangeList::new(&state, &session, "Announcements", query.q, page).await?,
    ))
}

/// `GET /admin/announcements/add/`
pub async fn add_form(session: AuthSession) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    Ok(Json(form_view(
        "Add announcement",
        &FormData::new(),
        &FormErrors::default(),
    )))
}

/// `POST /admin/announcements/add/`
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let params = clean("Add announcement", &data)?;
    let announcement = state.db.create_announcement(&params).await?;

    info!(announcement_id = announcement.id, "Announcement added");
    let message = format!(
        "The announcement \"{}\" was added successfully.",
        announcement.title
    );
    flash_redirect(&state, &session, FlashLevel::Success, &message, LIST_PATH).await
}

/// `GET /admin/announcements/{id}/edit/`
pub async fn edit_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    let announcement = state.db.get_announcement(id).await?;
    Ok(Json(form_view(
        "Change announcement",
        &admin_form::announcement_initial(&announcement),
        &FormErrors::default(),
    )))
}

/// `POST /admin/announcements/{id}/edit/`
#[instrument(skip_all, fields(account_id = session.account.id, announcement_id = id))]
pub async fn edit(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let announcement = state.db.get_announcement(id).await?;
    let params = clean("Change announcement", &data)?;
    let updated = state
        .db
        .update_announcement(announcement.id, &params)
        .await?;

    info!(is_active = updated.is_active, "Announcement changed");
    let message = format!(
        "The announcement \"{}\" was changed successfully.",
        updated.title
    );
    flash_redirect(&state, &session, FlashLevel::Success, &message, LIST_PATH).await
}

/// `POST /admin/announcements/{id}/delete/`
#[instrument(skip_all, fields(account_id = session.account.id, announcement_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let announcement = state.db.get_announcement(id).await?;
    state.db.delete_announcement(announcement.id).await?;

    info!("Announcement deleted");
    let message = format!(
        "The announcement \"{}\" was deleted successfully.",
        announcement.title
    );
    flash_redirect(&state, &session, FlashLevel::Success, &message, LIST_PATH).await
}
