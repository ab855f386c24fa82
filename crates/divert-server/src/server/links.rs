//! Link pages, scoped to the acting account. Link creation is bounded by the
//! account's link quota.

use axum::Form;
use axum::Json;
use axum::extract::{Query, State};
use axum::response::Response;
use tracing::{info, instrument};

use super::AppState;
use super::error::AppError;
use super::references;
use super::respond::{ConfirmView, ListView, RecordId, flash_redirect};
use super::session::AuthSession;
use crate::access::{self, AccessError, Action, RecordKind};
use crate::forms::link::{self as link_form, LINK_FORM};
use crate::forms::{ChoiceOptions, FormData, FormErrors, FormView};
use crate::listing::{ListQuery, PAGE_SIZE, Page, Paginator};
use crate::storage::{Condition, DatabaseError, FlashLevel, Link, LinkParams, ListFilter};

const LIST_PATH: &str = "/links/";

/// `GET /links/`
pub async fn list(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListView<Link>>, AppError> {
    let status = query.status_filter().map_err(AppError::BadRequest)?;
    let filter = ListFilter::owned_by(session.account.id)
        .search(query.q.as_deref())
        .with(status.map(Condition::Status));

    let paginator = Paginator::new(state.db.count_links(&filter).await?, PAGE_SIZE);
    let window = paginator.window(query.page.as_deref());
    let rows = state
        .db
        .list_links(&filter, window.limit, window.offset)
        .await?;

    Ok(Json(ListView {
        title: "Links",
        query: query.q.unwrap_or_default(),
        status_filter: status,
        page: Page::new(rows, window, &paginator),
        messages: session.messages(&state).await?,
    }))
}

/// Flash and bounce to the list when the account has no quota left.
async fn ensure_quota(state: &AppState, session: &AuthSession) -> Result<(), AppError> {
    let owned = state.db.count_links_owned(session.account.id).await?;
    match access::check_link_quota(&session.account, owned) {
        Ok(()) => Ok(()),
        Err(AccessError::QuotaExceeded { quota }) => Err(quota_exceeded(state, session, quota).await),
        Err(e) => Err(e.into()),
    }
}

async fn quota_exceeded(state: &AppState, session: &AuthSession, quota: i64) -> AppError {
    info!(account_id = session.account.id, quota, "Link quota reached");
    match session
        .flash(state, FlashLevel::Error, &access::quota_message(quota))
        .await
    {
        Ok(()) => AppError::QuotaExceeded,
        Err(e) => e,
    }
}

/// Work order options are always the actor's own.
async fn form_view(
    state: &AppState,
    session: &AuthSession,
    title: &str,
    values: &FormData,
    errors: &FormErrors,
) -> Result<FormView, AppError> {
    let mut options = ChoiceOptions::new();
    options.insert(
        link_form::WORK_ORDER.name,
        references::work_order_options(&state.db, session.account.id).await?,
    );
    Ok(LINK_FORM.render(title, values, errors, &options))
}

/// Clean a submission. The work order only has to exist.
async fn clean(
    state: &AppState,
    session: &AuthSession,
    title: &str,
    data: &FormData,
    editing: Option<i64>,
) -> Result<LinkParams, AppError> {
    let (params, mut errors) = match LINK_FORM.clean(data) {
        Ok(cleaned) => (Some(link_form::params(&cleaned)), FormErrors::default()),
        Err(errors) => (None, errors),
    };

    if let Some(p) = &params {
        references::check_work_order(
            &state.db,
            p.work_order_id,
            None,
            link_form::WORK_ORDER.name,
            &mut errors,
        )
        .await?;
        if state.db.link_identifier_taken(&p.identifier, editing).await? {
            errors.add(link_form::IDENTIFIER.name, IDENTIFIER_TAKEN);
        }
    }

    match params {
        Some(p) if errors.is_empty() => Ok(p),
        _ => Err(form_view(state, session, title, data, &errors).await?.into()),
    }
}

pub(crate) const IDENTIFIER_TAKEN: &str = "Link with this identifier already exists.";

async fn load(
    state: &AppState,
    session: &AuthSession,
    id: i64,
    action: Action,
) -> Result<Link, AppError> {
    let link = state.db.get_link(id).await?;
    Ok(access::authorize(&session.account, link, RecordKind::Link, action)?)
}

/// `GET /links/add/`
pub async fn add_form(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<FormView>, AppError> {
    ensure_quota(&state, &session).await?;
    let view = form_view(
        &state,
        &session,
        "Add link",
        &FormData::new(),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /links/add/`
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    ensure_quota(&state, &session).await?;
    let params = clean(&state, &session, "Add link", &data, None).await?;

    let created = state
        .db
        .create_link_within_quota(session.account.id, session.account.link_quota, &params)
        .await;
    let link = match created {
        Ok(Some(link)) => link,
        Ok(None) => {
            return Err(quota_exceeded(&state, &session, session.account.link_quota).await);
        }
        Err(DatabaseError::Conflict(_)) => {
            let mut errors = FormErrors::default();
            errors.add(link_form::IDENTIFIER.name, IDENTIFIER_TAKEN);
            return Err(form_view(&state, &session, "Add link", &data, &errors)
                .await?
                .into());
        }
        Err(e) => return Err(e.into()),
    };

    info!(link_id = link.id, identifier = %link.identifier, "Link created");
    flash_redirect(
        &state,
        &session,
        FlashLevel::Success,
        "Link added successfully.",
        LIST_PATH,
    )
    .await
}

/// `GET /links/edit/{id}/`
pub async fn edit_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    let link = load(&state, &session, id, Action::Edit).await?;
    let view = form_view(
        &state,
        &session,
        "Edit link",
        &link_form::initial(&link),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /links/edit/{id}/`
#[instrument(skip_all, fields(account_id = session.account.id, link_id = id))]
pub async fn edit(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    let link = load(&state, &session, id, Action::Edit).await?;
    let params = clean(&state, &session, "Edit link", &data, Some(link.id)).await?;

    match state.db.update_link(link.id, &params).await {
        Ok(_) => {}
        Err(DatabaseError::Conflict(_)) => {
            let mut errors = FormErrors::default();
            errors.add(link_form::IDENTIFIER.name, IDENTIFIER_TAKEN);
            return Err(form_view(&state, &session, "Edit link", &data, &errors)
                .await?
                .into());
        }
        Err(e) => return Err(e.into()),
    }

    info!("Link updated");
    flash_redirect(
        &state,
        &session,
        FlashLevel::Success,
        "Link updated successfully.",
        LIST_PATH,
    )
    .await
}

/// `GET /links/delete/{id}/`
pub async fn delete_confirm(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<ConfirmView<Link>>, AppError> {
    let link = load(&state, &session, id, Action::Delete).await?;
    Ok(Json(ConfirmView {
        title: format!("Delete link {}", link.identifier),
        record: link,
    }))
}

/// `POST /links/delete/{id}/`
#[instrument(skip_all, fields(account_id = session.account.id, link_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    let link = load(&state, &session, id, Action::Delete).await?;
    state.db.delete_link(link.id).await?;

    info!("Link deleted");
    flash_redirect(
        &state,
        &session,
        FlashLevel::Success,
        "Link deleted successfully.",
        LIST_PATH,
    )
    .await
}
