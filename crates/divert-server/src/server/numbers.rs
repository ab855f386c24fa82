//! Number pages, scoped to the acting account.

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
use crate::access::{self, Action, RecordKind};
use crate::forms::number::{self as number_form, NUMBER_FORM};
use crate::forms::{ChoiceOptions, FormData, FormErrors, FormView};
use crate::listing::{ListQuery, PAGE_SIZE, Page, Paginator};
use crate::storage::{Condition, FlashLevel, ListFilter, Number, NumberParams};

const LIST_PATH: &str = "/numbers/";

/// `GET /numbers/`
pub async fn list(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListView<Number>>, AppError> {
    let status = query.status_filter().map_err(AppError::BadRequest)?;
    let filter = ListFilter::owned_by(session.account.id)
        .search(query.q.as_deref())
        .with(status.map(Condition::Status));

    let paginator = Paginator::new(state.db.count_numbers(&filter).await?, PAGE_SIZE);
    let window = paginator.window(query.page.as_deref());
    let rows = state
        .db
        .list_numbers(&filter, window.limit, window.offset)
        .await?;

    Ok(Json(ListView {
        title: "Numbers",
        query: query.q.unwrap_or_default(),
        status_filter: status,
        page: Page::new(rows, window, &paginator),
        messages: session.messages(&state).await?,
    }))
}

/// Work order and link options are the actor's own.
async fn form_view(
    state: &AppState,
    session: &AuthSession,
    title: &str,
    values: &FormData,
    errors: &FormErrors,
) -> Result<FormView, AppError> {
    let owner = session.account.id;
    let mut options = ChoiceOptions::new();
    options.insert(
        number_form::WORK_ORDER.name,
        references::work_order_options(&state.db, owner).await?,
    );
    options.insert(
        number_form::LINK.name,
        references::link_options(&state.db, owner).await?,
    );
    Ok(NUMBER_FORM.render(title, values, errors, &options))
}

/// Clean a submission. References only have to exist.
async fn clean(
    state: &AppState,
    session: &AuthSession,
    title: &str,
    data: &FormData,
) -> Result<NumberParams, AppError> {
    let (params, mut errors) = match NUMBER_FORM.clean(data) {
        Ok(cleaned) => (Some(number_form::params(&cleaned)), FormErrors::default()),
        Err(errors) => (None, errors),
    };

    if let Some(p) = &params {
        references::check_work_order(
            &state.db,
            p.work_order_id,
            None,
            number_form::WORK_ORDER.name,
            &mut errors,
        )
        .await?;
        references::check_link(
            &state.db,
            p.link_id,
            None,
            number_form::LINK.name,
            &mut errors,
        )
        .await?;
    }

    match params {
        Some(p) if errors.is_empty() => Ok(p),
        _ => Err(form_view(state, session, title, data, &errors).await?.into()),
    }
}

async fn load(
    state: &AppState,
    session: &AuthSession,
    id: i64,
    action: Action,
) -> Result<Number, AppError> {
    let number = state.db.get_number(id).await?;
    Ok(access::authorize(
        &session.account,
        number,
        RecordKind::Number,
        action,
    )?)
}

/// `GET /numbers/add/`
pub async fn add_form(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<FormView>, AppError> {
    let view = form_view(
        &state,
        &session,
        "Add number",
        &FormData::new(),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /numbers/add/`
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    let params = clean(&state, &session, "Add number", &data).await?;
    let number = state.db.create_number(session.account.id, &params).await?;

    info!(number_id = number.id, "Number created");
    flash_redirect(
        &state,
        &session,
        FlashLevel::Success,
        "Number added successfully.",
        LIST_PATH,
    )
    .await
}

/// `GET /numbers/edit/{id}/`
pub async fn edit_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    let number = load(&state, &session, id, Action::Edit).await?;
    let view = form_view(
        &state,
        &session,
        "Edit number",
        &number_form::initial(&number),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /numbers/edit/{id}/`
#[instrument(skip_all, fields(account_id = session.account.id, number_id = id))]
pub async fn edit(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    let number = load(&state, &session, id, Action::Edit).await?;
    let params = clean(&state, &session, "Edit number", &data).await?;
    state.db.update_number(number.id, &params).await?;

    info!("Number updated");
    flash_redirect(
        &state,
        &session,
        FlashLevel::Success,
        "Number updated successfully.",
        LIST_PATH,
    )
    .await
}

/// `GET /numbers/delete/{id}/`
pub async fn delete_confirm(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<ConfirmView<Number>>, AppError> {
    let number = load(&state, &session, id, Action::Delete).await?;
    Ok(Json(ConfirmView {
        title: format!("Delete number {}", number.num),
        record: number,
    }))
}

/// `POST /numbers/delete/{id}/`
#[instrument(skip_all, fields(account_id = session.account.id, number_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    let number = load(&state, &session, id, Action::Delete).await?;
    state.db.delete_number(number.id).await?;

    info!("Number deleted");
    flash_redirect(
        &state,
        &session,
        FlashLevel::Success,
        "Number deleted successfully.",
        LIST_PATH,
    )
    .await
}
