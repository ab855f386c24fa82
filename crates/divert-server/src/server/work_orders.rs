//! Work order pages, scoped to the acting account.

use axum::Form;
use axum::Json;
use axum::extract::{Query, State};
use axum::response::Response;
use tracing::{info, instrument};

use super::AppState;
use super::error::AppError;
use super::respond::{ConfirmView, ListView, RecordId, flash_redirect};
use super::session::AuthSession;
use crate::access::{self, Action, RecordKind};
use crate::forms::work_order::{self as work_order_form, WORK_ORDER_FORM};
use crate::forms::{ChoiceOptions, FormData, FormErrors, FormView};
use crate::listing::{ListQuery, PAGE_SIZE, Page, Paginator};
use crate::storage::{Condition, FlashLevel, ListFilter, WorkOrder, WorkOrderParams};

const LIST_PATH: &str = "/workorders/";

/// `GET /workorders/`
pub async fn list(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListView<WorkOrder>>, AppError> {
    let status = query.status_filter().map_err(AppError::BadRequest)?;
    let filter = ListFilter::owned_by(session.account.id)
        .search(query.q.as_deref())
        .with(status.map(Condition::Status));

    let paginator = Paginator::new(state.db.count_work_orders(&filter).await?, PAGE_SIZE);
    let window = paginator.window(query.page.as_deref());
    let rows = state
        .db
        .list_work_orders(&filter, window.limit, window.offset)
        .await?;

    Ok(Json(ListView {
        title: "Work orders",
        query: query.q.unwrap_or_default(),
        status_filter: status,
        page: Page::new(rows, window, &paginator),
        messages: session.messages(&state).await?,
    }))
}

fn form_view(title: &str, values: &FormData, errors: &FormErrors) -> FormView {
    WORK_ORDER_FORM.render(title, values, errors, &ChoiceOptions::new())
}

fn clean(title: &str, data: &FormData) -> Result<WorkOrderParams, AppError> {
    WORK_ORDER_FORM
        .clean(data)
        .map(|cleaned| work_order_form::params(&cleaned))
        .map_err(|errors| form_view(title, data, &errors).into())
}

async fn load(
    state: &AppState,
    session: &AuthSession,
    id: i64,
    action: Action,
) -> Result<WorkOrder, AppError> {
    let order = state.db.get_work_order(id).await?;
    Ok(access::authorize(
        &session.account,
        order,
        RecordKind::WorkOrder,
        action,
    )?)
}

/// `GET /workorders/add/`
pub async fn add_form(_session: AuthSession) -> Json<FormView> {
    Json(form_view(
        "Add work order",
        &FormData::new(),
        &FormErrors::default(),
    ))
}

/// `POST /workorders/add/`
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    let params = clean("Add work order", &data)?;
    let order = state
        .db
        .create_work_order(session.account.id, &params)
        .await?;

    info!(work_order_id = order.id, "Work order created");
    flash_redirect(
        &state,
        &session,
        FlashLevel::Success,
        "Work order added successfully.",
        LIST_PATH,
    )
    .await
}

/// `GET /workorders/edit/{id}/`
pub async fn edit_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    let order = load(&state, &session, id, Action::Edit).await?;
    Ok(Json(form_view(
        "Edit work order",
        &work_order_form::initial(&order),
        &FormErrors::default(),
    )))
}

/// `POST /workorders/edit/{id}/`
#[instrument(skip_all, fields(account_id = session.account.id, work_order_id = id))]
pub async fn edit(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    let order = load(&state, &session, id, Action::Edit).await?;
    let params = clean("Edit work order", &data)?;
    state.db.update_work_order(order.id, &params).await?;

    info!("Work order updated");
    flash_redirect(
        &state,
        &session,
        FlashLevel::Success,
        "Work order updated successfully.",
        LIST_PATH,
    )
    .await
}

/// `GET /workorders/delete/{id}/`
pub async fn delete_confirm(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<ConfirmView<WorkOrder>>, AppError> {
    let order = load(&state, &session, id, Action::Delete).await?;
    Ok(Json(ConfirmView {
        title: format!("Delete work order {}", order.name),
        record: order,
    }))
}

/// `POST /workorders/delete/{id}/`
///
/// Links and numbers referencing the order are detached, not deleted.
#[instrument(skip_all, fields(account_id = session.account.id, work_order_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    let order = load(&state, &session, id, Action::Delete).await?;
    state.db.delete_work_order(order.id).await?;

    info!("Work order deleted");
    flash_redirect(
        &state,
        &session,
        FlashLevel::Success,
        "Work order deleted successfully.",
        LIST_PATH,
    )
    .await
}
