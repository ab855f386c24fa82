//! Admin changelists for links, work orders and numbers.

use axum::Form;
use axum::Json;
use axum::extract::{Query, State};
use axum::response::Response;
use tracing::{info, instrument};

use super::{ChangeList, in_scope, split};
use crate::access::admin_scope;
use crate::forms::admin::{
    ADMIN_LINK_FORM, ADMIN_NUMBER_FORM, ADMIN_WORK_ORDER_FORM, OWNER, STATUS_FORM, with_owner,
};
use crate::forms::{
    ChoiceOptions, Cleaned, FormData, FormErrors, FormSpec, FormView, REQUIRED, link as link_form,
    number as number_form, work_order as work_order_form,
};
use crate::listing::{ADMIN_PAGE_SIZE, AdminQuery, Page, Paginator};
use crate::server::AppState;
use crate::server::error::AppError;
use crate::server::links::IDENTIFIER_TAKEN;
use crate::server::references;
use crate::server::respond::{RecordId, flash_redirect};
use crate::server::session::AuthSession;
use crate::storage::{
    Account, Condition, DatabaseError, FlashLevel, Link, LinkParams, ListFilter, Number,
    NumberParams, WorkOrder, WorkOrderParams,
};

const LINKS_PATH: &str = "/admin/links/";
const WORK_ORDERS_PATH: &str = "/admin/workorders/";
const NUMBERS_PATH: &str = "/admin/numbers/";

/// Owner scope, search (including owner name), status and date range.
fn base_filter(actor: &Account, query: &AdminQuery) -> Result<ListFilter, AppError> {
    let status = query.status_filter().map_err(AppError::BadRequest)?;
    let (date_from, date_to) = query.date_range().map_err(AppError::BadRequest)?;
    Ok(ListFilter {
        owner_id: admin_scope(actor),
        search_owner_name: true,
        date_from,
        date_to,
        ..ListFilter::default()
    }
    .search(query.q.as_deref())
    .with(status.map(Condition::Status)))
}

/// Non-superusers pick references from their own rows; superusers type IDs.
async fn options_for(
    state: &AppState,
    actor: &Account,
    spec: &FormSpec,
) -> Result<ChoiceOptions, AppError> {
    let mut options = ChoiceOptions::new();
    if actor.is_superuser {
        return Ok(options);
    }
    for field in spec.fields {
        match field.name {
            "work_order" => {
                options.insert(
                    field.name,
                    references::work_order_options(&state.db, actor.id).await?,
                );
            }
            "link" => {
                options.insert(
                    field.name,
                    references::link_options(&state.db, actor.id).await?,
                );
            }
            _ => {}
        }
    }
    Ok(options)
}

async fn form_view(
    state: &AppState,
    actor: &Account,
    spec: &FormSpec,
    title: &str,
    values: &FormData,
    errors: &FormErrors,
) -> Result<FormView, AppError> {
    let options = options_for(state, actor, spec).await?;
    Ok(spec.render(title, values, errors, &options))
}

/// Superusers must name an existing owner; everyone else owns what they add.
async fn resolve_owner(
    state: &AppState,
    actor: &Account,
    cleaned: &Cleaned,
    errors: &mut FormErrors,
) -> Result<i64, AppError> {
    if !actor.is_superuser {
        return Ok(actor.id);
    }
    let owner = cleaned.reference(OWNER.name);
    if owner.is_none() {
        errors.add(OWNER.name, REQUIRED);
    }
    references::check_account(&state.db, owner, OWNER.name, errors).await?;
    Ok(owner.unwrap_or_default())
}

fn status_value(data: &FormData) -> Result<i64, AppError> {
    STATUS_FORM
        .clean(data)
        .map(|cleaned| cleaned.int("status"))
        .map_err(|errors| {
            STATUS_FORM
                .render("Change status", data, &errors, &ChoiceOptions::new())
                .into()
        })
}

// =========================================================================
// Links
// =========================================================================

/// Owner and params of a link submission, with every check applied.
/// `editing` excludes the link itself from the identifier check.
async fn clean_link(
    state: &AppState,
    actor: &Account,
    data: &FormData,
    editing: Option<i64>,
) -> Result<(Option<(i64, LinkParams)>, FormErrors), AppError> {
    let (cleaned, mut errors) = split(ADMIN_LINK_FORM.clean(data));
    let Some(cleaned) = cleaned else {
        return Ok((None, errors));
    };

    let owner = resolve_owner(state, actor, &cleaned, &mut errors).await?;
    let params = link_form::params(&cleaned);
    references::check_work_order(
        &state.db,
        params.work_order_id,
        admin_scope(actor),
        link_form::WORK_ORDER.name,
        &mut errors,
    )
    .await?;
    if state
        .db
        .link_identifier_taken(&params.identifier, editing)
        .await?
    {
        errors.add(link_form::IDENTIFIER.name, IDENTIFIER_TAKEN);
    }
    Ok((Some((owner, params)), errors))
}

/// `GET /admin/links/`
pub async fn list_links(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ChangeList<Link>>, AppError> {
    session.require_staff()?;
    let filter = base_filter(&session.account, &query)?
        .with(query.country_filter().map(Condition::Country));

    let paginator = Paginator::new(state.db.count_links(&filter).await?, ADMIN_PAGE_SIZE);
    let window = paginator.window(query.page.as_deref());
    let rows = state
        .db
        .list_links(&filter, window.limit, window.offset)
        .await?;
    let page = Page::new(rows, window, &paginator);
    Ok(Json(
        ChangeList::new(&state, &session, "Links", query.q, page).await?,
    ))
}

/// `GET /admin/links/add/`
pub async fn add_link_form(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    let view = form_view(
        &state,
        &session.account,
        &ADMIN_LINK_FORM,
        "Add link",
        &FormData::new(),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /admin/links/add/`
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add_link(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let actor = &session.account;
    let (submitted, mut errors) = clean_link(&state, actor, &data, None).await?;

    let mut created = None;
    if let Some((owner, params)) = submitted {
        if errors.is_empty() {
            match state.db.create_link(owner, &params).await {
                Ok(link) => created = Some(link),
                Err(DatabaseError::Conflict(_)) => {
                    errors.add(link_form::IDENTIFIER.name, IDENTIFIER_TAKEN);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    let Some(link) = created else {
        return Err(form_view(&state, actor, &ADMIN_LINK_FORM, "Add link", &data, &errors)
            .await?
            .into());
    };

    info!(link_id = link.id, owner_id = link.owner_id, "Link added from admin");
    let message = format!("The link \"{}\" was added successfully.", link.identifier);
    flash_redirect(&state, &session, FlashLevel::Success, &message, LINKS_PATH).await
}

/// `GET /admin/links/{id}/edit/`
pub async fn edit_link_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    let link = in_scope(&session.account, state.db.get_link(id).await?)?;
    let view = form_view(
        &state,
        &session.account,
        &ADMIN_LINK_FORM,
        "Change link",
        &with_owner(link_form::initial(&link), link.owner_id),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /admin/links/{id}/edit/`
///
/// Superusers may hand the link to another account.
#[instrument(skip_all, fields(account_id = session.account.id, link_id = id))]
pub async fn edit_link(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let actor = &session.account;
    let link = in_scope(actor, state.db.get_link(id).await?)?;
    let (submitted, mut errors) = clean_link(&state, actor, &data, Some(link.id)).await?;

    let mut updated = None;
    if let Some((owner, params)) = submitted {
        if errors.is_empty() {
            match state.db.update_link_with_owner(link.id, owner, &params).await {
                Ok(link) => updated = Some(link),
                Err(DatabaseError::Conflict(_)) => {
                    errors.add(link_form::IDENTIFIER.name, IDENTIFIER_TAKEN);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    let Some(updated) = updated else {
        return Err(
            form_view(&state, actor, &ADMIN_LINK_FORM, "Change link", &data, &errors)
                .await?
                .into(),
        );
    };

    info!(owner_id = updated.owner_id, "Link changed from admin");
    let message = format!("The link \"{}\" was changed successfully.", updated.identifier);
    flash_redirect(&state, &session, FlashLevel::Success, &message, LINKS_PATH).await
}

/// `POST /admin/links/{id}/status/`
#[instrument(skip_all, fields(account_id = session.account.id, link_id = id))]
pub async fn link_status(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let link = in_scope(&session.account, state.db.get_link(id).await?)?;
    let status = status_value(&data)?;
    state.db.set_link_status(link.id, status).await?;

    info!(status, "Link status changed from admin");
    let message = format!("The link \"{}\" was changed successfully.", link.identifier);
    flash_redirect(&state, &session, FlashLevel::Success, &message, LINKS_PATH).await
}

/// `POST /admin/links/{id}/delete/`
#[instrument(skip_all, fields(account_id = session.account.id, link_id = id))]
pub async fn delete_link(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let link = in_scope(&session.account, state.db.get_link(id).await?)?;
    state.db.delete_link(link.id).await?;

    info!("Link deleted from admin");
    let message = format!("The link \"{}\" was deleted successfully.", link.identifier);
    flash_redirect(&state, &session, FlashLevel::Success, &message, LINKS_PATH).await
}

// =========================================================================
// Work orders
// =========================================================================

async fn clean_work_order(
    state: &AppState,
    actor: &Account,
    data: &FormData,
) -> Result<Result<(i64, WorkOrderParams), FormErrors>, AppError> {
    let (cleaned, mut errors) = split(ADMIN_WORK_ORDER_FORM.clean(data));
    let Some(cleaned) = cleaned else {
        return Ok(Err(errors));
    };
    let owner = resolve_owner(state, actor, &cleaned, &mut errors).await?;
    if !errors.is_empty() {
        return Ok(Err(errors));
    }
    Ok(Ok((owner, work_order_form::params(&cleaned))))
}

/// `GET /admin/workorders/`
///
/// `from`/`to` bound the start time, `end_from`/`end_to` the end time.
pub async fn list_work_orders(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ChangeList<WorkOrder>>, AppError> {
    session.require_staff()?;
    let kind = query.kind_filter().map_err(AppError::BadRequest)?;
    let (end_from, end_to) = query.end_range().map_err(AppError::BadRequest)?;
    let filter = ListFilter {
        end_from,
        end_to,
        ..base_filter(&session.account, &query)?
    }
    .with(kind.map(Condition::Kind));

    let paginator = Paginator::new(
        state.db.count_work_orders(&filter).await?,
        ADMIN_PAGE_SIZE,
    );
    let window = paginator.window(query.page.as_deref());
    let rows = state
        .db
        .list_work_orders(&filter, window.limit, window.offset)
        .await?;
    let page = Page::new(rows, window, &paginator);
    Ok(Json(
        ChangeList::new(&state, &session, "Work orders", query.q, page).await?,
    ))
}

/// `GET /admin/workorders/add/`
pub async fn add_work_order_form(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    let view = form_view(
        &state,
        &session.account,
        &ADMIN_WORK_ORDER_FORM,
        "Add work order",
        &FormData::new(),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /admin/workorders/add/`
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add_work_order(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let actor = &session.account;
    let (owner, params) = match clean_work_order(&state, actor, &data).await? {
        Ok(submitted) => submitted,
        Err(errors) => {
            return Err(form_view(
                &state,
                actor,
                &ADMIN_WORK_ORDER_FORM,
                "Add work order",
                &data,
                &errors,
            )
            .await?
            .into());
        }
    };
    let order = state.db.create_work_order(owner, &params).await?;

    info!(work_order_id = order.id, owner_id = order.owner_id, "Work order added from admin");
    let message = format!("The work order \"{}\" was added successfully.", order.name);
    flash_redirect(&state, &session, FlashLevel::Success, &message, WORK_ORDERS_PATH).await
}

/// `GET /admin/workorders/{id}/edit/`
pub async fn edit_work_order_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    let order = in_scope(&session.account, state.db.get_work_order(id).await?)?;
    let view = form_view(
        &state,
        &session.account,
        &ADMIN_WORK_ORDER_FORM,
        "Change work order",
        &with_owner(work_order_form::initial(&order), order.owner_id),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /admin/workorders/{id}/edit/`
#[instrument(skip_all, fields(account_id = session.account.id, work_order_id = id))]
pub async fn edit_work_order(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let actor = &session.account;
    let order = in_scope(actor, state.db.get_work_order(id).await?)?;
    let (owner, params) = match clean_work_order(&state, actor, &data).await? {
        Ok(submitted) => submitted,
        Err(errors) => {
            return Err(form_view(
                &state,
                actor,
                &ADMIN_WORK_ORDER_FORM,
                "Change work order",
                &data,
                &errors,
            )
            .await?
            .into());
        }
    };
    let updated = state
        .db
        .update_work_order_with_owner(order.id, owner, &params)
        .await?;

    info!(owner_id = updated.owner_id, "Work order changed from admin");
    let message = format!("The work order \"{}\" was changed successfully.", updated.name);
    flash_redirect(&state, &session, FlashLevel::Success, &message, WORK_ORDERS_PATH).await
}

/// `POST /admin/workorders/{id}/status/`
#[instrument(skip_all, fields(account_id = session.account.id, work_order_id = id))]
pub async fn work_order_status(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let order = in_scope(&session.account, state.db.get_work_order(id).await?)?;
    let status = status_value(&data)?;
    state.db.set_work_order_status(order.id, status).await?;

    info!(status, "Work order status changed from admin");
    let message = format!("The work order \"{}\" was changed successfully.", order.name);
    flash_redirect(&state, &session, FlashLevel::Success, &message, WORK_ORDERS_PATH).await
}

/// `POST /admin/workorders/{id}/delete/`
#[instrument(skip_all, fields(account_id = session.account.id, work_order_id = id))]
pub async fn delete_work_order(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let order = in_scope(&session.account, state.db.get_work_order(id).await?)?;
    state.db.delete_work_order(order.id).await?;

    info!("Work order deleted from admin");
    let message = format!("The work order \"{}\" was deleted successfully.", order.name);
    flash_redirect(&state, &session, FlashLevel::Success, &message, WORK_ORDERS_PATH).await
}

// =========================================================================
// Numbers
// =========================================================================

async fn clean_number(
    state: &AppState,
    actor: &Account,
    data: &FormData,
) -> Result<Result<(i64, NumberParams), FormErrors>, AppError> {
    let (cleaned, mut errors) = split(ADMIN_NUMBER_FORM.clean(data));
    let Some(cleaned) = cleaned else {
        return Ok(Err(errors));
    };

    let owner = resolve_owner(state, actor, &cleaned, &mut errors).await?;
    let params = number_form::params(&cleaned);
    let scope = admin_scope(actor);
    references::check_work_order(
        &state.db,
        params.work_order_id,
        scope,
        number_form::WORK_ORDER.name,
        &mut errors,
    )
    .await?;
    references::check_link(
        &state.db,
        params.link_id,
        scope,
        number_form::LINK.name,
        &mut errors,
    )
    .await?;

    if !errors.is_empty() {
        return Ok(Err(errors));
    }
    Ok(Ok((owner, params)))
}

/// `GET /admin/numbers/`
pub async fn list_numbers(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ChangeList<Number>>, AppError> {
    session.require_staff()?;
    let kind = query.kind_filter().map_err(AppError::BadRequest)?;
    let filter = base_filter(&session.account, &query)?.with(kind.map(Condition::Kind));

    let paginator = Paginator::new(state.db.count_numbers(&filter).await?, ADMIN_PAGE_SIZE);
    let window = paginator.window(query.page.as_deref());
    let rows = state
        .db
        .list_numbers(&filter, window.limit, window.offset)
        .await?;
    let page = Page::new(rows, window, &paginator);
    Ok(Json(
        ChangeList::new(&state, &session, "Numbers", query.q, page).await?,
    ))
}

/// `GET /admin/numbers/add/`
pub async fn add_number_form(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    let view = form_view(
        &state,
        &session.account,
        &ADMIN_NUMBER_FORM,
        "Add number",
        &FormData::new(),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /admin/numbers/add/`
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add_number(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let actor = &session.account;
    let (owner, params) = match clean_number(&state, actor, &data).await? {
        Ok(submitted) => submitted,
        Err(errors) => {
            return Err(form_view(
                &state,
                actor,
                &ADMIN_NUMBER_FORM,
                "Add number",
                &data,
                &errors,
            )
            .await?
            .into());
        }
    };
    let number = state.db.create_number(owner, &params).await?;

    info!(number_id = number.id, owner_id = number.owner_id, "Number added from admin");
    let message = format!("The number \"{}\" was added successfully.", number.num);
    flash_redirect(&state, &session, FlashLevel::Success, &message, NUMBERS_PATH).await
}

/// `GET /admin/numbers/{id}/edit/`
pub async fn edit_number_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    let number = in_scope(&session.account, state.db.get_number(id).await?)?;
    let view = form_view(
        &state,
        &session.account,
        &ADMIN_NUMBER_FORM,
        "Change number",
        &with_owner(number_form::initial(&number), number.owner_id),
        &FormErrors::default(),
    )
    .await?;
    Ok(Json(view))
}

/// `POST /admin/numbers/{id}/edit/`
#[instrument(skip_all, fields(account_id = session.account.id, number_id = id))]
pub async fn edit_number(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let actor = &session.account;
    let number = in_scope(actor, state.db.get_number(id).await?)?;
    let (owner, params) = match clean_number(&state, actor, &data).await? {
        Ok(submitted) => submitted,
        Err(errors) => {
            return Err(form_view(
                &state,
                actor,
                &ADMIN_NUMBER_FORM,
                "Change number",
                &data,
                &errors,
            )
            .await?
            .into());
        }
    };
    let updated = state
        .db
        .update_number_with_owner(number.id, owner, &params)
        .await?;

    info!(owner_id = updated.owner_id, "Number changed from admin");
    let message = format!("The number \"{}\" was changed successfully.", updated.num);
    flash_redirect(&state, &session, FlashLevel::Success, &message, NUMBERS_PATH).await
}

/// `POST /admin/numbers/{id}/status/`
#[instrument(skip_all, fields(account_id = session.account.id, number_id = id))]
pub async fn number_status(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let number = in_scope(&session.account, state.db.get_number(id).await?)?;
    let status = status_value(&data)?;
    state.db.set_number_status(number.id, status).await?;

    info!(status, "Number status changed from admin");
    let message = format!("The number \"{}\" was changed successfully.", number.num);
    flash_redirect(&state, &session, FlashLevel::Success, &message, NUMBERS_PATH).await
}

/// `POST /admin/numbers/{id}/delete/`
#[instrument(skip_all, fields(account_id = session.account.id, number_id = id))]
pub async fn delete_number(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let number = in_scope(&session.account, state.db.get_number(id).await?)?;
    state.db.delete_number(number.id).await?;

    info!("Number deleted from admin");
    let message = format!("The number \"{}\" was deleted successfully.", number.num);
    flash_redirect(&state, &session, FlashLevel::Success, &message, NUMBERS_PATH).await
}
