//! Diverted traffic log and divert rules.

use axum::Form;
use axum::Json;
use axum::extract::{Query, State};
use axum::response::Response;
use tracing::{info, instrument};

use super::{ChangeList, split};
use crate::forms::diversion::{self as diversion_form, PROCESSED_BY, RULE_FORM, TRAFFIC_FORM};
use crate::forms::{ChoiceOptions, FormData, FormErrors, FormView};
use crate::listing::{ADMIN_PAGE_SIZE, AdminQuery, Page, Paginator};
use crate::server::AppState;
use crate::server::error::AppError;
use crate::server::references;
use crate::server::respond::{RecordId, flash_redirect};
use crate::server::session::AuthSession;
use crate::storage::{
    Condition, DivertRule, DivertedTraffic, FlashLevel, ListFilter, RuleParams, TrafficParams,
};

const TRAFFIC_PATH: &str = "/admin/diversion/traffic/";
const RULES_PATH: &str = "/admin/diversion/rules/";

// =========================================================================
// Traffic
// =========================================================================

fn traffic_view(title: &str, values: &FormData, errors: &FormErrors) -> FormView {
    TRAFFIC_FORM.render(title, values, errors, &ChoiceOptions::new())
}

/// Clean a traffic submission; `processed_by` must name an existing account.
async fn clean_traffic(
    state: &AppState,
    title: &str,
    data: &FormData,
) -> Result<TrafficParams, AppError> {
    let (cleaned, mut errors) = split(TRAFFIC_FORM.clean(data));

    let mut params = None;
    if let Some(cleaned) = &cleaned {
        let p = diversion_form::traffic_params(cleaned);
        references::check_account(&state.db, p.processed_by, PROCESSED_BY.name, &mut errors)
            .await?;
        params = Some(p);
    }

    match params {
        Some(p) if errors.is_empty() => Ok(p),
        _ => Err(traffic_view(title, data, &errors).into()),
    }
}

/// `GET /admin/diversion/traffic/`
///
/// `status` matches the free-text traffic status exactly. `from`/`to` bound
/// the timestamp.
pub async fn list_traffic(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ChangeList<DivertedTraffic>>, AppError> {
    session.require_staff()?;
    let (date_from, date_to) = query.date_range().map_err(AppError::BadRequest)?;
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Condition::TextStatus(s.to_string()));
    let processed_by = query.processed_by_filter().map_err(AppError::BadRequest)?;
    let filter = ListFilter {
        date_from,
        date_to,
        ..ListFilter::default()
    }
    .search(query.q.as_deref())
    .with(status)
    .with(processed_by.map(Condition::ProcessedBy));

    let paginator = Paginator::new(state.db.count_traffic(&filter).await?, ADMIN_PAGE_SIZE);
    let window = paginator.window(query.page.as_deref());
    let rows = state
        .db
        .list_traffic(&filter, window.limit, window.offset)
        .await?;
    let page = Page::new(rows, window, &paginator);
    Ok(Json(
        ChangeList::new(&state, &session, "Diverted traffic", query.q, page).await?,
    ))
}

/// `GET /admin/diversion/traffic/{id}/`
pub async fn traffic_detail(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<DivertedTraffic>, AppError> {
    session.require_staff()?;
    Ok(Json(state.db.get_traffic(id).await?))
}

/// `GET /admin/diversion/traffic/add/`
pub async fn add_traffic_form(session: AuthSession) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    Ok(Json(traffic_view(
        "Add diverted traffic",
        &FormData::new(),
        &FormErrors::default(),
    )))
}

/// `POST /admin/diversion/traffic/add/`
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add_traffic(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let params = clean_traffic(&state, "Add diverted traffic", &data).await?;
    let record = state.db.record_traffic(&params).await?;
    info!(traffic_id = record.id, source_ip = %record.source_ip, "Traffic recorded");
    let message = format!(
        "The diverted traffic record from {} was added successfully.",
        record.source_ip
    );
    flash_redirect(&state, &session, FlashLevel::Success, &message, TRAFFIC_PATH).await
}

/// `GET /admin/diversion/traffic/{id}/edit/`
pub async fn edit_traffic_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    let record = state.db.get_traffic(id).await?;
    Ok(Json(traffic_view(
        "Change diverted traffic",
        &diversion_form::traffic_initial(&record),
        &FormErrors::default(),
    )))
}

/// `POST /admin/diversion/traffic/{id}/edit/`
#[instrument(skip_all, fields(account_id = session.account.id, traffic_id = id))]
pub async fn edit_traffic(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let record = state.db.get_traffic(id).await?;
    let params = clean_traffic(&state, "Change diverted traffic", &data).await?;
    let updated = state.db.update_traffic(record.id, &params).await?;

    info!(status = %updated.status, "Traffic record changed");
    let message = format!(
        "The diverted traffic record from {} was changed successfully.",
        updated.source_ip
    );
    flash_redirect(&state, &session, FlashLevel::Success, &message, TRAFFIC_PATH).await
}

/// `POST /admin/diversion/traffic/{id}/delete/`
#[instrument(skip_all, fields(account_id = session.account.id, traffic_id = id))]
pub async fn delete_traffic(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let record = state.db.get_traffic(id).await?;
    state.db.delete_traffic(record.id).await?;

    info!("Traffic record deleted");
    let message = format!(
        "The diverted traffic record from {} was deleted successfully.",
        record.source_ip
    );
    flash_redirect(&state, &session, FlashLevel::Success, &message, TRAFFIC_PATH).await
}

// =========================================================================
// Rules
// =========================================================================

fn rule_view(title: &str, values: &FormData, errors: &FormErrors) -> FormView {
    RULE_FORM.render(title, values, errors, &ChoiceOptions::new())
}

fn clean_rule(title: &str, data: &FormData) -> Result<RuleParams, AppError> {
    RULE_FORM
        .clean(data)
        .map(|cleaned| diversion_form::rule_params(&cleaned))
        .map_err(|errors| rule_view(title, data, &errors).into())
}

/// `GET /admin/diversion/rules/`
///
/// Ordered by priority, highest first.
pub async fn list_rules(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ChangeList<DivertRule>>, AppError> {
    session.require_staff()?;
    let active = query.active_filter().map_err(AppError::BadRequest)?;
    let created_by = query.created_by_filter().map_err(AppError::BadRequest)?;
    let (date_from, date_to) = query.date_range().map_err(AppError::BadRequest)?;
    let filter = ListFilter {
        date_from,
        date_to,
        ..ListFilter::default()
    }
    .search(query.q.as_deref())
    .with(active.map(Condition::Active))
    .with(created_by.map(Condition::CreatedBy));

    let paginator = Paginator::new(state.db.count_rules(&filter).await?, ADMIN_PAGE_SIZE);
    let window = paginator.window(query.page.as_deref());
    let rows = state
        .db
        .list_rules(&filter, window.limit, window.offset)
        .await?;
    let page = Page::new(rows, window, &paginator);
    Ok(Json(
        ChangeList::new(&state, &session, "Divert rules", query.q, page).await?,
    ))
}

/// `GET /admin/diversion/rules/add/`
pub async fn add_rule_form(session: AuthSession) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    Ok(Json(rule_view(
        "Add divert rule",
        &FormData::new(),
        &FormErrors::default(),
    )))
}

/// `POST /admin/diversion/rules/add/`
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add_rule(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let params = clean_rule("Add divert rule", &data)?;
    let rule = state
        .db
        .create_rule(&params, Some(session.account.id))
        .await?;

    info!(rule_id = rule.id, priority = rule.priority, "Divert rule added");
    let message = format!("The divert rule \"{}\" was added successfully.", rule.name);
    flash_redirect(&state, &session, FlashLevel::Success, &message, RULES_PATH).await
}

/// `GET /admin/diversion/rules/{id}/edit/`
pub async fn edit_rule_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    session.require_staff()?;
    let rule = state.db.get_rule(id).await?;
    Ok(Json(rule_view(
        "Change divert rule",
        &diversion_form::rule_initial(&rule),
        &FormErrors::default(),
    )))
}

/// `POST /admin/diversion/rules/{id}/edit/`
#[instrument(skip_all, fields(account_id = session.account.id, rule_id = id))]
pub async fn edit_rule(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let rule = state.db.get_rule(id).await?;
    let params = clean_rule("Change divert rule", &data)?;
    let updated = state.db.update_rule(rule.id, &params).await?;

    info!(
        priority = updated.priority,
        is_active = updated.is_active,
        "Divert rule changed"
    );
    let message = format!(
        "The divert rule \"{}\" was changed successfully.",
        updated.name
    );
    flash_redirect(&state, &session, FlashLevel::Success, &message, RULES_PATH).await
}

/// `POST /admin/diversion/rules/{id}/delete/`
#[instrument(skip_all, fields(account_id = session.account.id, rule_id = id))]
pub async fn delete_rule(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    session.require_staff()?;
    let rule = state.db.get_rule(id).await?;
    state.db.delete_rule(rule.id).await?;

    info!("Divert rule deleted");
    let message = format!("The divert rule \"{}\" was deleted successfully.", rule.name);
    flash_redirect(&state, &session, FlashLevel::Success, &message, RULES_PATH).await
}
