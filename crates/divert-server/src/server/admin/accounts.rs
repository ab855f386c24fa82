//! Account administration. Superusers only.

use axum::Form;
use axum::Json;
use axum::extract::{Query, State};
use axum::response::Response;
use tracing::{info, instrument};

use super::{ChangeList, split};
use crate::accounts::{self, AccountError};
use crate::auth::password::{hash_password, validate_password};
use crate::forms::account::{
    self as account_form, ACCOUNT_ADD_FORM, ACCOUNT_EDIT_FORM, IS_STAFF, IS_SUPERUSER, NAME,
    NEW_PASSWORD,
};
use crate::forms::{ChoiceOptions, FormData, FormErrors, FormView, REQUIRED};
use crate::listing::{ADMIN_PAGE_SIZE, AdminQuery, Page, Paginator};
use crate::server::AppState;
use crate::server::error::AppError;
use crate::server::respond::{RecordId, flash_redirect};
use crate::server::session::AuthSession;
use crate::storage::{Account, AccountSummary, Condition, FlashLevel, ListFilter};

const LIST_PATH: &str = "/admin/accounts/";

fn form_view(title: &str, edit: bool, values: &FormData, errors: &FormErrors) -> FormView {
    let spec = if edit {
        &ACCOUNT_EDIT_FORM
    } else {
        &ACCOUNT_ADD_FORM
    };
    spec.render(title, values, errors, &ChoiceOptions::new())
}

/// `GET /admin/accounts/`
///
/// `from`/`to` bound the creation date, `end_from`/`end_to` the expiry.
pub async fn list(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ChangeList<AccountSummary>>, AppError> {
    session.require_superuser()?;
    let level = query.level_filter().map_err(AppError::BadRequest)?;
    let active = query.active_filter().map_err(AppError::BadRequest)?;
    let staff = query.staff_filter().map_err(AppError::BadRequest)?;
    let (date_from, date_to) = query.date_range().map_err(AppError::BadRequest)?;
    let (end_from, end_to) = query.end_range().map_err(AppError::BadRequest)?;
    let filter = ListFilter {
        date_from,
        date_to,
        end_from,
        end_to,
        ..ListFilter::default()
    }
    .search(query.q.as_deref())
    .with(level.map(Condition::Level))
    .with(active.map(Condition::Active))
    .with(staff.map(Condition::Staff));

    let paginator = Paginator::new(state.db.count_accounts(&filter).await?, ADMIN_PAGE_SIZE);
    let window = paginator.window(query.page.as_deref());
    let rows: Vec<AccountSummary> = state
        .db
        .list_accounts(&filter, window.limit, window.offset)
        .await?
        .iter()
        .map(Account::summary)
        .collect();
    let page = Page::new(rows, window, &paginator);
    Ok(Json(
        ChangeList::new(&state, &session, "Accounts", query.q, page).await?,
    ))
}

/// `GET /admin/accounts/add/`
pub async fn add_form(session: AuthSession) -> Result<Json<FormView>, AppError> {
    session.require_superuser()?;
    Ok(Json(form_view(
        "Add account",
        false,
        &FormData::new(),
        &FormErrors::default(),
    )))
}

/// `POST /admin/accounts/add/`
///
/// Only the name and password are asked for up front; permissions are set
/// on the edit page afterwards.
#[instrument(skip_all, fields(account_id = session.account.id))]
pub async fn add(
    State(state): State<AppState>,
    session: AuthSession,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_superuser()?;
    let (cleaned, mut errors) = split(ACCOUNT_ADD_FORM.clean(&data));

    let mut created = None;
    if let Some(cleaned) = &cleaned {
        account_form::check_new_password(cleaned, &mut errors);
        if errors.is_empty() {
            match accounts::create_account(&state.db, account_form::new_account(cleaned)).await {
                Ok(account) => created = Some(account),
                Err(AccountError::NameTaken(_)) => {
                    errors.add(NAME.name, "An account with that name already exists.");
                }
                Err(AccountError::NameRequired) => errors.add(NAME.name, REQUIRED),
                Err(AccountError::Database(e)) => return Err(e.into()),
                Err(e) => return Err(AppError::Internal(e.to_string())),
            }
        }
    }

    let Some(account) = created else {
        return Err(form_view("Add account", false, &data, &errors).into());
    };

    info!(new_account_id = account.id, "Account added from admin");
    let message = format!("The account \"{}\" was added successfully.", account.name);
    let to = format!("/admin/accounts/{}/edit/", account.id);
    flash_redirect(&state, &session, FlashLevel::Success, &message, &to).await
}

/// `GET /admin/accounts/{id}/edit/`
pub async fn edit_form(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Json<FormView>, AppError> {
    session.require_superuser()?;
    let account = state.db.get_account(id).await?;
    Ok(Json(form_view(
        &format!("Change account {}", account.name),
        true,
        &account_form::initial(&account),
        &FormErrors::default(),
    )))
}

/// `POST /admin/accounts/{id}/edit/`
#[instrument(skip_all, fields(account_id = session.account.id, target_id = id))]
pub async fn edit(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    session.require_superuser()?;
    let account = state.db.get_account(id).await?;
    let title = format!("Change account {}", account.name);
    let (cleaned, mut errors) = split(ACCOUNT_EDIT_FORM.clean(&data));

    let Some(cleaned) = cleaned else {
        return Err(form_view(&title, true, &data, &errors).into());
    };

    let new_password = cleaned.opt_text(NEW_PASSWORD.name);
    if let Some(pw) = &new_password {
        if let Err(msg) = validate_password(pw) {
            errors.add(NEW_PASSWORD.name, msg);
        }
    }
    if cleaned.boolean(IS_SUPERUSER.name) && !cleaned.boolean(IS_STAFF.name) {
        errors.add(IS_STAFF.name, "A superuser must also be staff.");
    }
    if !errors.is_empty() {
        return Err(form_view(&title, true, &data, &errors).into());
    }

    let update = account_form::update(&cleaned, &account);
    let updated = state.db.update_account(account.id, &update).await?;
    if let Some(pw) = new_password {
        let hash = hash_password(&pw).map_err(|e| AppError::Internal(e.to_string()))?;
        state.db.set_password_hash(account.id, &hash).await?;
        info!("Password changed from admin");
    }

    info!(
        is_active = updated.is_active,
        is_staff = updated.is_staff,
        is_superuser = updated.is_superuser,
        "Account changed from admin"
    );
    let message = format!("The account \"{}\" was changed successfully.", updated.name);
    flash_redirect(&state, &session, FlashLevel::Success, &message, LIST_PATH).await
}

/// `POST /admin/accounts/{id}/delete/`
///
/// Owned work orders, links and numbers go with the account.
#[instrument(skip_all, fields(account_id = session.account.id, target_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    session: AuthSession,
    RecordId(id): RecordId,
) -> Result<Response, AppError> {
    session.require_superuser()?;
    if id == session.account.id {
        return Err(AppError::BadRequest(
            "You cannot delete the account you are logged in with.".into(),
        ));
    }
    let account = state.db.get_account(id).await?;
    state.db.delete_account(account.id).await?;

    info!("Account deleted from admin");
    let message = format!("The account \"{}\" was deleted successfully.", account.name);
    flash_redirect(&state, &session, FlashLevel::Success, &message, LIST_PATH).await
}
