//! Login and logout.

use axum::Form;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::AppState;
use super::error::AppError;
use super::session::{MaybeSession, removal_cookie, session_cookie};
use crate::auth::JwtManager;
use crate::auth::password::verify_password;
use crate::forms::login::{INVALID_LOGIN, LOGIN_FORM, PASSWORD, USERNAME};
use crate::forms::{ChoiceOptions, FormData, FormErrors, FormView};
use crate::storage::DatabaseError;

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

fn login_view(values: &FormData, errors: &FormErrors) -> FormView {
    LOGIN_FORM.render("Log in", values, errors, &ChoiceOptions::new())
}

/// `GET /login/`
pub async fn login_form(
    MaybeSession(session): MaybeSession,
    Query(query): Query<NextQuery>,
) -> Response {
    if session.is_some() {
        return Redirect::to(safe_next(query.next.as_deref())).into_response();
    }
    Json(login_view(&FormData::new(), &FormErrors::default())).into_response()
}

/// `POST /login/`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<NextQuery>,
    Form(data): Form<FormData>,
) -> Result<Response, AppError> {
    let next = safe_next(query.next.as_deref());
    if session.is_some() {
        return Ok(Redirect::to(next).into_response());
    }

    let cleaned = LOGIN_FORM
        .clean(&data)
        .map_err(|errors| login_view(&data, &errors))?;
    let name = cleaned.text(USERNAME.name);
    let password = cleaned.text(PASSWORD.name);

    let account = match state.db.get_account_by_name(&name).await {
        Ok(account) => Some(account),
        Err(DatabaseError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };
    let account = account.filter(|a| {
        a.is_active && verify_password(&password, &a.password_hash).unwrap_or(false)
    });
    let Some(account) = account else {
        warn!(name = %name, "Failed login attempt");
        let mut errors = FormErrors::default();
        errors.add_non_field(INVALID_LOGIN);
        return Err(login_view(&data, &errors).into());
    };

    let issued = state
        .jwt
        .issue(account.id, &account.name)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;
    state
        .db
        .create_session(
            &issued.session_id,
            account.id,
            &JwtManager::hash_token(&issued.token),
            issued.expires_at,
        )
        .await?;
    state.db.record_login(account.id).await?;

    info!(account_id = account.id, name = %account.name, "Logged in");
    Ok((
        [(SET_COOKIE, session_cookie(&issued.token, state.session_ttl_secs))],
        Redirect::to(next),
    )
        .into_response())
}

/// `GET|POST /logout/`
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Response, AppError> {
    if let Some(session) = session {
        state.db.revoke_session(&session.session_id).await?;
        info!(account_id = session.account.id, "Logged out");
    }
    Ok(([(SET_COOKIE, removal_cookie())], Redirect::to("/login/")).into_response())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/links/?page=2")), "/links/?page=2");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
