//! Session resolution: cookie or bearer token to acting account.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use cookie::{Cookie, SameSite};
use tracing::debug;

use super::AppState;
use super::error::AppError;
use crate::auth::JwtManager;
use crate::storage::{Account, DatabaseError, FlashLevel, FlashMessage};

pub const SESSION_COOKIE: &str = "divert_session";

/// The authenticated account behind a request.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account: Account,
    pub session_id: String,
}

impl AuthSession {
    /// Queue a message for the next page this session renders.
    pub async fn flash(
        &self,
        state: &AppState,
        level: FlashLevel,
        message: &str,
    ) -> Result<(), AppError> {
        state
            .db
            .push_flash(&self.session_id, level, message)
            .await?;
        Ok(())
    }

    pub async fn messages(&self, state: &AppState) -> Result<Vec<FlashMessage>, AppError> {
        Ok(state.db.take_flashes(&self.session_id).await?)
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.account.is_staff || self.account.is_superuser {
            Ok(())
        } else {
            Err(AppError::Forbidden("Staff access required.".into()))
        }
    }

    pub fn require_superuser(&self) -> Result<(), AppError> {
        if self.account.is_superuser {
            Ok(())
        } else {
            Err(AppError::Forbidden("Superuser access required.".into()))
        }
    }
}

/// Session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Resolve a token to a live session of an active account.
pub async fn resolve_session(
    state: &AppState,
    token: &str,
) -> Result<Option<AuthSession>, DatabaseError> {
    let Ok(claims) = state.jwt.validate(token) else {
        debug!("Rejected invalid session token");
        return Ok(None);
    };
    let Some(account_id) = claims.account_id() else {
        return Ok(None);
    };

    let token_hash = JwtManager::hash_token(token);
    let Some(session) = state.db.get_active_session(&claims.jti, &token_hash).await? else {
        debug!(session_id = %claims.jti, "Session revoked or expired");
        return Ok(None);
    };
    if session.account_id != account_id {
        return Ok(None);
    }

    let account = match state.db.get_account(account_id).await {
        Ok(account) => account,
        Err(DatabaseError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    if !account.is_active {
        return Ok(None);
    }

    Ok(Some(AuthSession {
        account,
        session_id: session.id,
    }))
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeSession(session) = MaybeSession::from_request_parts(parts, state).await?;
        session.ok_or_else(|| AppError::Unauthenticated {
            next: parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string()),
        })
    }
}

/// Like [`AuthSession`] but never rejects anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<AuthSession>);

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Self(None));
        };
        Ok(Self(resolve_session(state, &token).await?))
    }
}

/// `Set-Cookie` value carrying a new session token.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(max_age_secs))
        .build()
        .to_string()
}

/// `Set-Cookie` value that deletes the session cookie.
pub fn removal_cookie() -> String {
    let mut c = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    c.make_removal();
    c.to_string()
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; divert_session=abc.def.ghi"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("divert_session=cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(session_token(&headers).as_deref(), Some("header"));
    }

    #[test]
    fn no_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("divert_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookie_attributes() {
        let set = session_cookie("tok", 60);
        assert!(set.starts_with("divert_session=tok"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("SameSite=Lax"));
        assert!(set.contains("Path=/"));
        assert!(set.contains("Max-Age=60"));

        let removal = removal_cookie();
        assert!(removal.starts_with("divert_session=;"));
        assert!(removal.contains("Max-Age=0"));
    }
}
