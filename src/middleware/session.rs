use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "bookstore_session";

/// Lifetime of the signed session handle. Session data itself expires earlier
/// when idle (see `SESSION_TTL_MINUTES`).
const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Deserialize, Serialize)]
pub struct SessionClaims {
    pub sid: String,
    pub exp: usize,
}

/// The session the current request belongs to.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: String,
    pub token: String,
}

impl SessionContext {
    /// Start a brand new session with a freshly signed handle.
    pub fn issue(secret: &str) -> AppResult<Self> {
        let id = Uuid::new_v4().to_string();
        let token = issue_token(secret, &id)?;
        Ok(Self { id, token })
    }
}

pub fn issue_token(secret: &str, session_id: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(TOKEN_TTL_DAYS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = SessionClaims {
        sid: session_id.to_owned(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Returns the session id carried by a valid, unexpired token.
pub fn decode_token(secret: &str, token: &str) -> Option<String> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims.sid)
}

/// HttpOnly cookie carrying a session handle.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|value| value.to_str().is_ok_and(|v| v.starts_with(&prefix)))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

/// Attach a [`SessionContext`] to every request. The handle comes from the
/// `Authorization: Bearer` header or the session cookie; requests without a valid
/// handle get a new session whose handle is returned as a cookie, unless the handler
/// already replaced the handle itself (login).
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let secret = state.config.session_secret.as_str();
    let existing = bearer_token(request.headers())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()))
        .and_then(|token| {
            decode_token(secret, &token).map(|id| SessionContext { id, token })
        });

    let (session, fresh) = match existing {
        Some(session) => (session, false),
        None => match SessionContext::issue(secret) {
            Ok(session) => {
                tracing::debug!(session_id = %session.id, "session started");
                (session, true)
            }
            Err(err) => return err.into_response(),
        },
    };

    request.extensions_mut().insert(session.clone());
    let response = next.run(request).await;

    if fresh && !sets_session_cookie(&response) {
        (jar.add(session_cookie(session.token)), response).into_response()
    } else {
        response
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session layer is not installed")))
    }
}
