use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    entity::sea_orm_active_enums::Role,
    error::AppError,
    middleware::session::SessionContext,
    session::{ROLE_KEY, Sessions, USER_ID_KEY, USERNAME_KEY},
    state::AppState,
};

/// Identity established by a successful login and kept in the session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Read the identity stored in a session, if any.
pub fn current_user(sessions: &Sessions, session_id: &str) -> Option<AuthUser> {
    let user_id = sessions.get(session_id, USER_ID_KEY)?.parse::<i32>().ok()?;
    let username = sessions.get(session_id, USERNAME_KEY)?;
    let role = Role::parse(&sessions.get(session_id, ROLE_KEY)?)?;
    Some(AuthUser {
        user_id,
        username,
        role,
    })
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// Allow the owner of `user_id` or any admin.
pub fn ensure_self_or_admin(user: &AuthUser, user_id: i32) -> Result<(), AppError> {
    if user.user_id == user_id || user.is_admin() {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionContext::from_request_parts(parts, state).await?;
        current_user(&state.sessions, &session.id).ok_or(AppError::Unauthorized)
    }
}
