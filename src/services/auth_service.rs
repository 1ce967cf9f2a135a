use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    entity::{
        sea_orm_active_enums::Role,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, current_user},
        session::SessionContext,
    },
    models::User,
    response::{ApiResponse, Meta},
    services::cart_service::{load_cart, store_cart},
    session::{ROLE_KEY, USER_ID_KEY, USERNAME_KEY},
    state::AppState,
};

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub(crate) fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload;

    let user = UserActive {
        id: NotSet,
        username: Set(username.trim().to_owned()),
        email: Set(email.trim().to_lowercase()),
        password_hash: Set(hash_password(&password)?),
        role: Set(Role::User),
        created_date: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::on_unique_violation(err, "Username or email is already taken"))?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");

    audit::record(
        &state.orm,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("User created", user_from_entity(user), None))
}

/// Check credentials and sign the caller in. `email` may also be a username; an
/// exact email match wins over a username match.
///
/// A successful login moves the cart to a newly issued session and discards the old
/// one, so a handle obtained before login never carries the identity. The new handle
/// is returned as `token`. On failure the session is left untouched.
pub async fn login_user(
    state: &AppState,
    session: &SessionContext,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let identifier = email.trim();

    let user = match Users::find()
        .filter(UserCol::Email.eq(identifier.to_lowercase()))
        .one(&state.orm)
        .await?
    {
        Some(user) => user,
        None => Users::find()
            .filter(UserCol::Username.eq(identifier))
            .one(&state.orm)
            .await?
            .ok_or(AppError::InvalidCredentials)?,
    };

    if !verify_password(&password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "login rejected");
        return Err(AppError::InvalidCredentials);
    }

    let renewed = SessionContext::issue(&state.config.session_secret)?;
    {
        let _guard = state.sessions.lock(&session.id).await;
        let cart = load_cart(&state.sessions, &session.id)?;
        state.sessions.clear(&session.id);

        store_cart(&state.sessions, &renewed.id, &cart)?;
        state
            .sessions
            .set(&renewed.id, USER_ID_KEY, user.id.to_string());
        state
            .sessions
            .set(&renewed.id, USERNAME_KEY, user.username.clone());
        state.sessions.set(&renewed.id, ROLE_KEY, user.role.as_str());
    }

    tracing::info!(user_id = user.id, role = user.role.as_str(), "user logged in");

    audit::record(
        &state.orm,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = LoginResponse {
        user: user_from_entity(user),
        token: renewed.token,
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Drop everything held by the session, the cart included.
pub async fn logout_user(
    state: &AppState,
    session_id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let _guard = state.sessions.lock(session_id).await;
    if let Some(user) = current_user(&state.sessions, session_id) {
        tracing::info!(user_id = user.user_id, "user logged out");
    }
    state.sessions.clear(session_id);
    Ok(ApiResponse::message("Logged out", serde_json::json!({})))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(ApiResponse::success("OK", user_from_entity(user), None))
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        role: model.role,
        created_date: model.created_date.with_timezone(&Utc),
    }
}
