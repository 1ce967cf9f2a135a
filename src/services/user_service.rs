use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::{
    audit,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        sea_orm_active_enums::Role,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::auth_service::{hash_password, user_from_entity},
    state::AppState,
};

const DUPLICATE_USER: &str = "Username or email is already taken";

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_asc(UserCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: i32) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let found = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("User", user_from_entity(found), None))
}

pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;

    let created = UserActive {
        id: NotSet,
        username: Set(payload.username.trim().to_owned()),
        email: Set(payload.email.trim().to_lowercase()),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(payload.role.unwrap_or(Role::User)),
        created_date: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::on_unique_violation(err, DUPLICATE_USER))?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "user_create",
        "users",
        serde_json::json!({ "user_id": created.id, "role": created.role.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(created),
        Some(Meta::empty()),
    ))
}

/// Partial update; a new password is hashed before it is stored.
pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(username) = payload.username {
        active.username = Set(username.trim().to_owned());
    }
    if let Some(email) = payload.email {
        active.email = Set(email.trim().to_lowercase());
    }
    if let Some(password) = payload.password {
        active.password_hash = Set(hash_password(&password)?);
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|err| AppError::on_unique_violation(err, DUPLICATE_USER))?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "user_update",
        "users",
        serde_json::json!({ "user_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// Users with orders are kept so order history stays attributable.
pub async fn delete_user(state: &AppState, user: &AuthUser, id: i32) -> AppResult<()> {
    ensure_admin(user)?;
    if user.user_id == id {
        return Err(AppError::Validation("You cannot delete your own account".into()));
    }
    if Users::find_by_id(id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(id))
        .count(&state.orm)
        .await?;
    if orders > 0 {
        return Err(AppError::Validation(format!("User still has {orders} order(s)")));
    }

    Users::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(())
}
