use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};

use crate::{
    dto::favorites::{AddFavoriteRequest, FavoriteList, FavoriteStatus},
    error::AppResult,
    extract::ValidJson,
    middleware::auth::AuthUser,
    models::Favorite,
    response::ApiResponse,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_favorite))
        .route("/user/{user_id}", get(list_favorites))
        .route("/user/{user_id}/book/{book_id}", get(favorite_status))
        .route("/{id}", delete(remove_favorite))
}

#[utoipa::path(
    post,
    path = "/api/favorites",
    request_body = AddFavoriteRequest,
    responses(
        (status = 201, description = "Added to favorites", body = ApiResponse<Favorite>),
        (status = 400, description = "Already in favorites"),
        (status = 404, description = "Book not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<AddFavoriteRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Favorite>>)> {
    let resp = favorite_service::add_favorite(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{id}",
    params(
        ("id" = i32, Path, description = "Favorite ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 404, description = "Favorite not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    favorite_service::remove_favorite(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/favorites/user/{user_id}",
    params(
        ("user_id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Favorites with book and category", body = ApiResponse<FavoriteList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<ApiResponse<FavoriteList>>> {
    let resp = favorite_service::list_by_user(&state, &user, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/favorites/user/{user_id}/book/{book_id}",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Whether the book is a favorite", body = ApiResponse<FavoriteStatus>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn favorite_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path((user_id, book_id)): Path<(i32, i32)>,
) -> AppResult<Json<ApiResponse<FavoriteStatus>>> {
    let resp = favorite_service::favorite_status(&state, &user, user_id, book_id).await?;
    Ok(Json(resp))
}
