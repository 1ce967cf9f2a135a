use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::books::{BookList, CreateBookRequest, UpdateBookRequest},
    error::AppResult,
    extract::ValidJson,
    middleware::auth::AuthUser,
    models::Book,
    response::ApiResponse,
    routes::params::BookQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/category/{category_id}", get(list_books_by_category))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in title or author"),
        ("category_id" = Option<i32>, Query, description = "Only books of this category"),
        ("min_price" = Option<String>, Query, description = "Lowest price, inclusive"),
        ("max_price" = Option<String>, Query, description = "Highest price, inclusive"),
        ("sort_by" = Option<String>, Query, description = "created_date | price | title"),
        ("sort_order" = Option<String>, Query, description = "asc | desc, default desc")
    ),
    responses(
        (status = 200, description = "List books", body = ApiResponse<BookList>)
    ),
    tag = "Books"
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<ApiResponse<BookList>>> {
    let resp = catalog_service::list_books(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Get book", body = ApiResponse<Book>),
        (status = 404, description = "Book not found"),
    ),
    tag = "Books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let resp = catalog_service::get_book(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/books/category/{category_id}",
    params(
        ("category_id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Books of one category", body = ApiResponse<BookList>)
    ),
    tag = "Books"
)]
pub async fn list_books_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> AppResult<Json<ApiResponse<BookList>>> {
    let resp = catalog_service::list_books_by_category(&state, category_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Create book", body = ApiResponse<Book>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn create_book(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateBookRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Book>>)> {
    let resp = catalog_service::create_book(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Updated book", body = ApiResponse<Book>),
        (status = 404, description = "Book not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidJson(payload): ValidJson<UpdateBookRequest>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let resp = catalog_service::update_book(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Deleted book"),
        (status = 404, description = "Book not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn delete_book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    catalog_service::delete_book(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
