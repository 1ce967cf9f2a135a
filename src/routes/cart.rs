use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};

use crate::{
    dto::cart::{AddToCartRequest, CartCount, CartUpdate, CartView, UpdateCartItemRequest},
    error::AppResult,
    extract::ValidJson,
    middleware::session::SessionContext,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

// The cart belongs to the session, so none of these handlers require a login.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/count", get(cart_count))
        .route("/items", post(add_to_cart))
        .route("/items/{book_id}", put(update_cart_item).delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines, total and item count", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    session: SessionContext,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::get_cart(&state, &session.id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cart/count",
    responses(
        (status = 200, description = "Sum of quantities in the cart", body = ApiResponse<CartCount>)
    ),
    tag = "Cart"
)]
pub async fn cart_count(
    State(state): State<AppState>,
    session: SessionContext,
) -> AppResult<Json<ApiResponse<CartCount>>> {
    let resp = cart_service::cart_count(&state, &session.id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Book added to cart", body = ApiResponse<CartView>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Book not found"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: SessionContext,
    ValidJson(payload): ValidJson<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add_to_cart(&state, &session.id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{book_id}",
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity set; zero or less removes the line", body = ApiResponse<CartUpdate>)
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    session: SessionContext,
    Path(book_id): Path<i32>,
    ValidJson(payload): ValidJson<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartUpdate>>> {
    let resp = cart_service::update_quantity(&state, &session.id, book_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{book_id}",
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Line removed if present", body = ApiResponse<CartUpdate>)
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: SessionContext,
    Path(book_id): Path<i32>,
) -> AppResult<Json<ApiResponse<CartUpdate>>> {
    let resp = cart_service::remove_from_cart(&state, &session.id, book_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    session: SessionContext,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::clear_cart(&state, &session.id).await?;
    Ok(Json(resp))
}
