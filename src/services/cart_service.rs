use crate::{
    cart::Cart,
    dto::cart::{AddToCartRequest, CartCount, CartUpdate, CartView, UpdateCartItemRequest},
    error::{AppError, AppResult},
    models::CartItem,
    response::{ApiResponse, Meta},
    services::catalog_service::find_book,
    session::{CART_KEY, Sessions},
    state::AppState,
};

/// Load the cart stored in a session. A session without a cart has an empty one.
pub fn load_cart(sessions: &Sessions, session_id: &str) -> AppResult<Cart> {
    let items: Option<Vec<CartItem>> = sessions.get_json(session_id, CART_KEY)?;
    Ok(items.map(Cart::from_items).unwrap_or_default())
}

pub fn store_cart(sessions: &Sessions, session_id: &str, cart: &Cart) -> AppResult<()> {
    if cart.is_empty() {
        sessions.remove(session_id, CART_KEY);
        return Ok(());
    }
    sessions.set_json(session_id, CART_KEY, &cart.items())
}

pub async fn get_cart(state: &AppState, session_id: &str) -> AppResult<ApiResponse<CartView>> {
    let cart = load_cart(&state.sessions, session_id)?;
    Ok(ApiResponse::success("OK", CartView::from(&cart), None))
}

pub async fn cart_count(state: &AppState, session_id: &str) -> AppResult<ApiResponse<CartCount>> {
    let cart = load_cart(&state.sessions, session_id)?;
    Ok(ApiResponse::success(
        "OK",
        CartCount {
            count: cart.item_count(),
        },
        None,
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    session_id: &str,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let book = find_book(&state.orm, payload.book_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let _guard = state.sessions.lock(session_id).await;
    let mut cart = load_cart(&state.sessions, session_id)?;
    let line_quantity = cart
        .add(&book, quantity, state.config.cart_max_quantity)
        .quantity;
    store_cart(&state.sessions, session_id, &cart)?;

    tracing::debug!(
        session_id,
        book_id = book.id,
        quantity = line_quantity,
        "cart line added"
    );

    Ok(ApiResponse::success(
        format!("'{}' added to cart", book.title),
        CartView::from(&cart),
        Some(Meta::empty()),
    ))
}

pub async fn update_quantity(
    state: &AppState,
    session_id: &str,
    book_id: i32,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartUpdate>> {
    let _guard = state.sessions.lock(session_id).await;
    let mut cart = load_cart(&state.sessions, session_id)?;
    let changed = cart.set_quantity(book_id, payload.quantity, state.config.cart_max_quantity);
    if changed {
        store_cart(&state.sessions, session_id, &cart)?;
        tracing::debug!(session_id, book_id, quantity = payload.quantity, "cart line updated");
    }

    Ok(ApiResponse::success(
        if changed { "Cart updated" } else { "Item not in cart" },
        CartUpdate {
            changed,
            cart: CartView::from(&cart),
        },
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    state: &AppState,
    session_id: &str,
    book_id: i32,
) -> AppResult<ApiResponse<CartUpdate>> {
    let _guard = state.sessions.lock(session_id).await;
    let mut cart = load_cart(&state.sessions, session_id)?;
    let changed = cart.remove(book_id);
    if changed {
        store_cart(&state.sessions, session_id, &cart)?;
        tracing::debug!(session_id, book_id, "cart line removed");
    }

    Ok(ApiResponse::success(
        if changed { "Removed from cart" } else { "Item not in cart" },
        CartUpdate {
            changed,
            cart: CartView::from(&cart),
        },
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(state: &AppState, session_id: &str) -> AppResult<ApiResponse<CartView>> {
    let _guard = state.sessions.lock(session_id).await;
    state.sessions.remove(session_id, CART_KEY);
    Ok(ApiResponse::success(
        "Cart cleared",
        CartView::from(&Cart::new()),
        Some(Meta::empty()),
    ))
}
