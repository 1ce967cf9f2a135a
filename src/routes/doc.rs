use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        books::{BookList, CreateBookRequest, UpdateBookRequest},
        cart::{AddToCartRequest, CartCount, CartUpdate, CartView, UpdateCartItemRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        favorites::{AddFavoriteRequest, FavoriteList, FavoriteStatus},
        orders::{OrderList, OrderWithDetails, UpdateOrderStatusRequest},
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    entity::sea_orm_active_enums::{OrderStatus, Role},
    middleware::session::SESSION_COOKIE,
    models::{Book, CartItem, Category, Favorite, Order, OrderDetail, User},
    response::{ApiResponse, Meta},
    routes::{auth, books, cart, categories, favorites, health, orders, params, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        auth::logout,
        auth::me,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        books::list_books,
        books::get_book,
        books::list_books_by_category,
        books::create_book,
        books::update_book,
        books::delete_book,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        cart::get_cart,
        cart::cart_count,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::place_order,
        orders::list_orders,
        orders::list_user_orders,
        orders::get_order,
        orders::update_order_status,
        favorites::add_favorite,
        favorites::remove_favorite,
        favorites::list_favorites,
        favorites::favorite_status
    ),
    components(
        schemas(
            User,
            Role,
            Book,
            Category,
            Favorite,
            CartItem,
            Order,
            OrderDetail,
            OrderStatus,
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            CreateBookRequest,
            UpdateBookRequest,
            BookList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartView,
            CartUpdate,
            CartCount,
            AddFavoriteRequest,
            FavoriteList,
            FavoriteStatus,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithDetails,
            params::Pagination,
            params::BookQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Book>,
            ApiResponse<BookList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithDetails>,
            ApiResponse<OrderList>,
            ApiResponse<User>
        )
    ),
    security(
        ("bearer_auth" = []),
        ("session_cookie" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Login, registration and session identity"),
        (name = "Users", description = "User administration"),
        (name = "Books", description = "Book catalog"),
        (name = "Categories", description = "Book categories"),
        (name = "Cart", description = "Session shopping cart"),
        (name = "Orders", description = "Order placement and history"),
        (name = "Favorites", description = "Favorite books"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
