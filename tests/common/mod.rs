#![allow(dead_code)]

use bookstore_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::auth::{LoginRequest, RegisterRequest},
    entity::{
        books::ActiveModel as BookActive,
        categories::ActiveModel as CategoryActive,
        sea_orm_active_enums::Role,
        users::{ActiveModel as UserActive, Entity as Users},
    },
    middleware::{
        auth::{AuthUser, current_user},
        session::{SessionContext, decode_token},
    },
    services::auth_service,
    state::AppState,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

pub const TEST_SECRET: &str = "test-session-secret";
pub const TEST_PASSWORD: &str = "secret123";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        session_secret: TEST_SECRET.into(),
        session_ttl_minutes: 30,
        cart_max_quantity: 99,
    }
}

/// Fresh in-memory database with every migration applied.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let config = test_config();
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, config))
}

pub fn new_session() -> SessionContext {
    SessionContext::issue(TEST_SECRET).expect("issue session")
}

/// Register `username` and log it in on a new session.
pub async fn login_as(
    state: &AppState,
    username: &str,
    role: Role,
) -> anyhow::Result<(SessionContext, AuthUser)> {
    let email = format!("{username}@example.com");
    let registered = auth_service::register_user(
        state,
        RegisterRequest {
            username: username.into(),
            email: email.clone(),
            password: TEST_PASSWORD.into(),
        },
    )
    .await?
    .data
    .expect("registered user");

    if role == Role::Admin {
        let model = Users::find_by_id(registered.id)
            .one(&state.orm)
            .await?
            .expect("user row");
        let mut active: UserActive = model.into();
        active.role = Set(Role::Admin);
        active.update(&state.orm).await?;
    }

    let session = login_on(state, &new_session(), &email, TEST_PASSWORD).await?;
    let user = current_user(&state.sessions, &session.id).expect("identity in session");
    Ok((session, user))
}

/// Log in from `session` and return the session issued by the login.
pub async fn login_on(
    state: &AppState,
    session: &SessionContext,
    identifier: &str,
    password: &str,
) -> anyhow::Result<SessionContext> {
    let token = auth_service::login_user(
        state,
        session,
        LoginRequest {
            email: identifier.into(),
            password: password.into(),
        },
    )
    .await?
    .data
    .expect("login response")
    .token;
    let id = decode_token(TEST_SECRET, &token).expect("valid session token");
    Ok(SessionContext { id, token })
}

pub async fn seed_category(state: &AppState, name: &str) -> anyhow::Result<i32> {
    let category = CategoryActive {
        id: NotSet,
        name: Set(name.into()),
        description: Set(None),
        image_url: Set(None),
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn seed_book(
    state: &AppState,
    category_id: i32,
    title: &str,
    author: &str,
    price: Decimal,
) -> anyhow::Result<i32> {
    let book = BookActive {
        id: NotSet,
        title: Set(title.into()),
        author: Set(author.into()),
        description: Set(None),
        price: Set(price),
        category_id: Set(category_id),
        image_url: Set(None),
        created_date: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(book.id)
}

/// One category with "Suç ve Ceza" at 45.00 and "1984" at 35.00.
pub async fn seed_catalog(state: &AppState) -> anyhow::Result<(i32, i32, i32)> {
    let category_id = seed_category(state, "Roman").await?;
    let first = seed_book(
        state,
        category_id,
        "Suç ve Ceza",
        "Fyodor Dostoyevski",
        Decimal::new(4500, 2),
    )
    .await?;
    let second = seed_book(
        state,
        category_id,
        "1984",
        "George Orwell",
        Decimal::new(3500, 2),
    )
    .await?;
    Ok((category_id, first, second))
}
