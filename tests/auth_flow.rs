mod common;

use bookstore_api::{
    dto::{
        auth::{LoginRequest, RegisterRequest},
        cart::AddToCartRequest,
        users::{CreateUserRequest, UpdateUserRequest},
    },
    entity::sea_orm_active_enums::Role,
    error::AppError,
    middleware::{auth::current_user, session::decode_token},
    routes::params::Pagination,
    services::{auth_service, cart_service, order_service, user_service},
};

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn login_establishes_identity_with_role() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, admin) = common::login_as(&state, "admin", Role::Admin).await?;
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(admin.username, "admin");

    let session = common::new_session();
    let resp = auth_service::login_user(
        &state,
        &session,
        login_request("admin@example.com", common::TEST_PASSWORD),
    )
    .await?
    .data
    .expect("login");
    assert_eq!(resp.user.id, admin.user_id);
    assert_eq!(resp.user.role, Role::Admin);
    assert_ne!(resp.token, session.token);

    let renewed = decode_token(common::TEST_SECRET, &resp.token).expect("renewed session");
    assert_ne!(renewed, session.id);
    let identity = current_user(&state.sessions, &renewed).expect("identity");
    assert_eq!(identity.user_id, admin.user_id);
    assert_eq!(identity.role, Role::Admin);
    assert!(current_user(&state.sessions, &session.id).is_none());
    Ok(())
}

#[tokio::test]
async fn login_moves_the_cart_to_a_new_session() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, second) = common::seed_catalog(&state).await?;
    common::login_as(&state, "reader", Role::User).await?;

    let anonymous = common::new_session();
    for book_id in [first, second] {
        cart_service::add_to_cart(
            &state,
            &anonymous.id,
            AddToCartRequest {
                book_id,
                quantity: Some(2),
            },
        )
        .await?;
    }

    let session =
        common::login_on(&state, &anonymous, "reader@example.com", common::TEST_PASSWORD).await?;
    assert_ne!(session.id, anonymous.id);

    let cart = cart_service::get_cart(&state, &session.id)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.item_count, 4);

    let stale = cart_service::get_cart(&state, &anonymous.id)
        .await?
        .data
        .expect("cart");
    assert!(stale.items.is_empty());
    assert!(current_user(&state.sessions, &anonymous.id).is_none());
    Ok(())
}

#[tokio::test]
async fn email_match_wins_over_username_lookalike() -> anyhow::Result<()> {
    let state = common::setup_state().await?;

    auth_service::register_user(
        &state,
        RegisterRequest {
            username: "alice@example.com".into(),
            email: "mallory@example.com".into(),
            password: "mallory-pass".into(),
        },
    )
    .await?;
    let alice = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "alice-pass".into(),
        },
    )
    .await?
    .data
    .expect("user");

    let session =
        common::login_on(&state, &common::new_session(), "alice@example.com", "alice-pass").await?;
    let identity = current_user(&state.sessions, &session.id).expect("identity");
    assert_eq!(identity.user_id, alice.id);
    assert_eq!(identity.username, "alice");
    Ok(())
}

#[tokio::test]
async fn wrong_password_leaves_session_anonymous() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    common::login_as(&state, "reader", Role::User).await?;

    let session = common::new_session();
    let err = auth_service::login_user(
        &state,
        &session,
        login_request("reader@example.com", "not-the-password"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
    assert!(current_user(&state.sessions, &session.id).is_none());

    let err = auth_service::login_user(
        &state,
        &session,
        login_request("nobody@example.com", common::TEST_PASSWORD),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
    assert!(current_user(&state.sessions, &session.id).is_none());
    Ok(())
}

#[tokio::test]
async fn login_accepts_username() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, reader) = common::login_as(&state, "reader", Role::User).await?;

    let session =
        common::login_on(&state, &common::new_session(), "reader", common::TEST_PASSWORD).await?;

    let identity = current_user(&state.sessions, &session.id).expect("identity");
    assert_eq!(identity.user_id, reader.user_id);
    assert_eq!(identity.role, Role::User);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_rejected() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    common::login_as(&state, "reader", Role::User).await?;

    let err = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "someone".into(),
            email: "READER@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));

    let err = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "reader".into(),
            email: "fresh@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
    Ok(())
}

#[tokio::test]
async fn logout_clears_identity_and_cart() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, _) = common::seed_catalog(&state).await?;
    let (session, _) = common::login_as(&state, "reader", Role::User).await?;

    cart_service::add_to_cart(
        &state,
        &session.id,
        AddToCartRequest {
            book_id: first,
            quantity: None,
        },
    )
    .await?;

    auth_service::logout_user(&state, &session.id).await?;
    assert!(current_user(&state.sessions, &session.id).is_none());

    let cart = cart_service::get_cart(&state, &session.id)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());

    let err = order_service::place_order(&state, &session.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
    Ok(())
}

#[tokio::test]
async fn admin_manages_users() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, admin) = common::login_as(&state, "admin", Role::Admin).await?;
    let (_, reader) = common::login_as(&state, "reader", Role::User).await?;

    let err = user_service::list_users(&state, &reader, Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let created = user_service::create_user(
        &state,
        &admin,
        CreateUserRequest {
            username: "editor".into(),
            email: "editor@example.com".into(),
            password: "editor-pass".into(),
            role: None,
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(created.role, Role::User);

    let updated = user_service::update_user(
        &state,
        &admin,
        created.id,
        UpdateUserRequest {
            role: Some(Role::Admin),
            password: Some("new-password".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(updated.email, "editor@example.com");

    let session =
        common::login_on(&state, &common::new_session(), "editor", "new-password").await?;
    let identity = current_user(&state.sessions, &session.id).expect("identity");
    assert_eq!(identity.role, Role::Admin);

    let err = user_service::update_user(
        &state,
        &admin,
        created.id,
        UpdateUserRequest {
            email: Some("reader@example.com".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));

    let list = user_service::list_users(&state, &admin, Pagination::default()).await?;
    assert_eq!(list.meta.as_ref().and_then(|m| m.total), Some(3));

    user_service::delete_user(&state, &admin, created.id).await?;
    let err = user_service::get_user(&state, &admin, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = user_service::delete_user(&state, &admin, admin.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}
