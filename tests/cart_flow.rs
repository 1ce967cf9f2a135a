mod common;

use bookstore_api::{
    dto::{
        books::UpdateBookRequest,
        cart::{AddToCartRequest, UpdateCartItemRequest},
    },
    entity::sea_orm_active_enums::Role,
    error::AppError,
    services::{cart_service, catalog_service},
};
use rust_decimal::Decimal;

fn add(book_id: i32, quantity: Option<i32>) -> AddToCartRequest {
    AddToCartRequest { book_id, quantity }
}

#[tokio::test]
async fn adding_the_same_book_twice_increments_one_line() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, second) = common::seed_catalog(&state).await?;
    let session = common::new_session();

    cart_service::add_to_cart(&state, &session.id, add(first, None)).await?;
    cart_service::add_to_cart(&state, &session.id, add(first, Some(1))).await?;
    cart_service::add_to_cart(&state, &session.id, add(second, None)).await?;

    let cart = cart_service::get_cart(&state, &session.id)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.items[0].book_id, first);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.items[0].title, "Suç ve Ceza");
    assert_eq!(cart.items[1].book_id, second);
    assert_eq!(cart.total, Decimal::new(12500, 2));
    assert_eq!(cart.item_count, 3);

    let count = cart_service::cart_count(&state, &session.id)
        .await?
        .data
        .expect("count");
    assert_eq!(count.count, 3);
    Ok(())
}

#[tokio::test]
async fn unknown_book_and_bad_quantity_are_rejected() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, _) = common::seed_catalog(&state).await?;
    let session = common::new_session();

    let err = cart_service::add_to_cart(&state, &session.id, add(9999, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = cart_service::add_to_cart(&state, &session.id, add(first, Some(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let cart = cart_service::get_cart(&state, &session.id)
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn set_quantity_and_remove_behave_as_no_ops_on_missing_lines() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, second) = common::seed_catalog(&state).await?;
    let session = common::new_session();

    cart_service::add_to_cart(&state, &session.id, add(first, Some(2))).await?;

    let update = cart_service::update_quantity(
        &state,
        &session.id,
        second,
        UpdateCartItemRequest { quantity: 4 },
    )
    .await?
    .data
    .expect("update");
    assert!(!update.changed);
    assert_eq!(update.cart.items.len(), 1);

    let update = cart_service::update_quantity(
        &state,
        &session.id,
        first,
        UpdateCartItemRequest { quantity: 5 },
    )
    .await?
    .data
    .expect("update");
    assert!(update.changed);
    assert_eq!(update.cart.items[0].quantity, 5);

    let removed = cart_service::remove_from_cart(&state, &session.id, second)
        .await?
        .data
        .expect("remove");
    assert!(!removed.changed);

    let update = cart_service::update_quantity(
        &state,
        &session.id,
        first,
        UpdateCartItemRequest { quantity: 0 },
    )
    .await?
    .data
    .expect("update");
    assert!(update.changed);
    assert!(update.cart.items.is_empty());
    assert_eq!(update.cart.total, Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn quantities_are_capped() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, _) = common::seed_catalog(&state).await?;
    let session = common::new_session();
    let max = state.config.cart_max_quantity;

    cart_service::add_to_cart(&state, &session.id, add(first, Some(max - 1))).await?;
    let cart = cart_service::add_to_cart(&state, &session.id, add(first, Some(5)))
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items[0].quantity, max);

    let update = cart_service::update_quantity(
        &state,
        &session.id,
        first,
        UpdateCartItemRequest { quantity: max + 50 },
    )
    .await?
    .data
    .expect("update");
    assert_eq!(update.cart.items[0].quantity, max);
    Ok(())
}

#[tokio::test]
async fn carts_are_scoped_to_their_session() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, second) = common::seed_catalog(&state).await?;
    let alice = common::new_session();
    let bob = common::new_session();

    cart_service::add_to_cart(&state, &alice.id, add(first, None)).await?;
    cart_service::add_to_cart(&state, &bob.id, add(second, Some(3))).await?;

    let alice_cart = cart_service::get_cart(&state, &alice.id).await?.data.expect("cart");
    let bob_cart = cart_service::get_cart(&state, &bob.id).await?.data.expect("cart");
    assert_eq!(alice_cart.items.len(), 1);
    assert_eq!(alice_cart.items[0].book_id, first);
    assert_eq!(bob_cart.items.len(), 1);
    assert_eq!(bob_cart.items[0].quantity, 3);

    cart_service::clear_cart(&state, &alice.id).await?;
    let alice_cart = cart_service::get_cart(&state, &alice.id).await?.data.expect("cart");
    let bob_cart = cart_service::get_cart(&state, &bob.id).await?.data.expect("cart");
    assert!(alice_cart.items.is_empty());
    assert_eq!(bob_cart.item_count, 3);
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_from_one_session_are_not_lost() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, _) = common::seed_catalog(&state).await?;
    let session = common::new_session();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let state = state.clone();
        let session_id = session.id.clone();
        tasks.push(tokio::spawn(async move {
            cart_service::add_to_cart(&state, &session_id, add(first, None)).await
        }));
    }
    for task in tasks {
        task.await??;
    }

    let cart = cart_service::get_cart(&state, &session.id)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 10);
    Ok(())
}

#[tokio::test]
async fn cart_lines_keep_the_price_they_were_added_at() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, _) = common::seed_catalog(&state).await?;
    let (_, admin) = common::login_as(&state, "admin", Role::Admin).await?;
    let session = common::new_session();

    cart_service::add_to_cart(&state, &session.id, add(first, None)).await?;
    catalog_service::update_book(
        &state,
        &admin,
        first,
        UpdateBookRequest {
            price: Some(Decimal::new(9900, 2)),
            ..Default::default()
        },
    )
    .await?;
    cart_service::add_to_cart(&state, &session.id, add(first, None)).await?;

    let cart = cart_service::get_cart(&state, &session.id)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items[0].price, Decimal::new(4500, 2));
    assert_eq!(cart.total, Decimal::new(9000, 2));
    Ok(())
}
