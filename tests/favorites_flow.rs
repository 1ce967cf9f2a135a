mod common;

use bookstore_api::{
    dto::favorites::AddFavoriteRequest,
    entity::{favorites::Entity as Favorites, sea_orm_active_enums::Role},
    error::AppError,
    services::favorite_service,
};
use sea_orm::{EntityTrait, PaginatorTrait};

#[tokio::test]
async fn adding_the_same_favorite_twice_is_a_duplicate() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, _) = common::seed_catalog(&state).await?;
    let (_, user) = common::login_as(&state, "reader", Role::User).await?;

    let favorite = favorite_service::add_favorite(
        &state,
        &user,
        AddFavoriteRequest {
            user_id: user.user_id,
            book_id: first,
        },
    )
    .await?
    .data
    .expect("favorite");
    assert_eq!(favorite.user_id, user.user_id);
    assert_eq!(favorite.book_id, first);

    let err = favorite_service::add_favorite(
        &state,
        &user,
        AddFavoriteRequest {
            user_id: user.user_id,
            book_id: first,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
    assert_eq!(Favorites::find().count(&state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn favorites_list_includes_book_and_category() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (category_id, first, second) = common::seed_catalog(&state).await?;
    let (_, user) = common::login_as(&state, "reader", Role::User).await?;

    for book_id in [first, second] {
        favorite_service::add_favorite(
            &state,
            &user,
            AddFavoriteRequest {
                user_id: user.user_id,
                book_id,
            },
        )
        .await?;
    }

    let list = favorite_service::list_by_user(&state, &user, user.user_id)
        .await?
        .data
        .expect("favorites");
    assert_eq!(list.items.len(), 2);
    for favorite in &list.items {
        let book = favorite.book.as_ref().expect("book loaded");
        assert_eq!(book.id, favorite.book_id);
        let category = book.category.as_ref().expect("category loaded");
        assert_eq!(category.id, category_id);
        assert_eq!(category.name, "Roman");
    }
    Ok(())
}

#[tokio::test]
async fn remove_checks_existence_and_ownership() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, _) = common::seed_catalog(&state).await?;
    let (_, owner) = common::login_as(&state, "owner", Role::User).await?;
    let (_, other) = common::login_as(&state, "other", Role::User).await?;

    let favorite = favorite_service::add_favorite(
        &state,
        &owner,
        AddFavoriteRequest {
            user_id: owner.user_id,
            book_id: first,
        },
    )
    .await?
    .data
    .expect("favorite");

    let err = favorite_service::remove_favorite(&state, &other, favorite.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    favorite_service::remove_favorite(&state, &owner, favorite.id).await?;
    assert_eq!(Favorites::find().count(&state.orm).await?, 0);

    let err = favorite_service::remove_favorite(&state, &owner, favorite.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn users_cannot_add_favorites_for_others_or_missing_books() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (_, first, _) = common::seed_catalog(&state).await?;
    let (_, owner) = common::login_as(&state, "owner", Role::User).await?;
    let (_, other) = common::login_as(&state, "other", Role::User).await?;
    let (_, admin) = common::login_as(&state, "admin", Role::Admin).await?;

    let err = favorite_service::add_favorite(
        &state,
        &other,
        AddFavoriteRequest {
            user_id: owner.user_id,
            book_id: first,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = favorite_service::add_favorite(
        &state,
        &owner,
        AddFavoriteRequest {
            user_id: owner.user_id,
            book_id: 9999,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    favorite_service::add_favorite(
        &state,
        &admin,
        AddFavoriteRequest {
            user_id: owner.user_id,
            book_id: first,
        },
    )
    .await?;

    let status = favorite_service::favorite_status(&state, &owner, owner.user_id, first)
        .await?
        .data
        .expect("status");
    assert!(status.is_favorite);
    assert!(status.favorite_id.is_some());

    let status = favorite_service::favorite_status(&state, &other, other.user_id, first)
        .await?
        .data
        .expect("status");
    assert!(!status.is_favorite);
    assert_eq!(status.favorite_id, None);
    Ok(())
}
