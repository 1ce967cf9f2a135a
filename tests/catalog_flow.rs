mod common;

use bookstore_api::{
    dto::{
        books::CreateBookRequest,
        categories::{CreateCategoryRequest, UpdateCategoryRequest},
    },
    entity::sea_orm_active_enums::Role,
    error::AppError,
    routes::params::{BookQuery, BookSortBy, SortOrder},
    services::catalog_service,
};
use rust_decimal::Decimal;

fn new_book(category_id: i32, price: Decimal) -> CreateBookRequest {
    CreateBookRequest {
        title: "Osmanlı Tarihi".into(),
        author: "Halil İnalcık".into(),
        description: Some("Osmanlı İmparatorluğu tarihi".into()),
        price,
        category_id,
        image_url: None,
    }
}

#[tokio::test]
async fn book_listing_filters_sorts_and_pages() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (category_id, first, second) = common::seed_catalog(&state).await?;
    let other_category = common::seed_category(&state, "Tarih").await?;
    let third = common::seed_book(
        &state,
        other_category,
        "Osmanlı Tarihi",
        "Halil İnalcık",
        Decimal::new(6000, 2),
    )
    .await?;

    let found = catalog_service::list_books(
        &state,
        BookQuery {
            q: Some("orwell".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("books");
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].id, second);

    let by_category = catalog_service::list_books(
        &state,
        BookQuery {
            category_id: Some(category_id),
            sort_by: Some(BookSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("books");
    let ids: Vec<i32> = by_category.items.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![second, first]);

    let pricey = catalog_service::list_books(
        &state,
        BookQuery {
            min_price: Some(Decimal::new(4000, 2)),
            max_price: Some(Decimal::new(5000, 2)),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("books");
    assert_eq!(pricey.items.len(), 1);
    assert_eq!(pricey.items[0].id, first);

    let page = catalog_service::list_books(
        &state,
        BookQuery {
            page: Some(2),
            per_page: Some(2),
            sort_by: Some(BookSortBy::Title),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    let meta = page.meta.clone().expect("meta");
    assert_eq!(meta.total, Some(3));
    assert_eq!(meta.page, Some(2));
    let page = page.data.expect("books");
    assert_eq!(page.items.len(), 1);

    let book = catalog_service::get_book(&state, third)
        .await?
        .data
        .expect("book");
    assert_eq!(book.category.as_ref().map(|c| c.name.as_str()), Some("Tarih"));
    Ok(())
}

#[tokio::test]
async fn pages_far_past_the_end_are_empty() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    common::seed_catalog(&state).await?;

    let page = catalog_service::list_books(
        &state,
        BookQuery {
            page: Some(i64::MAX),
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?;
    let meta = page.meta.clone().expect("meta");
    assert_eq!(meta.total, Some(2));
    assert!(page.data.expect("books").items.is_empty());
    Ok(())
}

#[tokio::test]
async fn books_by_category_include_the_category() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (category_id, _, _) = common::seed_catalog(&state).await?;

    let books = catalog_service::list_books_by_category(&state, category_id)
        .await?
        .data
        .expect("books");
    assert_eq!(books.items.len(), 2);
    assert!(
        books
            .items
            .iter()
            .all(|b| b.category.as_ref().map(|c| c.id) == Some(category_id))
    );

    let empty = catalog_service::list_books_by_category(&state, category_id + 100)
        .await?
        .data
        .expect("books");
    assert!(empty.items.is_empty());

    let err = catalog_service::get_book(&state, 9999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn book_writes_are_validated_and_admin_only() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (category_id, _, _) = common::seed_catalog(&state).await?;
    let (_, reader) = common::login_as(&state, "reader", Role::User).await?;
    let (_, admin) = common::login_as(&state, "admin", Role::Admin).await?;

    let err = catalog_service::create_book(&state, &reader, new_book(category_id, Decimal::new(6000, 2)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = catalog_service::create_book(&state, &admin, new_book(category_id, Decimal::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = catalog_service::create_book(&state, &admin, new_book(category_id + 100, Decimal::ONE))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let created = catalog_service::create_book(
        &state,
        &admin,
        new_book(category_id, Decimal::new(6000, 2)),
    )
    .await?
    .data
    .expect("book");
    assert_eq!(created.price, Decimal::new(6000, 2));
    assert_eq!(created.category.as_ref().map(|c| c.id), Some(category_id));

    catalog_service::delete_book(&state, &admin, created.id).await?;
    let err = catalog_service::delete_book(&state, &admin, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn categories_count_books_and_guard_deletion() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (category_id, _, _) = common::seed_catalog(&state).await?;
    let (_, admin) = common::login_as(&state, "admin", Role::Admin).await?;

    let empty = catalog_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Bilim".into(),
            description: Some("Bilim türü kitaplar".into()),
            image_url: None,
        },
    )
    .await?
    .data
    .expect("category");

    let list = catalog_service::list_categories(&state)
        .await?
        .data
        .expect("categories");
    assert_eq!(list.items.len(), 2);
    let roman = list
        .items
        .iter()
        .find(|c| c.id == category_id)
        .expect("seeded category");
    assert_eq!(roman.book_count, Some(2));
    let bilim = list
        .items
        .iter()
        .find(|c| c.id == empty.id)
        .expect("new category");
    assert_eq!(bilim.book_count, Some(0));

    let err = catalog_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Roman".into(),
            description: None,
            image_url: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));

    let err = catalog_service::update_category(
        &state,
        &admin,
        empty.id,
        UpdateCategoryRequest {
            name: Some("Roman".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));

    let err = catalog_service::delete_category(&state, &admin, category_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    catalog_service::delete_category(&state, &admin, empty.id).await?;
    let err = catalog_service::get_category(&state, empty.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}
