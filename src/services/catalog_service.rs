use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    audit,
    dto::{
        books::{BookList, CreateBookRequest, UpdateBookRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
    },
    entity::{
        books::{ActiveModel as BookActive, Column as BookCol, Entity as Books, Model as BookModel},
        categories::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
            Model as CategoryModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Book, Category},
    response::{ApiResponse, Meta},
    routes::params::{BookQuery, BookSortBy, SortOrder},
    state::AppState,
};

pub async fn list_books(state: &AppState, query: BookQuery) -> AppResult<ApiResponse<BookList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col((Books, BookCol::Title)))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col((Books, BookCol::Author)))).like(pattern)),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(BookCol::CategoryId.eq(category_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(BookCol::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(BookCol::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(BookSortBy::CreatedDate);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        BookSortBy::CreatedDate => BookCol::CreatedDate,
        BookSortBy::Price => BookCol::Price,
        BookSortBy::Title => BookCol::Title,
    };

    let mut finder = Books::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    finder = finder.order_by_asc(BookCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .find_also_related(Categories)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(book, category)| book_from_entity(book, category))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Books", BookList { items }, Some(meta)))
}

pub async fn get_book(state: &AppState, id: i32) -> AppResult<ApiResponse<Book>> {
    let book = find_book(&state.orm, id).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Book", book, None))
}

/// Fetch one book with its category.
pub async fn find_book<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<Option<Book>> {
    let row = Books::find_by_id(id)
        .find_also_related(Categories)
        .one(conn)
        .await?;
    Ok(row.map(|(book, category)| book_from_entity(book, category)))
}

pub async fn list_books_by_category(
    state: &AppState,
    category_id: i32,
) -> AppResult<ApiResponse<BookList>> {
    let items = Books::find()
        .filter(BookCol::CategoryId.eq(category_id))
        .order_by_asc(BookCol::Title)
        .find_also_related(Categories)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(book, category)| book_from_entity(book, category))
        .collect();

    Ok(ApiResponse::success("Books", BookList { items }, Some(Meta::empty())))
}

pub async fn create_book(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_admin(user)?;
    ensure_positive_price(payload.price)?;
    ensure_category_exists(&state.orm, payload.category_id).await?;

    let book = BookActive {
        id: NotSet,
        title: Set(payload.title),
        author: Set(payload.author),
        description: Set(payload.description),
        price: Set(payload.price),
        category_id: Set(payload.category_id),
        image_url: Set(payload.image_url),
        created_date: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "book_create",
        "books",
        serde_json::json!({ "book_id": book.id }),
    )
    .await;

    let created = find_book(&state.orm, book.id).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Book created", created, Some(Meta::empty())))
}

pub async fn update_book(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_admin(user)?;
    let existing = Books::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: BookActive = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(author) = payload.author {
        active.author = Set(author);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        ensure_positive_price(price)?;
        active.price = Set(price);
    }
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(&state.orm, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }

    let book = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "book_update",
        "books",
        serde_json::json!({ "book_id": book.id }),
    )
    .await;

    let updated = find_book(&state.orm, book.id).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Updated", updated, Some(Meta::empty())))
}

/// Order details keep their own price/quantity copy, so deleting a book never
/// rewrites order history.
pub async fn delete_book(state: &AppState, user: &AuthUser, id: i32) -> AppResult<()> {
    ensure_admin(user)?;
    let result = Books::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "book_delete",
        "books",
        serde_json::json!({ "book_id": id }),
    )
    .await;

    Ok(())
}

#[derive(Debug, FromQueryResult)]
struct CategoryBookCount {
    category_id: i32,
    book_count: i64,
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let counts: HashMap<i32, i64> = Books::find()
        .select_only()
        .column(BookCol::CategoryId)
        .column_as(Expr::col((Books, BookCol::Id)).count(), "book_count")
        .group_by(BookCol::CategoryId)
        .into_model::<CategoryBookCount>()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| (row.category_id, row.book_count))
        .collect();

    let items = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|category| {
            let count = counts.get(&category.id).copied().unwrap_or(0);
            category_from_entity(category, Some(count))
        })
        .collect();

    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(Meta::empty())))
}

pub async fn get_category(state: &AppState, id: i32) -> AppResult<ApiResponse<Category>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let count = count_books_in_category(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Category",
        category_from_entity(category, Some(count)),
        None,
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let category = CategoryActive {
        id: NotSet,
        name: Set(payload.name.trim().to_owned()),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::on_unique_violation(err, "Category name is already taken"))?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category, Some(0)),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CategoryActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_owned());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }

    let category = active
        .update(&state.orm)
        .await
        .map_err(|err| AppError::on_unique_violation(err, "Category name is already taken"))?;
    let count = count_books_in_category(&state.orm, category.id).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        category_from_entity(category, Some(count)),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(state: &AppState, user: &AuthUser, id: i32) -> AppResult<()> {
    ensure_admin(user)?;
    if Categories::find_by_id(id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let count = count_books_in_category(&state.orm, id).await?;
    if count > 0 {
        return Err(AppError::Validation(format!(
            "Category still has {count} book(s)"
        )));
    }

    Categories::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(())
}

async fn count_books_in_category<C: ConnectionTrait>(conn: &C, category_id: i32) -> AppResult<i64> {
    let count = Books::find()
        .filter(BookCol::CategoryId.eq(category_id))
        .count(conn)
        .await?;
    Ok(count as i64)
}

async fn ensure_category_exists<C: ConnectionTrait>(conn: &C, category_id: i32) -> AppResult<()> {
    match Categories::find_by_id(category_id).one(conn).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!(
            "Category {category_id} does not exist"
        ))),
    }
}

fn ensure_positive_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::Validation("Price must be greater than 0".into()));
    }
    Ok(())
}

pub(crate) fn book_from_entity(model: BookModel, category: Option<CategoryModel>) -> Book {
    Book {
        id: model.id,
        title: model.title,
        author: model.author,
        description: model.description,
        price: model.price,
        category_id: model.category_id,
        image_url: model.image_url,
        created_date: model.created_date.with_timezone(&Utc),
        category: category.map(|c| category_from_entity(c, None)),
    }
}

pub(crate) fn category_from_entity(model: CategoryModel, book_count: Option<i64>) -> Category {
    Category {
        id: model.id,
        name: model.name,
        description: model.description,
        image_url: model.image_url,
        book_count,
    }
}
