use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::{
    audit,
    dto::favorites::{AddFavoriteRequest, FavoriteList, FavoriteStatus},
    entity::{
        books::Entity as Books,
        categories::{Column as CatCol, Entity as Categories},
        favorites::{
            ActiveModel as FavoriteActive, Column as FavCol, Entity as Favorites,
            Model as FavoriteModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_self_or_admin},
    models::{Book, Favorite},
    response::{ApiResponse, Meta},
    services::catalog_service::{book_from_entity, find_book},
    state::AppState,
};

/// Uniqueness of (user, book) is enforced by the `uq_favorites_user_book` index, so
/// two concurrent adds of the same pair cannot both succeed.
pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: AddFavoriteRequest,
) -> AppResult<ApiResponse<Favorite>> {
    ensure_self_or_admin(user, payload.user_id)?;

    let book = find_book(&state.orm, payload.book_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let favorite = FavoriteActive {
        id: NotSet,
        user_id: Set(payload.user_id),
        book_id: Set(payload.book_id),
        created_date: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::on_unique_violation(err, "Book is already in favorites"))?;

    tracing::debug!(user_id = favorite.user_id, book_id = favorite.book_id, "favorite added");

    audit::record(
        &state.orm,
        Some(user.user_id),
        "favorite_add",
        "favorites",
        serde_json::json!({ "favorite_id": favorite.id, "book_id": favorite.book_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to favorites",
        favorite_from_entity(favorite, Some(book)),
        Some(Meta::empty()),
    ))
}

pub async fn remove_favorite(state: &AppState, user: &AuthUser, id: i32) -> AppResult<()> {
    let favorite = Favorites::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_self_or_admin(user, favorite.user_id)?;

    let result = Favorites::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "favorite_remove",
        "favorites",
        serde_json::json!({ "favorite_id": id, "book_id": favorite.book_id }),
    )
    .await;

    Ok(())
}

/// Favorites of one user, newest first, each with its book and the book's category.
pub async fn list_by_user(
    state: &AppState,
    user: &AuthUser,
    user_id: i32,
) -> AppResult<ApiResponse<FavoriteList>> {
    ensure_self_or_admin(user, user_id)?;

    let rows = Favorites::find()
        .filter(FavCol::UserId.eq(user_id))
        .order_by_desc(FavCol::CreatedDate)
        .order_by_desc(FavCol::Id)
        .find_also_related(Books)
        .all(&state.orm)
        .await?;

    let category_ids: Vec<i32> = rows
        .iter()
        .filter_map(|(_, book)| book.as_ref().map(|b| b.category_id))
        .collect();
    let categories = if category_ids.is_empty() {
        Vec::new()
    } else {
        Categories::find()
            .filter(CatCol::Id.is_in(category_ids))
            .all(&state.orm)
            .await?
    };

    let items: Vec<Favorite> = rows
        .into_iter()
        .map(|(favorite, book)| {
            let book = book.map(|b| {
                let category = categories.iter().find(|c| c.id == b.category_id).cloned();
                book_from_entity(b, category)
            });
            favorite_from_entity(favorite, book)
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        FavoriteList { items },
        Some(Meta::unpaged(total)),
    ))
}

pub async fn favorite_status(
    state: &AppState,
    user: &AuthUser,
    user_id: i32,
    book_id: i32,
) -> AppResult<ApiResponse<FavoriteStatus>> {
    ensure_self_or_admin(user, user_id)?;

    let favorite = Favorites::find()
        .filter(FavCol::UserId.eq(user_id))
        .filter(FavCol::BookId.eq(book_id))
        .one(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "OK",
        FavoriteStatus {
            is_favorite: favorite.is_some(),
            favorite_id: favorite.map(|f| f.id),
        },
        None,
    ))
}

fn favorite_from_entity(model: FavoriteModel, book: Option<Book>) -> Favorite {
    Favorite {
        id: model.id,
        user_id: model.user_id,
        book_id: model.book_id,
        created_date: model.created_date.with_timezone(&Utc),
        book,
    }
}
