use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::orders::{OrderList, OrderWithDetails, UpdateOrderStatusRequest},
    entity::{
        order_details::{
            ActiveModel as DetailActive, Column as DetailCol, Entity as OrderDetails,
            Model as DetailModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        sea_orm_active_enums::OrderStatus,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, current_user, ensure_admin, ensure_self_or_admin},
    models::{Order, OrderDetail},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service::{load_cart, store_cart},
    state::AppState,
};

/// Turn the session's cart into an order.
///
/// The order header and its detail rows are written in one transaction. The cart is
/// cleared only once that transaction has committed; on any failure it is left as is.
/// Totals use the prices captured in the cart lines.
pub async fn place_order(
    state: &AppState,
    session_id: &str,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    let user = current_user(&state.sessions, session_id).ok_or(AppError::Unauthorized)?;

    let _guard = state.sessions.lock(session_id).await;
    let mut cart = load_cart(&state.sessions, session_id)?;
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let total_amount = cart.total();
    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: NotSet,
        user_id: Set(user.user_id),
        order_date: Set(Utc::now().into()),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
    }
    .insert(&txn)
    .await?;

    let mut details: Vec<OrderDetail> = Vec::with_capacity(cart.len());
    for line in cart.items() {
        let detail = DetailActive {
            id: NotSet,
            order_id: Set(order.id),
            book_id: Set(line.book_id),
            quantity: Set(line.quantity),
            price: Set(line.price),
        }
        .insert(&txn)
        .await?;

        details.push(detail_from_entity(detail));
    }

    txn.commit().await?;

    cart.clear();
    store_cart(&state.sessions, session_id, &cart)?;

    tracing::info!(
        order_id = order.id,
        user_id = user.user_id,
        total = %order.total_amount,
        lines = details.len(),
        "order placed"
    );

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_place",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithDetails {
            order: order_from_entity(order),
            details,
        },
        Some(Meta::empty()),
    ))
}

/// Admins see every order and may filter by user; everybody else sees their own.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if user.is_admin() {
        if let Some(user_id) = query.user_id {
            condition = condition.add(OrderCol::UserId.eq(user_id));
        }
    } else {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder
            .order_by_asc(OrderCol::OrderDate)
            .order_by_asc(OrderCol::Id),
        SortOrder::Desc => finder
            .order_by_desc(OrderCol::OrderDate)
            .order_by_desc(OrderCol::Id),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = attach_details(&state.orm, orders).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn list_orders_by_user(
    state: &AppState,
    user: &AuthUser,
    user_id: i32,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_self_or_admin(user, user_id)?;

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .order_by_desc(OrderCol::OrderDate)
        .order_by_desc(OrderCol::Id)
        .all(&state.orm)
        .await?;
    let total = orders.len() as i64;
    let items = attach_details(&state.orm, orders).await?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::unpaged(total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    // Someone else's order looks the same as a missing one.
    if ensure_self_or_admin(user, order.user_id).is_err() {
        return Err(AppError::NotFound);
    }

    let details = load_details(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithDetails {
            order: order_from_entity(order),
            details,
        },
        Some(Meta::empty()),
    ))
}

/// Only `Pending` orders can move, and only to `Completed` or `Cancelled`.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = order.status;
    if !current.can_transition_to(payload.status) {
        return Err(AppError::Validation(format!(
            "Cannot change order status from {} to {}",
            current.as_str(),
            payload.status.as_str()
        )));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status);
    let order = active.update(&txn).await?;
    let details = load_details(&txn, order.id).await?;

    txn.commit().await?;

    tracing::info!(
        order_id = order.id,
        from = current.as_str(),
        to = order.status.as_str(),
        "order status changed"
    );

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "from": current.as_str(),
            "to": order.status.as_str(),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order status updated",
        OrderWithDetails {
            order: order_from_entity(order),
            details,
        },
        Some(Meta::empty()),
    ))
}

async fn load_details<C: ConnectionTrait>(conn: &C, order_id: i32) -> AppResult<Vec<OrderDetail>> {
    let details = OrderDetails::find()
        .filter(DetailCol::OrderId.eq(order_id))
        .order_by_asc(DetailCol::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(detail_from_entity)
        .collect();
    Ok(details)
}

async fn attach_details<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithDetails>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<i32, Vec<OrderDetail>> = HashMap::new();
    for detail in OrderDetails::find()
        .filter(DetailCol::OrderId.is_in(ids))
        .order_by_asc(DetailCol::Id)
        .all(conn)
        .await?
    {
        by_order
            .entry(detail.order_id)
            .or_default()
            .push(detail_from_entity(detail));
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderWithDetails {
            details: by_order.remove(&order.id).unwrap_or_default(),
            order: order_from_entity(order),
        })
        .collect())
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        order_date: model.order_date.with_timezone(&Utc),
        total_amount: model.total_amount,
        status: model.status,
    }
}

fn detail_from_entity(model: DetailModel) -> OrderDetail {
    OrderDetail {
        id: model.id,
        order_id: model.order_id,
        book_id: model.book_id,
        quantity: model.quantity,
        price: model.price,
    }
}
