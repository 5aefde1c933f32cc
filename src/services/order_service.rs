use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderRequest},
    entity::{
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::{self, ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::Entity as Products,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_self_or_admin},
    models::{Order, OrderItem, ProductSnapshot},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    validation::{
        DEFAULT_ORDER_STATUS, ValidationError, validate_order_data, validate_order_status,
        validate_quantity,
    },
};

/// Checks a raw order payload and turns it into the typed request.
pub fn parse_order_payload(payload: Value) -> AppResult<CreateOrderRequest> {
    validate_order_data(&payload)?;
    let request: CreateOrderRequest = serde_json::from_value(payload)
        .map_err(|err| ValidationError(format!("Invalid order payload: {err}")))?;
    for item in &request.items {
        validate_quantity(item.quantity)?;
    }
    Ok(request)
}

/// Inserts the order and its lines in one transaction.
///
/// The order always starts as `Pending`, whatever status the caller sent, and
/// `total_amount` is stored as given rather than recomputed. Each line freezes
/// the referenced product into `product_info`; a missing product aborts the
/// whole order.
pub async fn place_order<C: TransactionTrait>(
    db: &C,
    request: CreateOrderRequest,
) -> AppResult<OrderWithItems> {
    let txn = db.begin().await?;

    Users::find_by_id(request.user_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let order = OrderActive {
        id: NotSet,
        user_id: Set(request.user_id),
        status: Set(DEFAULT_ORDER_STATUS.to_string()),
        total_amount: Set(request.total_amount),
        shipping_address: Set(request.shipping_address),
        payment_method: Set(request.payment_method),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(request.items.len());
    for line in request.items {
        let product = Products::find_by_id(line.product_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound("Product"))?;

        let mut active = order_items::ActiveModel {
            id: NotSet,
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            quantity: Set(line.quantity),
            product_info: NotSet,
        };
        active.set_product_info(&ProductSnapshot::from(&product));
        items.push(OrderItem::from(active.insert(&txn).await?));
    }

    txn.commit().await?;

    Ok(OrderWithItems {
        order: Order::from(order),
        items,
    })
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: Value,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let request = parse_order_payload(payload)?;
    ensure_self_or_admin(user, request.user_id)?;

    let created = place_order(&state.orm, request).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_create",
        "orders",
        serde_json::json!({
            "order_id": created.order.id,
            "items": created.items.len(),
        }),
    )
    .await;

    Ok(ApiResponse::success("Order created", created, Some(Meta::empty())))
}

/// Overwrites the status and nothing else. Any valid status may follow any
/// other; there is no transition table.
pub async fn change_status<C: ConnectionTrait>(
    db: &C,
    id: i64,
    payload: UpdateOrderRequest,
) -> AppResult<orders::Model> {
    if let Some(status) = payload.status.as_deref() {
        validate_order_status(status)?;
    }

    let existing = Orders::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let Some(status) = payload.status else {
        return Ok(existing);
    };

    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    Ok(active.update(db).await?)
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = change_status(&state.orm, id, payload).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Order updated", data, Some(Meta::empty())))
}

/// Hard delete; order lines go with the order.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Orders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Order"));
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled and deleted.",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    match query.user_id {
        Some(user_id) => {
            ensure_self_or_admin(user, user_id)?;
            condition = condition.add(OrderCol::UserId.eq(user_id));
        }
        None if user.is_admin => {}
        None => condition = condition.add(OrderCol::UserId.eq(user.user_id)),
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(orders.len());
    for order in orders {
        items.push(with_items(&state.orm, order).await?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    ensure_self_or_admin(user, order.user_id)?;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn with_items<C: ConnectionTrait>(db: &C, order: orders::Model) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::Id)
        .all(db)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(OrderWithItems {
        order: Order::from(order),
        items,
    })
}
