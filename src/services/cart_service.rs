use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartItemDto, CartWithItems},
    entity::{
        cart_items::{self, Column as ItemCol, Entity as CartItems},
        carts::{self, Column as CartCol, Entity as Carts},
        products::Entity as Products,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_self_or_admin},
    models::{Cart, CartItem, Product},
    response::{ApiResponse, Meta},
    state::AppState,
    validation::validate_quantity,
};

/// Loads a user's cart with its lines. `None` means the user has no cart yet;
/// reading never creates one.
pub async fn find_cart<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<Option<CartWithItems>> {
    let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let items = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .order_by_asc(ItemCol::Id)
        .find_also_related(Products)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(item, product)| {
            product.map(|product| CartItemDto {
                id: item.id,
                product: Product::from(product),
                quantity: item.quantity,
            })
        })
        .collect();

    Ok(Some(CartWithItems {
        cart: Cart::from(cart),
        items,
    }))
}

pub async fn get_cart(
    state: &AppState,
    user: &AuthUser,
    user_id: i64,
) -> AppResult<ApiResponse<CartWithItems>> {
    ensure_self_or_admin(user, user_id)?;
    let resp = match find_cart(&state.orm, user_id).await? {
        Some(cart) => ApiResponse::success("Cart", cart, Some(Meta::empty())),
        None => ApiResponse::empty("Cart is empty."),
    };
    Ok(resp)
}

/// Adds a product to the user's cart, creating the cart on first use.
///
/// Both steps are upserts inside one transaction: the cart keys on `user_id`
/// and the line keys on `(cart_id, product_id)`, so a repeated add sums the
/// quantities into the existing line. The merged quantity is held to the same
/// bound as a single add. Stock is not consulted.
pub async fn add_item<C: TransactionTrait>(
    db: &C,
    payload: &AddToCartRequest,
) -> AppResult<cart_items::Model> {
    validate_quantity(payload.quantity)?;

    let txn = db.begin().await?;

    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Product"))?;
    Users::find_by_id(payload.user_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let cart = Carts::insert(carts::ActiveModel {
        id: NotSet,
        user_id: Set(payload.user_id),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(CartCol::UserId)
            .update_column(CartCol::UpdatedAt)
            .to_owned(),
    )
    .exec_with_returning(&txn)
    .await?;

    // The merged line must stay within the per-line bound.
    let existing = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .filter(ItemCol::ProductId.eq(product.id))
        .one(&txn)
        .await?;
    if let Some(line) = existing {
        validate_quantity(line.quantity.saturating_add(payload.quantity))?;
    }

    let item = CartItems::insert(cart_items::ActiveModel {
        id: NotSet,
        cart_id: Set(cart.id),
        product_id: Set(product.id),
        quantity: Set(payload.quantity),
    })
    .on_conflict(
        OnConflict::columns([ItemCol::CartId, ItemCol::ProductId])
            .value(
                ItemCol::Quantity,
                Expr::col((CartItems, ItemCol::Quantity)).add(payload.quantity),
            )
            .to_owned(),
    )
    .exec_with_returning(&txn)
    .await?;

    txn.commit().await?;
    Ok(item)
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_self_or_admin(user, payload.user_id)?;
    let item = add_item(&state.orm, &payload).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({
            "cart_id": item.cart_id,
            "product_id": item.product_id,
            "quantity": payload.quantity,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product added to cart.",
        CartItem::from(item),
        Some(Meta::empty()),
    ))
}

/// Removes a cart line by its own id.
pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    item_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let (item, cart) = CartItems::find_by_id(item_id)
        .find_also_related(Carts)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Cart item"))?;
    let cart = cart.ok_or(AppError::NotFound("Cart"))?;
    ensure_self_or_admin(user, cart.user_id)?;

    let result = CartItems::delete_by_id(item.id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Cart item"));
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": item.id, "product_id": item.product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product removed from cart.",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
