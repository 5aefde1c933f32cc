mod common;

use serde_json::json;
use storefront_api::{error::AppError, routes::params::OrderListQuery, services::order_service};

use common::{FakeCatalog, auth, create_user, db_state};

// A missing product aborts the whole order; an empty item list is still an order.
#[tokio::test]
async fn order_with_unknown_product_is_rolled_back() -> anyhow::Result<()> {
    let Some(state) = db_state(FakeCatalog::default()).await? else {
        return Ok(());
    };

    let user = create_user(&state, false).await?;
    let shopper = auth(&user);

    let err = order_service::create_order(
        &state,
        &shopper,
        json!({
            "user_id": user.id,
            "total_amount": 5,
            "shipping_address": "2 Side St",
            "payment_method": "Cash",
            "items": [{ "product_id": i64::MAX, "quantity": 1 }]
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Product")));

    let listed = order_service::list_orders(&state, &shopper, OrderListQuery::default())
        .await?
        .data
        .expect("order list");
    assert!(listed.items.is_empty());

    let empty = order_service::create_order(
        &state,
        &shopper,
        json!({
            "user_id": user.id,
            "total_amount": 0,
            "shipping_address": "2 Side St",
            "payment_method": "Cash",
            "items": []
        }),
    )
    .await?
    .data
    .expect("order data");
    assert!(empty.items.is_empty());

    Ok(())
}
