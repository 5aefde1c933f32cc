mod common;

use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use storefront_api::{
    dto::{orders::UpdateOrderRequest, payments::CreatePaymentRequest},
    entity::{Orders, products},
    error::AppError,
    routes::params::OrderListQuery,
    services::{order_service, payment_service},
};

use common::{FakeCatalog, auth, create_product, create_user, db_state, dec};

// Place an order, check the frozen product snapshot, walk the status, pay,
// then delete.
#[tokio::test]
async fn order_lifecycle_keeps_snapshots_and_validates_status() -> anyhow::Result<()> {
    let Some(state) = db_state(FakeCatalog::default()).await? else {
        return Ok(());
    };

    let user = create_user(&state, false).await?;
    let admin = create_user(&state, true).await?;
    let shopper = auth(&user);
    let boss = auth(&admin);
    let product = create_product(&state, "Order Widget", "19.99", 5).await?;

    let created = order_service::create_order(
        &state,
        &shopper,
        json!({
            "user_id": user.id,
            "status": "Shipped",
            "total_amount": 39.98,
            "shipping_address": "1 Main St",
            "payment_method": "Paypal",
            "items": [{ "product_id": product.id, "quantity": 2 }]
        }),
    )
    .await?
    .data
    .expect("order data");
    assert_eq!(created.order.status, "Pending");
    assert_eq!(created.order.total_amount, dec("39.98"));
    assert_eq!(created.items.len(), 1);

    // Renaming the product must not reach the order line.
    let mut renamed: products::ActiveModel = product.clone().into();
    renamed.name = Set("Renamed Widget".into());
    renamed.update(&state.orm).await?;

    let fetched = order_service::get_order(&state, &shopper, created.order.id)
        .await?
        .data
        .expect("order data");
    let snapshot = fetched.items[0].product_info.clone().expect("snapshot");
    assert_eq!(snapshot.name, "Order Widget");
    assert_eq!(snapshot.price, dec("19.99"));

    let err = order_service::update_order(
        &state,
        &boss,
        created.order.id,
        UpdateOrderRequest {
            status: Some("Delivered".into()),
        },
    )
    .await
    .unwrap_err();
    match err {
        AppError::Validation(msg) => {
            assert!(msg.contains("Delivered"));
            for status in ["Completed", "Pending", "Shipped", "Cancelled"] {
                assert!(msg.contains(status), "message should list {status}");
            }
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    let unchanged = Orders::find_by_id(created.order.id)
        .one(&state.orm)
        .await?
        .expect("order still present");
    assert_eq!(unchanged.status, "Pending");

    let err = order_service::update_order(
        &state,
        &shopper,
        created.order.id,
        UpdateOrderRequest {
            status: Some("Shipped".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let shipped = order_service::update_order(
        &state,
        &boss,
        created.order.id,
        UpdateOrderRequest {
            status: Some("Shipped".into()),
        },
    )
    .await?
    .data
    .expect("order data");
    assert_eq!(shipped.order.status, "Shipped");

    let listed = order_service::list_orders(&state, &shopper, OrderListQuery::default())
        .await?
        .data
        .expect("order list");
    assert!(listed.items.iter().any(|o| o.order.id == created.order.id));
    assert!(listed.items.iter().all(|o| o.order.user_id == user.id));

    let transaction_id = format!("txn-{}", uuid::Uuid::new_v4());
    let payment = payment_service::create_payment(
        &state,
        &shopper,
        CreatePaymentRequest {
            order_id: created.order.id,
            amount: dec("39.98"),
            status: Some("Completed".into()),
            payment_method: Some("Paypal".into()),
            transaction_id: Some(transaction_id.clone()),
        },
    )
    .await?
    .data
    .expect("payment data");
    assert_eq!(payment.user_id, Some(user.id));

    let err = payment_service::create_payment(
        &state,
        &shopper,
        CreatePaymentRequest {
            order_id: created.order.id,
            amount: dec("1.00"),
            status: None,
            payment_method: None,
            transaction_id: Some(transaction_id),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let resp = order_service::delete_order(&state, &boss, created.order.id).await?;
    assert_eq!(resp.message, "Order cancelled and deleted.");
    assert!(Orders::find_by_id(created.order.id).one(&state.orm).await?.is_none());

    let err = order_service::delete_order(&state, &boss, created.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Order")));

    Ok(())
}
