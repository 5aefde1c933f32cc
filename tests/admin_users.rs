mod common;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use storefront_api::{
    dto::{
        auth::{LoginRequest, RegisterRequest},
        cart::AddToCartRequest,
        products::CreateProductRequest,
        users::UpdateUserRequest,
    },
    entity::{
        CartItems, Carts, OrderItems, Orders, Products, cart_items, carts, order_items, orders,
    },
    error::AppError,
    services::{auth_service, cart_service, order_service, product_service, user_service},
};

use common::{FakeCatalog, auth, create_user, db_state, dec, unique_email};

// Register, log in, create a product as admin, then delete the shopper and
// check that only their own rows went with them.
#[tokio::test]
async fn admin_manages_users_and_products() -> anyhow::Result<()> {
    let Some(state) = db_state(FakeCatalog::default()).await? else {
        return Ok(());
    };

    let email = unique_email("register");
    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "new_shopper".into(),
            email: email.clone(),
            password: "correct horse".into(),
        },
    )
    .await?
    .data
    .expect("user data");
    assert!(!registered.is_admin);

    let err = auth_service::register_user(
        &state,
        RegisterRequest {
            username: "new_shopper".into(),
            email: email.clone(),
            password: "correct horse".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_) | AppError::Conflict(_)));

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "correct horse".into(),
        },
    )
    .await?
    .data
    .expect("login data");
    assert_eq!(login.user_id, registered.id);
    assert!(!login.access_token.is_empty());

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "wrong".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = auth_service::login_admin(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "correct horse".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(ref msg) if msg == "Invalid admin credentials"));

    let admin = create_user(&state, true).await?;
    let boss = auth(&admin);

    let product = product_service::create_product(
        &state,
        &boss,
        CreateProductRequest {
            name: "Sample Product".into(),
            description: "This is a sample product".into(),
            price: dec("19.99"),
            stock: 100,
            image_url: "http://example.com/sample.png".into(),
            category: "Sample Category".into(),
        },
    )
    .await?
    .data
    .expect("product data");
    assert!(product.is_active);
    assert_eq!(product.price, dec("19.99"));

    let err = product_service::create_product(
        &state,
        &boss,
        CreateProductRequest {
            name: "Free Lunch".into(),
            description: "Costs nothing".into(),
            price: Decimal::ZERO,
            stock: 1,
            image_url: String::new(),
            category: "food".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Below one cent would round to 0.00 in the store; it is rejected up front.
    let err = product_service::create_product(
        &state,
        &boss,
        CreateProductRequest {
            name: "Tiny".into(),
            description: "Costs almost nothing".into(),
            price: dec("0.001"),
            stock: 1,
            image_url: String::new(),
            category: "food".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let shopper = auth(&create_user(&state, false).await?);
    cart_service::add_to_cart(
        &state,
        &shopper,
        AddToCartRequest {
            user_id: shopper.user_id,
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;
    let placed = order_service::create_order(
        &state,
        &shopper,
        json!({
            "user_id": shopper.user_id,
            "total_amount": 19.99,
            "shipping_address": "3 Elm St",
            "payment_method": "Stripe",
            "items": [{ "product_id": product.id, "quantity": 1 }]
        }),
    )
    .await?
    .data
    .expect("order data");
    let cart = cart_service::find_cart(&state.orm, shopper.user_id)
        .await?
        .expect("cart exists");
    let products_before = Products::find().count(&state.orm).await?;

    let deactivated = user_service::update_user(
        &state,
        &boss,
        shopper.user_id,
        UpdateUserRequest {
            is_admin: None,
            is_active: Some(false),
        },
    )
    .await?
    .data
    .expect("user data");
    assert!(!deactivated.is_active);

    let err = user_service::delete_user(&state, &shopper, admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    user_service::delete_user(&state, &boss, shopper.user_id).await?;

    let carts_left = Carts::find()
        .filter(carts::Column::UserId.eq(shopper.user_id))
        .count(&state.orm)
        .await?;
    let orders_left = Orders::find()
        .filter(orders::Column::UserId.eq(shopper.user_id))
        .count(&state.orm)
        .await?;
    let cart_items_left = CartItems::find()
        .filter(cart_items::Column::CartId.eq(cart.cart.id))
        .count(&state.orm)
        .await?;
    let order_items_left = OrderItems::find()
        .filter(order_items::Column::OrderId.eq(placed.order.id))
        .count(&state.orm)
        .await?;
    assert_eq!(carts_left, 0);
    assert_eq!(cart_items_left, 0);
    assert_eq!(orders_left, 0);
    assert_eq!(order_items_left, 0);
    assert!(Products::find_by_id(product.id).one(&state.orm).await?.is_some());
    assert_eq!(Products::find().count(&state.orm).await?, products_before);

    let err = user_service::get_user(&state, &boss, shopper.user_id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("User")));

    Ok(())
}
