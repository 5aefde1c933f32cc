mod common;

use storefront_api::{
    dto::cart::AddToCartRequest,
    error::AppError,
    services::cart_service,
    validation::MAX_QUANTITY,
};

use common::{FakeCatalog, auth, create_product, create_user, db_state};

// Two adds of the same product merge into one line; removal empties it; a
// missing product is a not-found and leaves the cart alone.
#[tokio::test]
async fn repeated_adds_merge_into_one_line() -> anyhow::Result<()> {
    let Some(state) = db_state(FakeCatalog::default()).await? else {
        return Ok(());
    };

    let user = create_user(&state, false).await?;
    let shopper = auth(&user);
    let product = create_product(&state, "Cart Widget", "12.50", 10).await?;

    let empty = cart_service::get_cart(&state, &shopper, user.id).await?;
    assert_eq!(empty.message, "Cart is empty.");
    assert!(empty.data.is_none());

    for _ in 0..2 {
        cart_service::add_to_cart(
            &state,
            &shopper,
            AddToCartRequest {
                user_id: user.id,
                product_id: product.id,
                quantity: 3,
            },
        )
        .await?;
    }

    let cart = cart_service::get_cart(&state, &shopper, user.id)
        .await?
        .data
        .expect("cart exists after add");
    assert_eq!(cart.cart.user_id, user.id);
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 6);
    assert_eq!(cart.items[0].product.id, product.id);

    let err = cart_service::add_to_cart(
        &state,
        &shopper,
        AddToCartRequest {
            user_id: user.id,
            product_id: i64::MAX,
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Product")));

    let err = cart_service::add_to_cart(
        &state,
        &shopper,
        AddToCartRequest {
            user_id: user.id,
            product_id: product.id,
            quantity: 0,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // A merge past the per-line bound is a validation error and leaves the line as it was.
    let err = cart_service::add_to_cart(
        &state,
        &shopper,
        AddToCartRequest {
            user_id: user.id,
            product_id: product.id,
            quantity: MAX_QUANTITY,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let unchanged = cart_service::find_cart(&state.orm, user.id)
        .await?
        .expect("cart exists");
    assert_eq!(unchanged.items[0].quantity, 6);

    cart_service::remove_from_cart(&state, &shopper, cart.items[0].id).await?;
    let after = cart_service::get_cart(&state, &shopper, user.id)
        .await?
        .data
        .expect("cart row survives removing its last line");
    assert!(after.items.is_empty());

    let err = cart_service::remove_from_cart(&state, &shopper, cart.items[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}
