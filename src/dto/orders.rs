use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem};

/// Typed view of an order payload once `validate_order_data` has accepted it.
/// Any `status` the caller sends is ignored; orders always start as `Pending`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub shipping_address: String,
    pub payment_method: String,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}
