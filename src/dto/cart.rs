use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Cart, Product};

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub user_id: i64,
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartQuery {
    pub user_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartWithItems {
    pub cart: Cart,
    pub items: Vec<CartItemDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDto {
    pub id: i64,
    pub product: Product,
    pub quantity: i32,
}
