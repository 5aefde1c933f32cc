use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Payment;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub order_id: i64,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentList {
    pub items: Vec<Payment>,
}
