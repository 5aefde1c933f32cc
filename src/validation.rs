//! Field and payload checks run before anything is written.
//!
//! Every check returns `Ok(())` or a [`ValidationError`] carrying a message fit
//! for the client. None of them touch state, except [`validate_email`] which
//! reads the users table to report a taken address early.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::Value;
use thiserror::Error;

use crate::{
    entity::users::{Column as UserCol, Entity as Users},
    error::AppResult,
};

pub const ORDER_STATUSES: [&str; 4] = ["Completed", "Pending", "Shipped", "Cancelled"];
pub const DEFAULT_ORDER_STATUS: &str = "Pending";
pub const PAYMENT_STATUSES: [&str; 3] = ["Pending", "Completed", "Failed"];
pub const PAYMENT_METHODS: [&str; 4] = ["Credit Card", "Paypal", "Stripe", "Bank Transfer"];

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9.-]+$").unwrap());

static IMAGE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b[-a-zA-Z0-9()@:%_+.~#?&/=]*$",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type Validation = Result<(), ValidationError>;

pub fn validate_username(username: &str) -> Validation {
    if username.chars().count() < 3 {
        return Err(ValidationError::new(
            "Username must be at least 3 characters long!",
        ));
    }
    Ok(())
}

pub fn validate_email_format(email: &str) -> Validation {
    if email.is_empty() {
        return Err(ValidationError::new("Email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::new("Invalid email format!"));
    }
    Ok(())
}

/// Format check plus an early uniqueness lookup. The unique index on
/// `users.email` still decides races between concurrent registrations.
pub async fn validate_email<C: ConnectionTrait>(db: &C, email: &str) -> AppResult<()> {
    validate_email_format(email)?;
    let taken = Users::find()
        .filter(UserCol::Email.eq(email))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(ValidationError::new("Email address already exists!").into());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Validation {
    if password.chars().count() < 6 {
        return Err(ValidationError::new(
            "Password must be at least 6 characters long!",
        ));
    }
    Ok(())
}

pub fn validate_product_name(name: &str) -> Validation {
    if name.trim().chars().count() < 2 {
        return Err(ValidationError::new(
            "Product name cannot be less than 2 characters!",
        ));
    }
    Ok(())
}

/// Largest whole-quantity a single cart or order line may hold.
pub const MAX_QUANTITY: i32 = 10_000;

/// Money columns are `NUMERIC(12, 2)`.
const MONEY_SCALE: u32 = 2;
const MONEY_MAX: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

// Checks what the money columns can hold exactly, so the store never rounds a
// positive amount down to zero or overflows.
fn check_money(amount: Decimal, label: &str) -> Validation {
    if amount <= Decimal::ZERO {
        return Err(ValidationError(format!("{label} must be greater than 0!")));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError(format!(
            "{label} cannot have more than {MONEY_SCALE} decimal places."
        )));
    }
    if amount > MONEY_MAX {
        return Err(ValidationError(format!("{label} cannot exceed {MONEY_MAX}.")));
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Validation {
    check_money(price, "Product price")
}

pub fn validate_stock(stock: i32) -> Validation {
    if stock < 0 {
        return Err(ValidationError::new("Stock cannot be negative!"));
    }
    Ok(())
}

/// An absent or empty URL is accepted.
pub fn validate_image(image_url: Option<&str>) -> Validation {
    match image_url {
        Some(url) if !url.is_empty() && !IMAGE_URL_RE.is_match(url) => {
            Err(ValidationError::new("Invalid image URL format."))
        }
        _ => Ok(()),
    }
}

pub fn validate_quantity(quantity: i32) -> Validation {
    if quantity < 1 {
        return Err(ValidationError::new("Quantity must be at least 1."));
    }
    if quantity > MAX_QUANTITY {
        return Err(ValidationError(format!(
            "Quantity cannot exceed {MAX_QUANTITY}."
        )));
    }
    Ok(())
}

pub fn validate_order_status(status: &str) -> Validation {
    check_membership("status", status, &ORDER_STATUSES)
}

pub fn validate_payment_status(status: &str) -> Validation {
    check_membership("payment status", status, &PAYMENT_STATUSES)
}

pub fn validate_payment_method(method: Option<&str>) -> Validation {
    match method {
        Some(method) => check_membership("payment method", method, &PAYMENT_METHODS),
        None => Ok(()),
    }
}

pub fn validate_payment_amount(amount: Decimal) -> Validation {
    check_money(amount, "Amount")
}

fn check_membership(field: &str, value: &str, allowed: &[&str]) -> Validation {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(ValidationError(format!(
        "Invalid {field} '{value}'. Valid values are: {}",
        allowed.join(", ")
    )))
}

/// Shape check for a raw order payload, run before it is deserialized.
///
/// `user_id` must be a JSON integer (a numeric string such as `"5"` is
/// rejected), `status` defaults to `Pending` and must be a known literal, and
/// `items` must be an array, possibly empty.
pub fn validate_order_data(order: &Value) -> Validation {
    let Some(fields) = order.as_object() else {
        return Err(ValidationError::new("Order payload must be a JSON object."));
    };

    let user_id_ok = fields
        .get("user_id")
        .is_some_and(|v| v.is_i64() || v.is_u64());
    if !user_id_ok {
        return Err(ValidationError::new(
            "User ID is required and must be an integer.",
        ));
    }

    match fields.get("status") {
        None => validate_order_status(DEFAULT_ORDER_STATUS)?,
        Some(Value::String(status)) => validate_order_status(status)?,
        Some(other) => validate_order_status(&other.to_string())?,
    }

    if !fields.get("items").is_some_and(Value::is_array) {
        return Err(ValidationError::new("Order items must be a list."));
    }

    Ok(())
}
