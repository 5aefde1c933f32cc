use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::{
    audit,
    dto::payments::{CreatePaymentRequest, PaymentList, UpdatePaymentRequest},
    entity::{
        orders::Entity as Orders,
        payments::{self, ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_self_or_admin},
    models::Payment,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    validation::{validate_payment_amount, validate_payment_method, validate_payment_status},
};

const DEFAULT_PAYMENT_STATUS: &str = "Pending";

/// Records a payment against an existing order. The paying user is taken from
/// the order. A reused `transaction_id` is rejected by the unique index and
/// surfaces as a conflict.
pub async fn record_payment<C: ConnectionTrait>(
    db: &C,
    payload: CreatePaymentRequest,
) -> AppResult<payments::Model> {
    validate_payment_amount(payload.amount)?;
    let status = payload
        .status
        .unwrap_or_else(|| DEFAULT_PAYMENT_STATUS.to_string());
    validate_payment_status(&status)?;
    validate_payment_method(payload.payment_method.as_deref())?;

    let order = Orders::find_by_id(payload.order_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let transaction_id = payload.transaction_id.filter(|id| !id.is_empty());
    if let Some(id) = transaction_id.as_deref() {
        let taken = Payments::find()
            .filter(PaymentCol::TransactionId.eq(id))
            .count(db)
            .await?;
        if taken > 0 {
            return Err(AppError::Conflict(format!(
                "transaction id '{id}' already recorded"
            )));
        }
    }

    let payment = PaymentActive {
        id: NotSet,
        order_id: Set(Some(order.id)),
        user_id: Set(Some(order.user_id)),
        amount: Set(payload.amount),
        status: Set(status),
        payment_method: Set(payload.payment_method),
        transaction_id: Set(transaction_id),
        payment_date: NotSet,
    }
    .insert(db)
    .await?;

    Ok(payment)
}

pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    let order = Orders::find_by_id(payload.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    ensure_self_or_admin(user, order.user_id)?;

    let payment = record_payment(&state.orm, payload).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "payment_create",
        "payments",
        serde_json::json!({ "payment_id": payment.id, "order_id": payment.order_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment recorded",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}

pub async fn list_payments(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PaymentList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Payments::find().order_by_desc(PaymentCol::PaymentDate);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Payment::from)
        .collect();

    Ok(ApiResponse::success(
        "Payments",
        PaymentList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_payment(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<Payment>> {
    ensure_admin(user)?;
    let payment = Payments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Payment"))?;
    Ok(ApiResponse::success("Payment", Payment::from(payment), Some(Meta::empty())))
}

pub async fn update_payment_status(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdatePaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    ensure_admin(user)?;
    if let Some(status) = payload.status.as_deref() {
        validate_payment_status(status)?;
    }

    let existing = Payments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Payment"))?;

    let payment = match payload.status {
        Some(status) => {
            let mut active: PaymentActive = existing.into();
            active.status = Set(status);
            active.update(&state.orm).await?
        }
        None => existing,
    };

    audit::record(
        &state.orm,
        Some(user.user_id),
        "payment_status_update",
        "payments",
        serde_json::json!({ "payment_id": payment.id, "status": payment.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment updated",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}
