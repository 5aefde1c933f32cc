use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::payments::CreatePaymentRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Payment,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_payment))
}

#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Record a payment for an order", body = ApiResponse<Payment>),
        (status = 400, description = "Invalid amount, status or method"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Duplicate transaction id")
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Payment>>)> {
    let resp = payment_service::create_payment(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
