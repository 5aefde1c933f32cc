use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};

use crate::{
    dto::cart::{AddToCartRequest, CartQuery, CartWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart))
        .route("/{item_id}", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(("user_id" = i64, Query, description = "Cart owner")),
    responses(
        (status = 200, description = "Cart with items; data is null when the user has no cart", body = ApiResponse<CartWithItems>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CartQuery>,
) -> AppResult<Json<ApiResponse<CartWithItems>>> {
    let resp = cart_service::get_cart(&state, &user, query.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add or merge cart item", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Product or user not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{item_id}",
    params(("item_id" = i64, Path, description = "Cart item ID")),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::remove_from_cart(&state, &user, item_id).await?;
    Ok(Json(resp))
}
