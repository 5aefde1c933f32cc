use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    catalog::ExternalProduct,
    dto::catalog::{CategoryList, ExternalProductList},
    error::AppResult,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/categories", get(list_categories))
        .route("/categories/{name}", get(products_by_category))
}

#[utoipa::path(
    get,
    path = "/api/catalog/products",
    responses(
        (status = 200, description = "Products from the external catalog", body = ApiResponse<ExternalProductList>),
        (status = 502, description = "Catalog unavailable")
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ExternalProductList>>> {
    Ok(Json(catalog_service::list_external_products(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/catalog/products/{id}",
    params(("id" = i64, Path, description = "External product ID")),
    responses(
        (status = 200, description = "One external product", body = ApiResponse<ExternalProduct>),
        (status = 502, description = "Catalog unavailable")
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<ExternalProduct>>> {
    Ok(Json(catalog_service::get_external_product(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/catalog/categories",
    responses(
        (status = 200, description = "External catalog categories", body = ApiResponse<CategoryList>),
        (status = 502, description = "Catalog unavailable")
    ),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(catalog_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/catalog/categories/{name}",
    params(("name" = String, Path, description = "Category name")),
    responses(
        (status = 200, description = "External products in a category", body = ApiResponse<ExternalProductList>),
        (status = 502, description = "Catalog unavailable")
    ),
    tag = "Catalog"
)]
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<ApiResponse<ExternalProductList>>> {
    Ok(Json(catalog_service::products_by_category(&state, &name).await?))
}
