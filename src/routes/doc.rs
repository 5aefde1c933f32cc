use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    catalog::ExternalProduct,
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartItemDto, CartWithItems},
        catalog::{CategoryList, ExternalProductList, ImportSummary},
        orders::{CreateOrderRequest, OrderItemInput, OrderList, OrderWithItems, UpdateOrderRequest},
        payments::{CreatePaymentRequest, PaymentList, UpdatePaymentRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        users::{UpdateUserRequest, UserList},
    },
    models::{Cart, CartItem, Order, OrderItem, Payment, Product, ProductSnapshot, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, catalog, health, orders, params, payments, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::admin_login,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        catalog::list_products,
        catalog::get_product,
        catalog::list_categories,
        catalog::products_by_category,
        cart::get_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        payments::create_payment,
        admin::list_users,
        admin::get_user,
        admin::update_user,
        admin::delete_user,
        admin::list_payments,
        admin::get_payment,
        admin::update_payment,
        admin::import_products
    ),
    components(
        schemas(
            User,
            Product,
            ProductSnapshot,
            Cart,
            CartItem,
            Order,
            OrderItem,
            Payment,
            ExternalProduct,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            CartItemDto,
            CartWithItems,
            CreateOrderRequest,
            OrderItemInput,
            UpdateOrderRequest,
            OrderWithItems,
            OrderList,
            CreatePaymentRequest,
            UpdatePaymentRequest,
            PaymentList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            UpdateUserRequest,
            UserList,
            ImportSummary,
            ExternalProductList,
            CategoryList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartWithItems>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Payment>,
            ApiResponse<ImportSummary>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Products", description = "Product endpoints"),
        (name = "Catalog", description = "External catalog passthrough"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payments", description = "Payment endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/register",
            "/api/products/{id}",
            "/api/catalog/categories/{name}",
            "/api/cart/{item_id}",
            "/api/orders",
            "/api/payments",
            "/api/admin/products/import",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
