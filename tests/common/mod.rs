#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, Set};
use storefront_api::{
    catalog::{CatalogError, CatalogProvider, ExternalProduct},
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{products, users},
    middleware::auth::AuthUser,
    state::AppState,
};
use uuid::Uuid;

/// In-memory catalog. `fail` makes every call answer like an unavailable upstream.
#[derive(Default, Clone)]
pub struct FakeCatalog {
    pub products: Vec<ExternalProduct>,
    pub fail: bool,
}

impl FakeCatalog {
    pub fn with(products: Vec<ExternalProduct>) -> Self {
        Self {
            products,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            products: Vec::new(),
            fail: true,
        }
    }

    fn check(&self) -> Result<(), CatalogError> {
        if self.fail {
            return Err(CatalogError::Status(503));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn fetch_products(&self) -> Result<Vec<ExternalProduct>, CatalogError> {
        self.check()?;
        Ok(self.products.clone())
    }

    async fn fetch_product_by_id(&self, id: i64) -> Result<ExternalProduct, CatalogError> {
        self.check()?;
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(CatalogError::Status(404))
    }

    async fn fetch_all_categories(&self) -> Result<Vec<String>, CatalogError> {
        self.check()?;
        let mut categories: Vec<String> = self
            .products
            .iter()
            .filter_map(|p| p.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn fetch_products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ExternalProduct>, CatalogError> {
        self.check()?;
        Ok(self
            .products
            .iter()
            .filter(|p| p.category.as_deref() == Some(category))
            .cloned()
            .collect())
    }
}

pub fn external(id: i64, title: &str, price: &str, category: &str) -> ExternalProduct {
    ExternalProduct {
        id,
        title: title.to_string(),
        description: Some(format!("{title} description")),
        price: dec(price),
        category: Some(category.to_string()),
        image: Some(format!("https://img.example.com/{id}.png")),
    }
}

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "integration-secret".into(),
        jwt_ttl_hours: 1,
        catalog_base_url: "http://catalog.invalid".into(),
    }
}

/// State that never reaches a database; handlers that touch it fail.
pub fn offline_state(catalog: FakeCatalog) -> AppState {
    AppState {
        orm: DatabaseConnection::Disconnected,
        config: Arc::new(test_config()),
        catalog: Arc::new(catalog),
    }
}

/// Database-backed state, or `None` when no database is configured.
pub async fn db_state(catalog: FakeCatalog) -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run it.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    Ok(Some(AppState {
        orm,
        config: Arc::new(test_config()),
        catalog: Arc::new(catalog),
    }))
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState, is_admin: bool) -> anyhow::Result<users::Model> {
    let user = users::ActiveModel {
        id: NotSet,
        username: Set(if is_admin { "admin" } else { "shopper" }.to_string()),
        email: Set(unique_email(if is_admin { "admin" } else { "user" })),
        password_hash: Set("not-a-real-hash".into()),
        is_admin: Set(is_admin),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user)
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: &str,
    stock: i32,
) -> anyhow::Result<products::Model> {
    let product = products::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        description: Set(Some(format!("{name} for tests"))),
        price: Set(dec(price)),
        stock: Set(stock),
        image_url: Set(None),
        category: Set(Some("testing".into())),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub fn auth(user: &users::Model) -> AuthUser {
    AuthUser {
        user_id: user.id,
        is_admin: user.is_admin,
    }
}

/// Ids far above anything the serial sequence hands out in a test database.
pub fn unique_external_id_base() -> i64 {
    900_000_000 + (Uuid::new_v4().as_u128() % 10_000_000) as i64 * 10
}
