//! External product catalog (FakeStore-shaped JSON API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Stock credited for every imported product, on first insert and on each re-import.
pub const RESTOCK_QUANTITY: i32 = 100;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog responded with status {0}")]
    Status(u16),

    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExternalProduct {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// An external product normalized to the local product shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProduct {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

impl From<ExternalProduct> for NormalizedProduct {
    fn from(product: ExternalProduct) -> Self {
        Self {
            id: product.id,
            name: product.title,
            description: product.description,
            price: product.price,
            stock: RESTOCK_QUANTITY,
            image_url: product.image,
            category: product.category,
        }
    }
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<ExternalProduct>, CatalogError>;

    async fn fetch_product_by_id(&self, id: i64) -> Result<ExternalProduct, CatalogError>;

    async fn fetch_all_categories(&self) -> Result<Vec<String>, CatalogError>;

    async fn fetch_products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ExternalProduct>, CatalogError>;
}

pub struct HttpCatalog {
    client: Client,
    base_url: Url,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CatalogError> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|err| CatalogError::InvalidUrl(format!("{raw}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(raw));
        }
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, base_url })
    }

    /// `{base}/products/{segments..}`, each segment percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("products")
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, CatalogError> {
        let url = self.endpoint(segments)?;
        let response = self.client.get(url.clone()).send().await.map_err(|err| {
            tracing::warn!(%url, error = %err, "catalog request failed");
            CatalogError::from(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = %status, "catalog returned error status");
            return Err(CatalogError::Status(status.as_u16()));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalog {
    async fn fetch_products(&self) -> Result<Vec<ExternalProduct>, CatalogError> {
        self.get_json(&[]).await
    }

    async fn fetch_product_by_id(&self, id: i64) -> Result<ExternalProduct, CatalogError> {
        let id = id.to_string();
        self.get_json(&[id.as_str()]).await
    }

    async fn fetch_all_categories(&self) -> Result<Vec<String>, CatalogError> {
        self.get_json(&["categories"]).await
    }

    async fn fetch_products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ExternalProduct>, CatalogError> {
        self.get_json(&["category", category]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_fakestore_payload() {
        let raw = serde_json::json!({
            "id": 1,
            "title": "Fjallraven Backpack",
            "price": 109.95,
            "description": "Your perfect pack",
            "category": "men's clothing",
            "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
            "rating": { "rate": 3.9, "count": 120 }
        });
        let external: ExternalProduct = serde_json::from_value(raw).expect("decode");
        let product = NormalizedProduct::from(external);

        assert_eq!(product.id, 1);
        assert_eq!(product.name, "Fjallraven Backpack");
        assert_eq!(product.price, "109.95".parse::<Decimal>().unwrap());
        assert_eq!(product.stock, RESTOCK_QUANTITY);
        assert_eq!(product.category.as_deref(), Some("men's clothing"));
        assert_eq!(
            product.image_url.as_deref(),
            Some("https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg")
        );
    }

    #[test]
    fn trailing_slash_on_base_url_is_ignored() {
        let catalog = HttpCatalog::new("https://example.test/").expect("client");
        let url = catalog.endpoint(&["categories"]).expect("url");
        assert_eq!(url.as_str(), "https://example.test/products/categories");

        let nested = HttpCatalog::new("https://example.test/api/").expect("client");
        let url = nested.endpoint(&[]).expect("url");
        assert_eq!(url.as_str(), "https://example.test/api/products");
    }

    #[test]
    fn category_is_encoded_as_one_segment() {
        let catalog = HttpCatalog::new("https://example.test").expect("client");
        let url = catalog
            .endpoint(&["category", "men/women?sale#top"])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://example.test/products/category/men%2Fwomen%3Fsale%23top"
        );
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            HttpCatalog::new("not a url"),
            Err(CatalogError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpCatalog::new("mailto:shop@example.test"),
            Err(CatalogError::InvalidUrl(_))
        ));
    }
}
