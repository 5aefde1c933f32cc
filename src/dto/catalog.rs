use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::ExternalProduct;

#[derive(Debug, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct ImportSummary {
    pub fetched: usize,
    pub inserted: usize,
    pub restocked: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ExternalProductList {
    #[schema(value_type = Vec<ExternalProduct>)]
    pub items: Vec<ExternalProduct>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    pub items: Vec<String>,
}
