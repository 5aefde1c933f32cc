use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{catalog::CatalogProvider, config::AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub catalog: Arc<dyn CatalogProvider>,
}
