use std::collections::HashSet;

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};

use crate::{
    audit,
    catalog::{CatalogError, CatalogProvider, ExternalProduct, NormalizedProduct},
    dto::catalog::{CategoryList, ExternalProductList, ImportSummary},
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

fn upstream(err: CatalogError) -> AppError {
    tracing::warn!(error = %err, "catalog fetch failed");
    AppError::Upstream(err)
}

fn new_product(product: &NormalizedProduct) -> ActiveModel {
    ActiveModel {
        id: Set(product.id),
        name: Set(product.name.clone()),
        description: Set(product.description.clone()),
        price: Set(product.price),
        stock: Set(product.stock),
        image_url: Set(product.image_url.clone()),
        category: Set(product.category.clone()),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
}

async fn fetch_normalized(catalog: &dyn CatalogProvider) -> AppResult<Vec<NormalizedProduct>> {
    let external = catalog.fetch_products().await.map_err(upstream)?;
    Ok(external.into_iter().map(NormalizedProduct::from).collect())
}

// Imported rows carry explicit ids, which leaves the serial sequence behind.
async fn sync_product_sequence(txn: &DatabaseTransaction) -> AppResult<()> {
    txn.execute_unprepared(
        "SELECT setval(pg_get_serial_sequence('products', 'id'), \
         GREATEST((SELECT MAX(id) FROM products), 1))",
    )
    .await?;
    Ok(())
}

/// Imports the external catalog as a restock.
///
/// Unknown ids are inserted with the import stock. Known ids only get that
/// stock added on top; name, price and the other fields stay as they are, so
/// repeated imports keep raising stock. The batch commits as a whole.
pub async fn import_products<C: TransactionTrait>(
    db: &C,
    catalog: &dyn CatalogProvider,
) -> AppResult<ImportSummary> {
    let products = fetch_normalized(catalog).await?;
    if products.is_empty() {
        return Ok(ImportSummary::default());
    }
    let ids: Vec<i64> = products.iter().map(|p| p.id).collect();

    let txn = db.begin().await?;

    let existing: HashSet<i64> = Products::find()
        .select_only()
        .column(Column::Id)
        .filter(Column::Id.is_in(ids.clone()))
        .into_tuple::<i64>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();
    let summary = tally(existing, &ids);

    for product in &products {
        Products::insert(new_product(product))
            .on_conflict(
                OnConflict::column(Column::Id)
                    .value(
                        Column::Stock,
                        Expr::col((Products, Column::Stock)).add(product.stock),
                    )
                    .value(Column::UpdatedAt, Expr::cust("now()"))
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
    }

    sync_product_sequence(&txn).await?;
    txn.commit().await?;

    Ok(summary)
}

/// Classifies each fetched id as a fresh insert or a restock, in batch order.
/// An id repeated within one batch is inserted once and restocked after that.
fn tally(mut known: HashSet<i64>, ids: &[i64]) -> ImportSummary {
    let mut summary = ImportSummary {
        fetched: ids.len(),
        ..ImportSummary::default()
    };
    for id in ids {
        if known.insert(*id) {
            summary.inserted += 1;
        } else {
            summary.restocked += 1;
        }
    }
    summary
}

/// Inserts catalog products that are not stored yet and leaves existing ones
/// untouched. Returns how many were added.
pub async fn seed_products<C: TransactionTrait>(
    db: &C,
    catalog: &dyn CatalogProvider,
) -> AppResult<u64> {
    let products = fetch_normalized(catalog).await?;
    let txn = db.begin().await?;

    let mut added = 0;
    for product in &products {
        added += Products::insert(new_product(product))
            .on_conflict(OnConflict::column(Column::Id).do_nothing().to_owned())
            .exec_without_returning(&txn)
            .await?;
    }

    sync_product_sequence(&txn).await?;
    txn.commit().await?;
    Ok(added)
}

pub async fn import_external_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ImportSummary>> {
    ensure_admin(user)?;
    let summary = import_products(&state.orm, state.catalog.as_ref()).await?;
    tracing::info!(
        fetched = summary.fetched,
        inserted = summary.inserted,
        restocked = summary.restocked,
        "catalog import finished"
    );

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_import",
        "products",
        serde_json::json!({
            "fetched": summary.fetched,
            "inserted": summary.inserted,
            "restocked": summary.restocked,
        }),
    )
    .await;

    let message = format!("{} products imported successfully.", summary.fetched);
    Ok(ApiResponse::success(message, summary, Some(Meta::empty())))
}

pub async fn list_external_products(
    state: &AppState,
) -> AppResult<ApiResponse<ExternalProductList>> {
    let items = state.catalog.fetch_products().await.map_err(upstream)?;
    Ok(ApiResponse::success(
        "Catalog products",
        ExternalProductList { items },
        None,
    ))
}

pub async fn get_external_product(
    state: &AppState,
    id: i64,
) -> AppResult<ApiResponse<ExternalProduct>> {
    let product = state
        .catalog
        .fetch_product_by_id(id)
        .await
        .map_err(upstream)?;
    Ok(ApiResponse::success("Catalog product", product, None))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = state.catalog.fetch_all_categories().await.map_err(upstream)?;
    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn products_by_category(
    state: &AppState,
    category: &str,
) -> AppResult<ApiResponse<ExternalProductList>> {
    let items = state
        .catalog
        .fetch_products_by_category(category)
        .await
        .map_err(upstream)?;
    Ok(ApiResponse::success(
        "Catalog products",
        ExternalProductList { items },
        None,
    ))
}
