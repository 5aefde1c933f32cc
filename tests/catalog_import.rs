mod common;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use storefront_api::{
    catalog::RESTOCK_QUANTITY,
    entity::{Products, products},
    services::catalog_service::{import_products, seed_products},
};

use common::{FakeCatalog, create_product, db_state, dec, external, unique_external_id_base};

// A second import restocks existing rows and leaves everything else alone.
#[tokio::test]
async fn reimport_restocks_without_overwriting() -> anyhow::Result<()> {
    let Some(state) = db_state(FakeCatalog::default()).await? else {
        return Ok(());
    };

    let base = unique_external_id_base();
    let ids = [base + 1, base + 2];
    let repeated = base + 5;
    Products::delete_many()
        .filter(products::Column::Id.is_in([ids[0], ids[1], repeated]))
        .exec(&state.orm)
        .await?;

    let first = FakeCatalog::with(vec![
        external(ids[0], "Backpack", "109.95", "men's clothing"),
        external(ids[1], "Ring", "9.99", "jewelery"),
    ]);
    let summary = import_products(&state.orm, &first).await?;
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.restocked, 0);

    let stored = Products::find_by_id(ids[0]).one(&state.orm).await?.expect("imported");
    assert_eq!(stored.stock, RESTOCK_QUANTITY);
    assert_eq!(stored.name, "Backpack");
    assert!(stored.is_active);

    // The upstream changed its data; only stock may move locally.
    let second = FakeCatalog::with(vec![
        external(ids[0], "Renamed Backpack", "1.00", "other"),
        external(ids[1], "Renamed Ring", "2.00", "other"),
    ]);
    let summary = import_products(&state.orm, &second).await?;
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.restocked, 2);

    let stored = Products::find_by_id(ids[0]).one(&state.orm).await?.expect("imported");
    assert_eq!(stored.stock, 2 * RESTOCK_QUANTITY);
    assert_eq!(stored.name, "Backpack");
    assert_eq!(stored.price, dec("109.95"));
    assert_eq!(stored.category.as_deref(), Some("men's clothing"));

    // Seeding never touches existing rows.
    assert_eq!(seed_products(&state.orm, &second).await?, 0);
    let stored = Products::find_by_id(ids[1]).one(&state.orm).await?.expect("imported");
    assert_eq!(stored.stock, 2 * RESTOCK_QUANTITY);

    // The serial sequence was moved past the imported ids.
    let fresh = create_product(&state, "After Import", "3.00", 1).await?;
    assert!(fresh.id > ids[1]);

    assert!(import_products(&state.orm, &FakeCatalog::failing()).await.is_err());

    // The same id twice in one batch: one insert, then one restock.
    let doubled = FakeCatalog::with(vec![
        external(repeated, "Mug", "7.50", "kitchen"),
        external(repeated, "Mug", "7.50", "kitchen"),
    ]);
    let summary = import_products(&state.orm, &doubled).await?;
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.restocked, 1);
    let stored = Products::find_by_id(repeated).one(&state.orm).await?.expect("imported");
    assert_eq!(stored.stock, 2 * RESTOCK_QUANTITY);

    Ok(())
}
