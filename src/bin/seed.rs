use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::NotSet, DatabaseConnection, EntityTrait, Set};
use storefront_api::{
    catalog::HttpCatalog,
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::users::{self, Column as UserCol, Entity as Users},
    services::{auth_service::hash_password, catalog_service::seed_products},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let email = std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into());
    let password = std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin1234".into());
    let admin_id = ensure_user(&orm, "admin", &email, &password, true).await?;
    let user_id = ensure_user(&orm, "shopper", "user@example.com", "user1234", false).await?;

    let catalog = HttpCatalog::new(config.catalog_base_url.clone())?;
    let added = seed_products(&orm, &catalog).await?;

    tracing::info!(admin_id, user_id, products_added = added, "seed completed");
    Ok(())
}

/// Creates the user, or re-asserts the admin flag if the email already exists.
async fn ensure_user(
    orm: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> anyhow::Result<i64> {
    let user = Users::insert(users::ActiveModel {
        id: NotSet,
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        is_admin: Set(is_admin),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(UserCol::Email)
            .update_column(UserCol::IsAdmin)
            .to_owned(),
    )
    .exec_with_returning(orm)
    .await?;

    tracing::info!(email, is_admin, "ensured user");
    Ok(user.id)
}
