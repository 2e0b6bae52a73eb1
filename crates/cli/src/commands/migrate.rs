//! Create the local sessions table.
//!
//! The storefront's only local state is the tower-sessions store; this
//! applies its schema so the service can start against a fresh database.

use secrecy::SecretString;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

use fungal_flux_storefront::db;

/// Run the session-store migration.
///
/// # Errors
///
/// Returns an error if `STOREFRONT_DATABASE_URL` is unset or the migration
/// fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "STOREFRONT_DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url).await?;
    PostgresStore::new(pool).migrate().await?;

    info!("sessions table is up to date");
    Ok(())
}
