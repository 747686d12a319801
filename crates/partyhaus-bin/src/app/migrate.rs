use partyhaus_config_and_utils::Paths;
use partyhaus_database::{AsyncDatabase, CURRENT_VERSION};
use tracing::info;

/// Open the local database, which applies any pending migrations.
pub async fn run_migrations(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let db = AsyncDatabase::open(&paths.database_file()).await?;
    db.health_check().await?;
    info!(version = CURRENT_VERSION, "Database is up to date");
    println!(
        "Database at {} is at schema version {}",
        db.path(),
        CURRENT_VERSION
    );
    db.close().await?;
    Ok(())
}
