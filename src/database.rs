use sea_orm::{ConnectOptions, DbErr};
use sea_orm_migration::MigratorTrait;
use tokio::sync::oneshot;
use tracing::debug;

use crate::config::DatabaseConfig;

pub mod migrations;
pub(crate) mod models;

use migrations::Migrator;

/// Connects and runs the storage migrations in the background.
///
/// The receiver resolves once the migrations have finished, so the caller can
/// keep answering liveness probes in the meantime.
pub async fn setup_database(
    db_config: &DatabaseConfig,
) -> Result<
    (
        sea_orm::DatabaseConnection,
        oneshot::Receiver<Result<(), DbErr>>,
    ),
    DbErr,
> {
    let connection = setup_database_connection(db_config).await?;
    let migrations_connection = connection.clone();

    let (sender, receiver) = oneshot::channel();

    tokio::spawn(async move {
        let migration_result = Migrator::up(&migrations_connection, None).await;
        let _ = sender.send(migration_result);
    });

    Ok((connection, receiver))
}

pub async fn setup_database_connection(
    db_config: &DatabaseConfig,
) -> Result<sea_orm::DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(db_config.url.clone());

    options.sqlx_logging(false); // Disable SQL query logging to reduce noise
    options.max_connections(db_config.pool_size);

    debug!("Connecting to database at: {}", &db_config.url);

    sea_orm::Database::connect(options).await
}
