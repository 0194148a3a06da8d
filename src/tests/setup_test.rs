use sea_orm::{ConnectOptions, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::debug;

use crate::{
    app::App,
    boot::read_config,
    config::Config,
    database::migrations::Migrator,
    environment::Environment,
    router::router,
    storage::Storage,
};

static TRACING_INITIALIZED: std::sync::Once = std::sync::Once::new();

/// Initialize tracing for tests
fn init_tracing() {
    TRACING_INITIALIZED.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .init();
    });
}

/// Opens a private in-memory SQLite database without running migrations.
///
/// The pool holds exactly one connection, since every SQLite memory
/// connection is a separate database.
///
/// # Panics
///
/// Panics if the connection cannot be opened.
pub async fn sqlite_connection() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.sqlx_logging(false);
    options.max_connections(1);
    options.min_connections(1);

    sea_orm::Database::connect(options)
        .await
        .expect("Failed to open in-memory SQLite database")
}

/// Database-backed storage on a fresh, migrated in-memory SQLite database.
///
/// # Panics
///
/// Panics if the database cannot be opened or migrated.
pub async fn setup_sqlite_storage() -> Storage {
    init_tracing();

    let db = sqlite_connection().await;
    Migrator::up(&db, None)
        .await
        .expect("Failed to run storage migrations");

    Storage::database(db)
}

/// Database-backed storage whose connection pool has already been closed.
///
/// Every read, write and ping against it fails, as during a database outage.
///
/// # Panics
///
/// Panics if the database cannot be opened, migrated or closed.
pub async fn setup_closed_sqlite_storage() -> Storage {
    let storage = setup_sqlite_storage().await;

    if let Storage::Database(db) = &storage {
        db.clone()
            .close()
            .await
            .expect("Failed to close SQLite connection");
    }

    storage
}

/// Creates a test server over in-memory storage.
///
/// Reads `config/test.toml`; every call gets its own empty store, so tests
/// can run in parallel.
///
/// # Panics
///
/// Panics if the test configuration cannot be read.
pub async fn setup_test() -> TestUtils {
    setup_test_with_storage(Storage::memory()).await
}

/// Creates a test server over the given storage.
///
/// # Panics
///
/// Panics if the test configuration cannot be read or the server cannot start.
pub async fn setup_test_with_storage(storage: Storage) -> TestUtils {
    init_tracing();

    debug!("Setting up test");

    let environment = Environment::Test;
    let config = read_config(&environment).expect("Failed to read test configuration");

    let app = App::new(config.clone(), environment, storage.clone());
    let server = axum_test::TestServer::new(router(app)).expect("Failed to start test server");

    TestUtils {
        server,
        storage,
        config,
    }
}

/// `axum_test::TestServer` plus direct access to the store behind it
pub struct TestUtils {
    pub server: axum_test::TestServer,
    pub storage: Storage,
    pub config: Config,
}
