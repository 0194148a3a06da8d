use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{error, info};

use crate::{
    api::health_checks::ok,
    app::App,
    config::{Config, DatabaseConfig, StorageConfig},
    database::setup_database,
    environment::Environment,
    router::router,
    storage::Storage,
};

pub async fn handle_serve_command(environment: Environment, config: Config) {
    let port = config.server.port;

    let storage = match &config.storage {
        StorageConfig::Memory => {
            info!("🧠 Using in-memory storage, jobs are lost on restart");
            Storage::memory()
        }
        StorageConfig::Database(database_config) => {
            // Answer liveness probes while migrations run
            let liveness_server_task = tokio::spawn(start_liveness_server(port));

            let storage = connect_database_storage(database_config).await;
            stop_liveness_server(liveness_server_task).await;

            match storage {
                Some(storage) => storage,
                None => return,
            }
        }
    };

    let app = App::new(config, environment, storage);

    start_server(router(app), port).await;
}

async fn connect_database_storage(database_config: &DatabaseConfig) -> Option<Storage> {
    let (db, migration_receiver) = match setup_database(database_config).await {
        Ok(setup) => setup,
        Err(e) => {
            error!("❌ Failed to connect to the database: {}", e);
            return None;
        }
    };

    match migration_receiver.await {
        Ok(Ok(())) => {
            info!("✅ Storage is ready!");
            Some(Storage::database(db))
        }
        Ok(Err(e)) => {
            error!("❌ Storage migrations failed: {}", e);
            None
        }
        Err(_) => {
            error!("❌ Storage migration channel closed unexpectedly");
            None
        }
    }
}

async fn stop_liveness_server(task: JoinHandle<()>) {
    task.abort();
    let _ = task.await;
}

// Minimal server that only serves liveness endpoint during migrations
async fn start_liveness_server(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ Failed to bind liveness server on {}: {}", addr, e);
            return;
        }
    };

    let migration_router = Router::new().route("/liveness", get(ok));
    if let Err(e) = axum::serve(listener, migration_router).await {
        error!("❌ Liveness server stopped: {}", e);
    }
}

async fn start_server(router: Router, port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ Failed to bind {}: {}", addr, e);
            return;
        }
    };

    info!("🌐 Dispatcher listening on http://{}", addr);
    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("❌ Server stopped: {}", e);
    }
}
