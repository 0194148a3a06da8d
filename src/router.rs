use axum::{
    routing::{any, get},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{api, app::App};

pub fn router(app: App) -> Router {
    Router::new()
        .route("/liveness", get(api::health_checks::ok))
        .route("/readiness", get(api::health_checks::readiness))
        .route("/dispatch", any(api::dispatcher::dispatch))
        .route("/dispatch/{*job_path}", any(api::dispatcher::dispatch_job_path))
        .with_state(app)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}
