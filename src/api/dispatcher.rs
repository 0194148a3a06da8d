use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, error};

use crate::app::App;

#[derive(Debug, Default, Deserialize)]
pub struct DispatchParams {
    op: Option<String>,
}

/// Single entry point for job operations.
///
/// Only POST is served. The operation comes from the `op` query parameter, the
/// job item from the JSON body, and the path supplies the job name when the
/// body has none.
#[axum_macros::debug_handler]
pub async fn dispatch(State(app): State<App>, method: Method, uri: Uri, body: Bytes) -> Response {
    run_operation(&app, &method, &uri, uri.path(), &body).await
}

/// Same as [`dispatch`], with the percent-decoded path below `/dispatch/` as the name hint
#[axum_macros::debug_handler]
pub async fn dispatch_job_path(
    State(app): State<App>,
    method: Method,
    Path(job_path): Path<String>,
    uri: Uri,
    body: Bytes,
) -> Response {
    run_operation(&app, &method, &uri, &job_path, &body).await
}

async fn run_operation(
    app: &App,
    method: &Method,
    uri: &Uri,
    path_hint: &str,
    body: &[u8],
) -> Response {
    if method != Method::POST {
        debug!("Rejecting {} {}", method, uri.path());
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let params = Query::<DispatchParams>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default();
    let op = params.op.unwrap_or_default();

    match app.jobs.handle(&op, body, path_hint).await {
        Ok(outcome) => outcome.into_response(),
        Err(e) => {
            if e.is_client_error() {
                debug!("Rejected '{}' operation: {}", op, e);
            } else {
                error!("❌ '{}' operation failed: {}", op, e);
            }
            e.into_response()
        }
    }
}
