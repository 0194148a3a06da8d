use axum::extract::State;

use crate::app::{App, ReadinessError};

pub async fn ok() -> &'static str {
    "OK"
}

/// Ready once the job store answers
pub async fn readiness(State(app): State<App>) -> Result<&'static str, ReadinessError> {
    app.storage.ping().await?;
    Ok("OK")
}
