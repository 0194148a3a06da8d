use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    config::Config,
    environment::Environment,
    jobs::JobOperationRouter,
    storage::{Storage, StorageError},
};

#[derive(Clone, Debug)]
pub struct App {
    pub config: Config,
    pub environment: Environment,
    pub storage: Storage,
    pub jobs: JobOperationRouter,
}

impl App {
    pub fn new(config: Config, environment: Environment, storage: Storage) -> Self {
        let jobs = JobOperationRouter::new(storage.clone(), &config.scheduler);

        Self {
            config,
            environment,
            storage,
            jobs,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("Storage unavailable")]
    Storage(#[from] StorageError),
}

impl IntoResponse for ReadinessError {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string()).into_response()
    }
}
