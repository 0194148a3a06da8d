pub mod dispatcher;
pub mod health_checks;
mod operation_response;
