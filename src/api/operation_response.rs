use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::jobs::{OperationError, Outcome};

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Self::Json(document) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                document,
            )
                .into_response(),
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// Rejected requests answer 405 and failures of the store or scheduler 500,
/// both without a body.
impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            StatusCode::METHOD_NOT_ALLOWED.into_response()
        } else {
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::jobs::job_client::SchedulerError;

    use super::*;

    #[test]
    fn test_outcome_status_codes() {
        let response = Outcome::Json("[]".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        assert_eq!(Outcome::NoContent.into_response().status(), StatusCode::NO_CONTENT);
        assert_eq!(Outcome::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_status_codes() {
        let rejected = [
            OperationError::MissingOperation,
            OperationError::UnsupportedOperation("nope".to_string()),
            OperationError::InvalidBody,
            OperationError::MissingField("url"),
        ];
        for error in rejected {
            assert_eq!(error.into_response().status(), StatusCode::METHOD_NOT_ALLOWED);
        }

        let failure = OperationError::Scheduler(SchedulerError::DelayOutOfRange(f64::MAX));
        assert_eq!(failure.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
