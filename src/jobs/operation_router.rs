//! Turns a loosely typed job operation request into a typed store call.

use std::str::FromStr;

use chrono_tz::Tz;
use strum::{AsRefStr, EnumString};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{config::SchedulerConfig, storage::{Storage, StorageError}};

use super::{
    job_client::{delay_from_minutes, JobClient, SchedulerError},
    job_item::{JobDefinition, JobItem},
    job_record::{self, JobRecordCodec, RecordError},
    pause_state::PauseStateStore,
};

/// Operation names accepted in the `op` query parameter (case-insensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Operation {
    GetJobList,
    GetRecurringJob,
    BackgroundJob,
    RecurringJob,
    EditRecurringJob,
    PauseJob,
}

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("No operation given")]
    MissingOperation,
    #[error("Unsupported operation '{0}'")]
    UnsupportedOperation(String),
    #[error("Request body is not a job item")]
    InvalidBody,
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("Failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OperationError {
    /// True for malformed or unsupported requests, false for failures of the store or scheduler
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingOperation
                | Self::UnsupportedOperation(_)
                | Self::InvalidBody
                | Self::MissingField(_)
        )
    }
}

/// Result of a successfully routed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// JSON document to return to the caller
    Json(String),
    /// Mutation acknowledged, nothing to return
    NoContent,
    /// The requested recurring job does not exist
    NotFound,
}

/// A validated operation, carrying exactly what its store call needs
#[derive(Debug, Clone, PartialEq)]
pub enum JobCommand {
    ListPaused,
    FetchRecurring {
        job_name: String,
    },
    ScheduleOnce {
        job: JobDefinition,
        delay_minutes: f64,
    },
    UpsertRecurring {
        job: JobDefinition,
        cron_expression: String,
    },
    TogglePause {
        job_name: String,
    },
}

fn job_name_from_path(path_hint: &str) -> Option<&str> {
    path_hint
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

fn parse_item(body: &[u8]) -> Option<JobItem> {
    serde_json::from_slice::<JobItem>(body)
        .inspect_err(|e| debug!("Request body is not a job item: {}", e))
        .ok()
}

/// Checks the fields every mutation needs and resolves the job name
fn job_definition(item: Option<JobItem>, path_hint: &str) -> Result<JobDefinition, OperationError> {
    let item = item.ok_or(OperationError::InvalidBody)?;
    if item.url().is_none() {
        return Err(OperationError::MissingField("url"));
    }
    if item.content_type().is_none() {
        return Err(OperationError::MissingField("contentType"));
    }

    let job_name = item
        .job_name()
        .or_else(|| job_name_from_path(path_hint))
        .ok_or(OperationError::MissingField("jobName"))?
        .to_string();

    Ok(JobDefinition::new(job_name, item))
}

impl JobCommand {
    /// Validates a request for `operation`.
    ///
    /// `path_hint` supplies the job name (its last segment) when the body leaves it empty.
    pub fn parse(operation: Operation, body: &[u8], path_hint: &str) -> Result<Self, OperationError> {
        match operation {
            Operation::GetJobList => Ok(Self::ListPaused),
            Operation::GetRecurringJob => {
                let item = parse_item(body).ok_or(OperationError::InvalidBody)?;
                let job_name = item
                    .job_name()
                    .ok_or(OperationError::MissingField("jobName"))?;
                Ok(Self::FetchRecurring {
                    job_name: job_name.to_string(),
                })
            }
            Operation::BackgroundJob => {
                let job = job_definition(parse_item(body), path_hint)?;
                Ok(Self::ScheduleOnce {
                    delay_minutes: job.item().delay_minutes,
                    job,
                })
            }
            Operation::RecurringJob | Operation::EditRecurringJob => {
                let job = job_definition(parse_item(body), path_hint)?;
                let cron_expression = job
                    .item()
                    .cron_expression()
                    .ok_or(OperationError::MissingField("cronExpression"))?
                    .to_string();
                Ok(Self::UpsertRecurring {
                    job,
                    cron_expression,
                })
            }
            Operation::PauseJob => {
                let job = job_definition(parse_item(body), path_hint)?;
                Ok(Self::TogglePause {
                    job_name: job.name().to_string(),
                })
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct JobOperationRouter {
    pause_state: PauseStateStore,
    records: JobRecordCodec,
    client: JobClient,
    time_zone: Tz,
}

impl JobOperationRouter {
    pub fn new(storage: Storage, scheduler_config: &SchedulerConfig) -> Self {
        Self {
            pause_state: PauseStateStore::new(storage.clone()),
            records: JobRecordCodec::new(storage.clone()),
            client: JobClient::new(storage, scheduler_config.queue.clone()),
            time_zone: scheduler_config.time_zone,
        }
    }

    #[cfg(test)]
    pub(crate) const fn pause_state(&self) -> &PauseStateStore {
        &self.pause_state
    }

    #[cfg(test)]
    pub(crate) const fn records(&self) -> &JobRecordCodec {
        &self.records
    }

    /// Validates and runs one job operation
    #[instrument(skip(self, body))]
    pub async fn handle(
        &self,
        op: &str,
        body: &[u8],
        path_hint: &str,
    ) -> Result<Outcome, OperationError> {
        if op.is_empty() {
            return Err(OperationError::MissingOperation);
        }

        let operation = Operation::from_str(op)
            .map_err(|_| OperationError::UnsupportedOperation(op.to_string()))?;
        debug!(operation = operation.as_ref(), "Routing job operation");
        let command = JobCommand::parse(operation, body, path_hint)?;

        self.execute(command).await
    }

    pub async fn execute(&self, command: JobCommand) -> Result<Outcome, OperationError> {
        match command {
            JobCommand::ListPaused => {
                let paused = self.pause_state.list_paused().await?;
                Ok(Outcome::Json(serde_json::to_string(&paused)?))
            }
            JobCommand::FetchRecurring { job_name } => Ok(self
                .records
                .fetch(&job_name)
                .await?
                .map_or(Outcome::NotFound, Outcome::Json)),
            JobCommand::ScheduleOnce { job, delay_minutes } => {
                let action = job_record::encode(&job)?;
                let delay = delay_from_minutes(delay_minutes)?;
                let job_id = self.client.schedule_once(&action, delay).await?;
                debug!("One-off job '{}' stored as {}", job.name(), job_id);
                Ok(Outcome::NoContent)
            }
            JobCommand::UpsertRecurring {
                job,
                cron_expression,
            } => {
                let action = job_record::encode(&job)?;
                self.client
                    .upsert_recurring(job.name(), &action, &cron_expression, self.time_zone)
                    .await?;
                Ok(Outcome::NoContent)
            }
            JobCommand::TogglePause { job_name } => {
                self.pause_state.toggle(&job_name).await?;
                Ok(Outcome::NoContent)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn router() -> JobOperationRouter {
        JobOperationRouter::new(Storage::memory(), &SchedulerConfig::default())
    }

    #[test]
    fn test_operation_names_are_case_insensitive() {
        assert_eq!(
            Operation::from_str("GetJobList").unwrap(),
            Operation::GetJobList
        );
        assert_eq!(
            Operation::from_str("EDITRECURRINGJOB").unwrap(),
            Operation::EditRecurringJob
        );
        assert_eq!(Operation::PauseJob.as_ref(), "pausejob");
        assert!(Operation::from_str("unknownop").is_err());
    }

    #[test]
    fn test_job_list_ignores_body() {
        let command = JobCommand::parse(Operation::GetJobList, b"garbage", "/dispatch").unwrap();

        assert_eq!(command, JobCommand::ListPaused);
    }

    #[test]
    fn test_recurring_lookup_needs_job_name() {
        let command = JobCommand::parse(
            Operation::GetRecurringJob,
            &body(json!({"jobName": "job1"})),
            "/dispatch",
        )
        .unwrap();
        assert_eq!(
            command,
            JobCommand::FetchRecurring {
                job_name: "job1".to_string()
            }
        );

        let result = JobCommand::parse(Operation::GetRecurringJob, &body(json!({})), "/dispatch/job1");
        assert!(matches!(result, Err(OperationError::MissingField("jobName"))));

        let result = JobCommand::parse(Operation::GetRecurringJob, b"{", "/dispatch");
        assert!(matches!(result, Err(OperationError::InvalidBody)));
    }

    #[test]
    fn test_mutations_need_url_and_content_type() {
        let result = JobCommand::parse(
            Operation::BackgroundJob,
            &body(json!({"jobName": "job1", "contentType": "text/plain"})),
            "/dispatch",
        );
        assert!(matches!(result, Err(OperationError::MissingField("url"))));

        let result = JobCommand::parse(
            Operation::PauseJob,
            &body(json!({"jobName": "job1", "url": "http://x", "contentType": ""})),
            "/dispatch",
        );
        assert!(matches!(result, Err(OperationError::MissingField("contentType"))));

        let result = JobCommand::parse(Operation::RecurringJob, b"not json", "/dispatch");
        assert!(matches!(result, Err(OperationError::InvalidBody)));
    }

    #[test]
    fn test_job_name_falls_back_to_last_path_segment() {
        let command = JobCommand::parse(
            Operation::BackgroundJob,
            &body(json!({"url": "http://x", "contentType": "text/plain", "delayMinutes": 0.5})),
            "/dispatch/myjob",
        )
        .unwrap();

        let JobCommand::ScheduleOnce { job, delay_minutes } = command else {
            panic!("expected a one-off job, got {command:?}");
        };
        assert_eq!(job.name(), "myjob");
        assert_eq!(job.item().job_name(), Some("myjob"));
        assert!((delay_minutes - 0.5).abs() < f64::EPSILON);

        let result = JobCommand::parse(
            Operation::BackgroundJob,
            &body(json!({"url": "http://x", "contentType": "text/plain"})),
            "/dispatch/",
        );
        assert!(matches!(result, Err(OperationError::MissingField("jobName"))));
    }

    #[test]
    fn test_recurring_operations_need_cron() {
        let payload = body(json!({"jobName": "job1", "url": "http://x", "contentType": "text/plain"}));

        for operation in [Operation::RecurringJob, Operation::EditRecurringJob] {
            let result = JobCommand::parse(operation, &payload, "/dispatch");
            assert!(matches!(result, Err(OperationError::MissingField("cronExpression"))));
        }
    }

    #[test]
    fn test_create_and_edit_build_the_same_command() {
        let payload = body(json!({
            "jobName": "job1",
            "url": "http://x",
            "contentType": "text/plain",
            "cronExpression": "0 * * * *"
        }));

        let create = JobCommand::parse(Operation::RecurringJob, &payload, "/dispatch").unwrap();
        let edit = JobCommand::parse(Operation::EditRecurringJob, &payload, "/dispatch").unwrap();

        assert_eq!(create, edit);
    }

    #[tokio::test]
    async fn test_unknown_and_empty_operations_are_rejected() {
        let router = router();

        let result = router.handle("unknownop", b"{}", "/dispatch").await;
        assert!(matches!(result, Err(OperationError::UnsupportedOperation(_))));

        let result = router.handle("", b"{}", "/dispatch").await;
        assert!(matches!(result, Err(OperationError::MissingOperation)));
        assert!(result.unwrap_err().is_client_error());
    }

    #[tokio::test]
    async fn test_recurring_job_round_trip() {
        let router = router();
        let payload = body(json!({
            "jobName": "job1",
            "url": "http://x",
            "contentType": "application/json",
            "cronExpression": "*/5 * * * *"
        }));

        let outcome = router.handle("recurringjob", &payload, "/dispatch").await.unwrap();
        assert_eq!(outcome, Outcome::NoContent);

        let outcome = router
            .handle("getrecurringjob", &body(json!({"jobName": "job1"})), "/dispatch")
            .await
            .unwrap();
        let Outcome::Json(document) = outcome else {
            panic!("expected a job document, got {outcome:?}");
        };
        let document: serde_json::Value = serde_json::from_str(&document).unwrap();
        assert_eq!(document["url"], json!("http://x"));
        assert_eq!(document["contentType"], json!("application/json"));
        assert_eq!(document["cronExpression"], json!("*/5 * * * *"));
    }

    #[tokio::test]
    async fn test_invalid_cron_is_an_internal_failure() {
        let router = router();
        let payload = body(json!({
            "jobName": "job1",
            "url": "http://x",
            "contentType": "application/json",
            "cronExpression": "whenever"
        }));

        let error = router.handle("recurringjob", &payload, "/dispatch").await.unwrap_err();

        assert!(matches!(error, OperationError::Scheduler(SchedulerError::InvalidCron { .. })));
        assert!(!error.is_client_error());
    }

    #[tokio::test]
    async fn test_pausing_a_recurring_job_lists_it() {
        let router = router();
        let payload = body(json!({
            "jobName": "job1",
            "url": "http://x",
            "contentType": "application/json",
            "cronExpression": "0 0 * * *"
        }));
        router.handle("recurringjob", &payload, "/dispatch").await.unwrap();

        let outcome = router.handle("pausejob", &payload, "/dispatch").await.unwrap();
        assert_eq!(outcome, Outcome::NoContent);
        assert!(router.pause_state().is_paused("job1").await.unwrap());

        let outcome = router.handle("getjoblist", b"", "/dispatch").await.unwrap();
        assert_eq!(outcome, Outcome::Json(r#"[{"id":"job1"}]"#.to_string()));
    }

    #[tokio::test]
    async fn test_missing_recurring_job_is_not_found() {
        let router = router();

        let outcome = router
            .handle("getrecurringjob", &body(json!({"jobName": "ghost"})), "/dispatch")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(router.records().fetch("ghost").await.unwrap(), None);
    }
}
