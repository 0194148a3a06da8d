//! Encoding and recovery of the job definition stored with each job.
//!
//! A stored job carries an invocation document under its `Job` field. The
//! document's `Arguments` member is itself a JSON array serialized to a
//! string, and its first element is the [`JobItem`] serialized to a string
//! once more. Decoding unwraps each layer with a real JSON parse, so braces
//! and quotes inside string values survive intact.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::{keys, Storage, StorageError};

use super::job_item::{JobDefinition, JobItem};

const JOB_TYPE: &str = "httpjob::jobs::HttpJob";
const JOB_METHOD: &str = "execute";
const JOB_PARAMETER_TYPES: [&str; 3] = ["JobItem", "String", "PerformContext"];

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Malformed job record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Job record carries no job arguments")]
    MissingArguments,
}

/// Invocation document persisted under the `Job` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationData {
    #[serde(rename = "Type")]
    pub type_name: String,
    pub method: String,
    pub parameter_types: String,
    pub arguments: String,
}

/// Serializes a job definition into the text stored under the `Job` field
pub fn encode(definition: &JobDefinition) -> Result<String, RecordError> {
    let arguments: [Option<String>; 3] = [
        Some(serde_json::to_string(definition.item())?),
        Some(serde_json::to_string(definition.name())?),
        None,
    ];

    let invocation = InvocationData {
        type_name: JOB_TYPE.to_string(),
        method: JOB_METHOD.to_string(),
        parameter_types: serde_json::to_string(&JOB_PARAMETER_TYPES)?,
        arguments: serde_json::to_string(&arguments)?,
    };

    Ok(serde_json::to_string(&invocation)?)
}

/// Recovers the job item from the text stored under the `Job` field
pub fn decode(job_field: &str) -> Result<JobItem, RecordError> {
    let invocation: InvocationData = serde_json::from_str(job_field)?;
    let arguments: Value = serde_json::from_str(&invocation.arguments)?;

    let payload = match arguments {
        Value::Array(values) => values
            .into_iter()
            .next()
            .ok_or(RecordError::MissingArguments)?,
        other => other,
    };

    item_from_payload(payload)
}

fn item_from_payload(payload: Value) -> Result<JobItem, RecordError> {
    match payload {
        Value::String(embedded) => Ok(serde_json::from_str(&embedded)?),
        object @ Value::Object(_) => Ok(serde_json::from_value(object)?),
        _ => Err(RecordError::MissingArguments),
    }
}

/// Reads recurring job definitions back out of storage
#[derive(Clone, Debug)]
pub struct JobRecordCodec {
    storage: Storage,
}

impl JobRecordCodec {
    pub const fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Returns the canonical JSON of a recurring job's item, or `None` if no
    /// such job (or no `Job` field) exists.
    pub async fn fetch(&self, job_name: &str) -> Result<Option<String>, RecordError> {
        let entries = self
            .storage
            .hash_entries(&keys::recurring_job(job_name))
            .await?;

        let Some(job_field) = entries.get(keys::JOB_FIELD) else {
            debug!("No recurring job record for '{}'", job_name);
            return Ok(None);
        };

        let item = decode(job_field).inspect_err(|e| {
            warn!("Recurring job '{}' has an unreadable record: {}", job_name, e);
        })?;

        Ok(Some(serde_json::to_string(&item)?))
    }
}
