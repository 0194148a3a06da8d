use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload of a job operation request.
///
/// Only the fields the dispatcher routes on are typed. Anything else the
/// caller sends (method, headers, body data, retry settings...) is kept in
/// `extra` and handed to the executor untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    /// Delay before a one-off job runs. Zero, fractional and negative values are allowed.
    #[serde(default)]
    pub delay_minutes: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|value| !value.is_empty())
}

impl JobItem {
    #[must_use]
    pub fn job_name(&self) -> Option<&str> {
        non_empty(self.job_name.as_ref())
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        non_empty(self.url.as_ref())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        non_empty(self.content_type.as_ref())
    }

    #[must_use]
    pub fn cron_expression(&self) -> Option<&str> {
        non_empty(self.cron_expression.as_ref())
    }
}

/// A job item whose name has been resolved.
///
/// Can only be built through the request validation in the operation router,
/// so holders may rely on `name` being non-empty and matching `item.job_name`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDefinition {
    name: String,
    item: JobItem,
}

impl JobDefinition {
    pub(crate) fn new(name: String, mut item: JobItem) -> Self {
        item.job_name = Some(name.clone());
        Self { name, item }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn item(&self) -> &JobItem {
        &self.item
    }
}
