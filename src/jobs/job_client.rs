use std::str::FromStr;

use chrono::{TimeDelta, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::storage::{keys, Storage, StorageError};

const SCHEDULED_STATE: &str = "Scheduled";

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },
    #[error("Delay of {0} minutes is out of range")]
    DelayOutOfRange(f64),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Converts a delay in minutes into a duration. Negative delays are kept as-is.
pub fn delay_from_minutes(minutes: f64) -> Result<TimeDelta, SchedulerError> {
    #[allow(clippy::cast_possible_truncation)]
    let milliseconds = (minutes * 60_000.0).round() as i64;

    TimeDelta::try_milliseconds(milliseconds).ok_or(SchedulerError::DelayOutOfRange(minutes))
}

/// Widens a standard 5-field cron expression to the 7-field form the `cron`
/// crate expects (seconds first, year last). 6 and 7-field expressions pass through.
///
/// Standard cron numbers weekdays 0-6 from Sunday (7 is Sunday too), the `cron`
/// crate numbers them 1-7 from Sunday, so numeric day-of-week values are shifted.
fn normalize_cron_expression(expression: &str) -> String {
    let fields: Vec<&str> = expression.split_whitespace().collect();

    match fields.as_slice() {
        [minute, hour, day_of_month, month, day_of_week] => format!(
            "0 {minute} {hour} {day_of_month} {month} {} *",
            shift_day_of_week_field(day_of_week)
        ),
        _ => expression.trim().to_string(),
    }
}

fn shift_day_of_week_field(field: &str) -> String {
    field
        .split(',')
        .map(shift_day_of_week_item)
        .collect::<Vec<_>>()
        .join(",")
}

/// Shifts one list item: a value, a range or either of those with a `/step`
fn shift_day_of_week_item(item: &str) -> String {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (item, None),
    };
    let step_suffix = step.map(|step| format!("/{step}")).unwrap_or_default();

    let Some((start, end)) = range.split_once('-') else {
        return format!("{}{step_suffix}", shift_day_of_week(range));
    };

    // A range ending on Sunday (7) becomes a range ending on Saturday plus Sunday (1)
    if let (Ok(start_day), "7") = (start.parse::<u32>(), end) {
        let step_size = step.and_then(|step| step.parse::<u32>().ok()).unwrap_or(1);
        let includes_sunday = step_size > 0 && start_day <= 7 && (7 - start_day) % step_size == 0;
        let shifted = format!("{}-7{step_suffix}", shift_day_of_week(start));
        return if includes_sunday {
            format!("{shifted},1")
        } else {
            shifted
        };
    }

    format!(
        "{}-{}{step_suffix}",
        shift_day_of_week(start),
        shift_day_of_week(end)
    )
}

fn shift_day_of_week(value: &str) -> String {
    match value.parse::<u32>() {
        Ok(7) => "1".to_string(),
        Ok(day) => (day + 1).to_string(),
        Err(_) => value.to_string(),
    }
}

fn parse_cron_schedule(expression: &str) -> Result<cron::Schedule, SchedulerError> {
    cron::Schedule::from_str(&normalize_cron_expression(expression)).map_err(|e| {
        SchedulerError::InvalidCron {
            expression: expression.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Writes one-off and recurring job records into storage for the executor to pick up
#[derive(Clone, Debug)]
pub struct JobClient {
    storage: Storage,
    queue: String,
}

impl JobClient {
    pub const fn new(storage: Storage, queue: String) -> Self {
        Self { storage, queue }
    }

    /// Schedules `action` to run once after `delay` and returns the new job id
    pub async fn schedule_once(&self, action: &str, delay: TimeDelta) -> Result<String, SchedulerError> {
        let now = Utc::now();
        #[allow(clippy::cast_precision_loss)]
        let enqueue_at = now
            .checked_add_signed(delay)
            .ok_or(SchedulerError::DelayOutOfRange(
                delay.num_milliseconds() as f64 / 60_000.0,
            ))?;
        let job_id = Uuid::new_v4().to_string();

        let mut transaction = self.storage.write_transaction();
        transaction
            .set_range_in_hash(
                &keys::job(&job_id),
                [
                    (keys::JOB_FIELD, action.to_string()),
                    ("State", SCHEDULED_STATE.to_string()),
                    ("Queue", self.queue.clone()),
                    ("CreatedAt", now.to_rfc3339()),
                    ("EnqueueAt", enqueue_at.to_rfc3339()),
                ],
            )
            .add_to_set(keys::SCHEDULE, &job_id);
        transaction.commit().await?;

        info!(
            "📅 Scheduled job {} for {}",
            job_id,
            enqueue_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        Ok(job_id)
    }

    /// Creates the recurring job `job_name`, or replaces its definition if it exists
    pub async fn upsert_recurring(
        &self,
        job_name: &str,
        action: &str,
        cron_expression: &str,
        time_zone: Tz,
    ) -> Result<(), SchedulerError> {
        let schedule = parse_cron_schedule(cron_expression)?;
        let now = Utc::now();
        let next_execution = schedule
            .after(&now.with_timezone(&time_zone))
            .next()
            .map(|next| next.with_timezone(&Utc));

        let key = keys::recurring_job(job_name);
        let existing = self.storage.hash_entries(&key).await?;

        let mut entries = vec![
            (keys::JOB_FIELD, action.to_string()),
            ("Cron", cron_expression.to_string()),
            ("TimeZoneId", time_zone.name().to_string()),
            ("Queue", self.queue.clone()),
        ];
        if !existing.contains_key("CreatedAt") {
            entries.push(("CreatedAt", now.to_rfc3339()));
        }
        if let Some(next_execution) = next_execution {
            entries.push(("NextExecution", next_execution.to_rfc3339()));
        }

        let mut transaction = self.storage.write_transaction();
        transaction
            .set_range_in_hash(&key, entries)
            .add_to_set(keys::RECURRING_JOBS, job_name);
        transaction.commit().await?;

        if existing.is_empty() {
            info!("🔁 Created recurring job '{}' ({})", job_name, cron_expression);
        } else {
            info!("🔁 Updated recurring job '{}' ({})", job_name, cron_expression);
        }
        debug!("🔄 Recurring job '{}' next execution: {:?}", job_name, next_execution);

        Ok(())
    }
}
