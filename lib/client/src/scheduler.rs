//! Manual scheduler triggers.
//!
//! The backend exposes four scheduling passes. Each returns a summary of the
//! tasks it touched.

use chrono::{DateTime, Utc};
use flowforge_core::{NodeId, RunId, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which scheduling pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerKind {
    /// The general pending-task pass.
    Standard,
    /// Drain the Redis-backed queue.
    Redis,
    /// Scan MongoDB for pending and stuck tasks.
    Mongo,
    /// Run the cron-equivalent pass. Takes no options.
    Cron,
}

impl SchedulerKind {
    pub const ALL: [Self; 4] = [Self::Standard, Self::Redis, Self::Mongo, Self::Cron];

    /// API path of the trigger endpoint.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Standard => "/scheduler/trigger",
            Self::Redis => "/scheduler/redis",
            Self::Mongo => "/scheduler/mongo",
            Self::Cron => "/scheduler/cron",
        }
    }

    /// Whether the trigger accepts a [`SchedulerConfig`] body.
    #[must_use]
    pub const fn accepts_config(self) -> bool {
        !matches!(self, Self::Cron)
    }

    /// Error text used when the server gives none.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Standard => "Failed to trigger scheduler",
            Self::Redis => "Failed to trigger Redis scheduler",
            Self::Mongo => "Failed to trigger MongoDB scheduler",
            Self::Cron => "Failed to trigger cron scheduler",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Scheduler",
            Self::Redis => "Redis",
            Self::Mongo => "MongoDB",
            Self::Cron => "Cron",
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Options for a scheduling pass. Absent fields use server defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tasks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_retry_queue: Option<bool>,
    /// Restrict the pass to one run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
}

impl SchedulerConfig {
    /// The options the dashboard panel starts with.
    #[must_use]
    pub fn panel_defaults() -> Self {
        Self {
            max_tasks: Some(10),
            process_retry_queue: Some(true),
            run_id: None,
        }
    }
}

/// What happened to one task during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Processed,
    Error,
    ProcessedStuck,
    ErrorStuck,
}

impl OutcomeStatus {
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::ErrorStuck)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    pub status: OutcomeStatus,
    /// Which queue or store the task came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one scheduling pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerResponse {
    #[serde(default)]
    pub processed_tasks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_tasks_processed: Option<u32>,
    #[serde(default)]
    pub pending_tasks_found: u32,
    #[serde(default)]
    pub stuck_tasks_found: u32,
    #[serde(default)]
    pub results: Vec<TaskOutcome>,
    /// RFC 3339 or epoch milliseconds.
    #[serde(default, with = "crate::timestamp::lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SchedulerResponse {
    /// Number of task outcomes that ended in an error.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_error()).count()
    }
}
