//! Failed-task queue shown on the dead-letter page.
//!
//! The backend exposes no dead-letter endpoint yet, so [`sample_tasks`]
//! produces a fixed placeholder list. Classification, filtering and the
//! summary figures work on any list of failed tasks.

use crate::execution::{RunStatus, Task};
use chrono::{DateTime, Duration, Utc};
use flowforge_core::{NodeId, RunId, TaskId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;

/// A failed task together with the name of its workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,
}

/// Coarse error category derived from the error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    Connection,
    ServerError,
    BadRequest,
    Validation,
    Unknown,
}

impl ErrorKind {
    /// First matching rule wins; matching is case-sensitive.
    #[must_use]
    pub fn classify(error: &str) -> Self {
        if error.contains("timeout") {
            Self::Timeout
        } else if error.contains("connection") {
            Self::Connection
        } else if error.contains("500") {
            Self::ServerError
        } else if error.contains("400") {
            Self::BadRequest
        } else if error.contains("Invalid") {
            Self::Validation
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Timeout => "Timeout",
            Self::Connection => "Connection",
            Self::ServerError => "Server Error",
            Self::BadRequest => "Bad Request",
            Self::Validation => "Validation",
            Self::Unknown => "Unknown",
        }
    }
}

impl DeadLetterTask {
    #[must_use]
    pub fn error_kind(&self) -> ErrorKind {
        ErrorKind::classify(self.task.error.as_deref().unwrap_or_default())
    }
}

/// Page filter. `None` and empty strings mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadLetterFilter {
    pub workflow: Option<String>,
    pub task_type: Option<String>,
    /// Case-insensitive substring of the error text.
    pub search: String,
}

impl DeadLetterFilter {
    #[must_use]
    pub fn matches(&self, entry: &DeadLetterTask) -> bool {
        if self
            .workflow
            .as_deref()
            .is_some_and(|w| entry.workflow_name.as_deref() != Some(w))
        {
            return false;
        }
        if self
            .task_type
            .as_deref()
            .is_some_and(|t| entry.task.node_type.as_deref() != Some(t))
        {
            return false;
        }
        self.search.is_empty()
            || entry
                .task
                .error
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }

    #[must_use]
    pub fn apply<'a>(&self, entries: &'a [DeadLetterTask]) -> Vec<&'a DeadLetterTask> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Figures for the stat cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadLetterSummary {
    pub total: usize,
    /// Tasks whose retry budget is spent.
    pub exhausted: usize,
    pub retryable: usize,
    /// Distinct workflow names, sorted.
    pub workflows: Vec<String>,
    /// Distinct node types, sorted.
    pub task_types: Vec<String>,
}

impl DeadLetterSummary {
    #[must_use]
    pub fn of(entries: &[DeadLetterTask]) -> Self {
        let retryable = entries.iter().filter(|e| e.task.can_retry()).count();
        let workflows: BTreeSet<_> = entries
            .iter()
            .filter_map(|e| e.workflow_name.clone())
            .collect();
        let task_types: BTreeSet<_> = entries
            .iter()
            .filter_map(|e| e.task.node_type.clone())
            .collect();
        Self {
            total: entries.len(),
            exhausted: entries.len() - retryable,
            retryable,
            workflows: workflows.into_iter().collect(),
            task_types: task_types.into_iter().collect(),
        }
    }
}

struct Sample {
    id: &'static str,
    run: &'static str,
    workflow: &'static str,
    node: &'static str,
    input: serde_json::Value,
    error: &'static str,
    retries: u32,
    hours_ago: i64,
    node_name: &'static str,
    node_type: &'static str,
    workflow_name: &'static str,
}

/// Placeholder failed tasks, timestamped relative to `now`.
#[must_use]
pub fn sample_tasks(now: DateTime<Utc>) -> Vec<DeadLetterTask> {
    let samples = [
        Sample {
            id: "1",
            run: "run-123",
            workflow: "wf-1",
            node: "node-1",
            input: json!({ "data": "test" }),
            error: "Connection timeout after 30 seconds",
            retries: 3,
            hours_ago: 1,
            node_name: "HTTP Request",
            node_type: "http",
            workflow_name: "Order Processing Pipeline",
        },
        Sample {
            id: "2",
            run: "run-124",
            workflow: "wf-2",
            node: "node-2",
            input: json!({ "email": "test@example.com" }),
            error: "Invalid email format",
            retries: 2,
            hours_ago: 2,
            node_name: "Send Email",
            node_type: "email",
            workflow_name: "Email Notification System",
        },
        Sample {
            id: "3",
            run: "run-125",
            workflow: "wf-3",
            node: "node-3",
            input: json!({ "webhook": "https://api.example.com/webhook" }),
            error: "Webhook endpoint returned 500 error",
            retries: 1,
            hours_ago: 3,
            node_name: "Webhook Call",
            node_type: "webhook",
            workflow_name: "Data Sync Workflow",
        },
    ];

    samples
        .into_iter()
        .map(|s| {
            let started = now - Duration::hours(s.hours_ago);
            let completed = started + Duration::seconds(100);
            DeadLetterTask {
                task: Task {
                    id: TaskId::from(s.id),
                    run_id: RunId::from(s.run),
                    workflow_id: Some(WorkflowId::from(s.workflow)),
                    node_id: NodeId::from(s.node),
                    node_name: Some(s.node_name.to_string()),
                    node_type: Some(s.node_type.to_string()),
                    status: RunStatus::Failed,
                    input: s.input,
                    output: serde_json::Value::Null,
                    error: Some(s.error.to_string()),
                    retry_count: s.retries,
                    max_retries: 3,
                    started_at: Some(started),
                    completed_at: Some(completed),
                    created_at: Some(started),
                    updated_at: Some(completed),
                },
                workflow_name: Some(s.workflow_name.to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_rules_in_order() {
        assert_eq!(ErrorKind::classify("Connection timeout after 30 seconds"), ErrorKind::Timeout);
        assert_eq!(ErrorKind::classify("lost connection"), ErrorKind::Connection);
        assert_eq!(ErrorKind::classify("returned 500 error"), ErrorKind::ServerError);
        assert_eq!(ErrorKind::classify("HTTP 400"), ErrorKind::BadRequest);
        assert_eq!(ErrorKind::classify("Invalid email format"), ErrorKind::Validation);
        assert_eq!(ErrorKind::classify("Connection refused"), ErrorKind::Unknown);
        assert_eq!(ErrorKind::Validation.label(), "Validation");
    }

    #[test]
    fn sample_list_is_three_failed_tasks() {
        let tasks = sample_tasks(Utc::now());
        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| t.task.status == RunStatus::Failed));
        assert_eq!(tasks[0].error_kind(), ErrorKind::Timeout);
        assert_eq!(tasks[2].error_kind(), ErrorKind::ServerError);
    }

    #[test]
    fn summary_counts_retry_budget() {
        let summary = DeadLetterSummary::of(&sample_tasks(Utc::now()));
        assert_eq!(summary.total, 3);
        assert_eq!(summary.exhausted, 1);
        assert_eq!(summary.retryable, 2);
        assert_eq!(summary.workflows.len(), 3);
        assert_eq!(summary.task_types, vec!["email", "http", "webhook"]);
    }

    #[test]
    fn filter_by_search_and_type() {
        let tasks = sample_tasks(Utc::now());
        let by_search = DeadLetterFilter {
            search: "WEBHOOK".to_string(),
            ..DeadLetterFilter::default()
        };
        assert_eq!(by_search.apply(&tasks).len(), 1);

        let by_type = DeadLetterFilter {
            task_type: Some("email".to_string()),
            workflow: Some("Data Sync Workflow".to_string()),
            ..DeadLetterFilter::default()
        };
        assert!(by_type.apply(&tasks).is_empty());
    }

    #[test]
    fn wire_shape_flattens_task() {
        let tasks = sample_tasks(Utc::now());
        let json = serde_json::to_value(&tasks[1]).expect("serialize");
        assert_eq!(json["workflowName"], "Email Notification System");
        assert_eq!(json["retryCount"], 2);
        assert_eq!(json["status"], "FAILED");
    }
}
