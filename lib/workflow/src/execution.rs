//! Runs, tasks and the views derived from them.
//!
//! A run is one execution of a workflow; a task is one node's execution
//! within a run. The backend owns their lifecycle. Everything here is a
//! read-side projection: status badges, durations, run-level metrics, an
//! activity log reconstructed from task timestamps, and a grid layout for
//! drawing the tasks of a run as a chain.

use crate::edge::WorkflowEdge;
use crate::node::Position;
use chrono::{DateTime, SecondsFormat, Utc};
use flowforge_core::{NodeId, RunId, TaskId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Duration;

/// How often a RUNNING run is re-fetched.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Lifecycle state shared by runs and tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
}

impl RunStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Running,
        Self::Success,
        Self::Failed,
        Self::Canceled,
    ];

    /// Wire name, e.g. `RUNNING`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Badge text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        }
    }

    /// Parses a filter value; `"all"` and unknown values mean no filter.
    #[must_use]
    pub fn from_filter(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Canceled)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The workflow summary the backend embeds in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWorkflowRef {
    pub name: String,
}

/// One execution of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: RunId,
    pub workflow_id: WorkflowId,
    pub status: RunStatus,
    #[serde(default)]
    pub input: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<RunWorkflowRef>,
}

impl Run {
    /// Whether the run detail view should keep refreshing this run.
    #[must_use]
    pub fn should_poll(&self) -> bool {
        self.status == RunStatus::Running
    }

    #[must_use]
    pub fn workflow_name(&self) -> Option<&str> {
        self.workflow.as_ref().map(|w| w.name.as_str())
    }

    /// Dashboard duration label.
    #[must_use]
    pub fn duration_label(&self) -> String {
        format_duration(self.started_at, self.completed_at)
    }
}

/// One node's execution within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub run_id: RunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub input: JsonValue,
    #[serde(default)]
    pub output: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Node name, falling back to the node id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.node_name.as_deref().unwrap_or(self.node_id.as_str())
    }

    /// Milliseconds between start and completion, when both are known.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        Some((self.completed_at? - self.started_at?).num_milliseconds())
    }

    /// Whether the retry budget still allows a manual retry.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}

/// `Ns` below a minute, `Mm Ss` above; `Running...` while incomplete.
#[must_use]
pub fn format_duration(
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
) -> String {
    let (Some(start), Some(end)) = (started_at, completed_at) else {
        return "Running...".to_string();
    };
    let seconds = (end - start).num_seconds().max(0);
    if seconds < 60 {
        format!("{seconds}s")
    } else {
        format!("{}m {}s", seconds / 60, seconds % 60)
    }
}

/// Dashboard run-list filter. `None` and empty strings mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFilter {
    /// Exact workflow name.
    pub workflow: Option<String>,
    pub status: Option<RunStatus>,
    /// Case-insensitive substring of the run id.
    pub search: String,
}

impl RunFilter {
    #[must_use]
    pub fn matches(&self, run: &Run) -> bool {
        if self
            .workflow
            .as_deref()
            .is_some_and(|w| run.workflow_name() != Some(w))
        {
            return false;
        }
        if self.status.is_some_and(|s| s != run.status) {
            return false;
        }
        self.search.is_empty()
            || run
                .id
                .as_str()
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }

    #[must_use]
    pub fn apply<'a>(&self, runs: &'a [Run]) -> Vec<&'a Run> {
        runs.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Aggregate figures for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunMetrics {
    pub total_tasks: usize,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
    pub total_retries: u32,
    /// Elapsed milliseconds; measured up to `now` while the run is open.
    pub execution_time_ms: i64,
    /// Percentage of successful tasks, 0 when there are none.
    pub success_rate: f64,
}

impl RunMetrics {
    #[must_use]
    pub fn compute(run: &Run, tasks: &[Task], now: DateTime<Utc>) -> Self {
        let successful_tasks = tasks
            .iter()
            .filter(|t| t.status == RunStatus::Success)
            .count();
        let failed_tasks = tasks
            .iter()
            .filter(|t| t.status == RunStatus::Failed)
            .count();
        let total_retries = tasks.iter().map(|t| t.retry_count).sum();
        let execution_time_ms = run
            .started_at
            .map(|start| (run.completed_at.unwrap_or(now) - start).num_milliseconds())
            .unwrap_or_default();
        let success_rate = if tasks.is_empty() {
            0.0
        } else {
            successful_tasks as f64 / tasks.len() as f64 * 100.0
        };

        Self {
            total_tasks: tasks.len(),
            successful_tasks,
            failed_tasks,
            total_retries,
            execution_time_ms,
            success_rate,
        }
    }
}

fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Log lines reconstructed from task timestamps, in task order.
#[must_use]
pub fn activity_log(tasks: &[Task]) -> Vec<String> {
    let mut lines = Vec::new();
    for task in tasks {
        let label = task.label();
        if let Some(created) = task.created_at {
            lines.push(format!("[{}] INFO: Starting task {label}", stamp(created)));
        }
        if let Some(started) = task.started_at {
            lines.push(format!("[{}] INFO: Task {label} is running", stamp(started)));
        }
        if let Some(completed) = task.completed_at {
            match task.status {
                RunStatus::Success => lines.push(format!(
                    "[{}] SUCCESS: Task {label} completed successfully",
                    stamp(completed)
                )),
                RunStatus::Failed => lines.push(format!(
                    "[{}] ERROR: Task {label} failed: {}",
                    stamp(completed),
                    task.error.as_deref().unwrap_or("unknown error")
                )),
                _ => {}
            }
        }
    }
    lines
}

/// A task placed on the run graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskGraphNode {
    pub node_id: NodeId,
    pub task_id: TaskId,
    pub label: String,
    pub status: RunStatus,
    pub position: Position,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
}

/// Lays tasks out three per row and chains them in order.
#[must_use]
pub fn task_graph(tasks: &[Task]) -> (Vec<TaskGraphNode>, Vec<WorkflowEdge>) {
    let nodes = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| TaskGraphNode {
            node_id: task.node_id.clone(),
            task_id: task.id.clone(),
            label: task.label().to_string(),
            status: task.status,
            position: Position::new((i % 3) as f64 * 200.0 + 100.0, (i / 3) as f64 * 150.0 + 100.0),
            duration_ms: task.duration_ms(),
            error: task.error.clone(),
        })
        .collect();
    let edges = tasks
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            WorkflowEdge::new(format!("e{i}"), pair[0].node_id.clone(), pair[1].node_id.clone())
                .with_type("smoothstep")
        })
        .collect();
    (nodes, edges)
}

/// Headline figures on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemStats {
    pub total_workflows: usize,
    pub total_runs: u64,
    pub success_rate: f64,
    pub avg_task_duration: f64,
}

impl SystemStats {
    /// Reads the opaque metrics document, defaulting missing fields to zero.
    #[must_use]
    pub fn from_metrics(total_workflows: usize, metrics: &JsonValue) -> Self {
        let number = |key: &str| metrics.get(key).and_then(JsonValue::as_f64).unwrap_or(0.0);
        Self {
            total_workflows,
            total_runs: metrics
                .get("totalRuns")
                .and_then(JsonValue::as_u64)
                .unwrap_or(0),
            success_rate: number("successRate"),
            avg_task_duration: number("avgTaskDuration"),
        }
    }
}
