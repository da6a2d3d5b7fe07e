//! Dead-letter queue page state.
//!
//! The backend has no dead-letter endpoint yet, so the list is filled with
//! placeholder tasks and `is_sample` stays set. Retrying goes through the real
//! task retry call; removal only affects the local list.

use crate::state::StateCell;
use chrono::Utc;
use flowforge_client::{ApiClient, ClientError};
use flowforge_core::TaskId;
use flowforge_workflow::dead_letter::sample_tasks;
use flowforge_workflow::{DeadLetterFilter, DeadLetterSummary, DeadLetterTask};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeadLetterState {
    pub tasks: Vec<DeadLetterTask>,
    pub filter: DeadLetterFilter,
    pub loading: bool,
    /// Task whose retry is in flight.
    pub retrying: Option<TaskId>,
    pub error: Option<String>,
    /// The list is placeholder data, not backend state.
    pub is_sample: bool,
}

impl DeadLetterState {
    #[must_use]
    pub fn visible(&self) -> Vec<&DeadLetterTask> {
        self.filter.apply(&self.tasks)
    }

    #[must_use]
    pub fn summary(&self) -> DeadLetterSummary {
        DeadLetterSummary::of(&self.tasks)
    }
}

#[derive(Debug, Clone)]
pub struct DeadLetterStore {
    client: ApiClient,
    state: StateCell<DeadLetterState>,
}

impl DeadLetterStore {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: StateCell::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &StateCell<DeadLetterState> {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> DeadLetterState {
        self.state.snapshot()
    }

    /// Reloads the list. Keeps the current filter.
    pub fn load(&self) {
        let tasks = sample_tasks(Utc::now());
        tracing::debug!(count = tasks.len(), "loaded dead-letter placeholder tasks");
        self.state.update(|s| {
            s.tasks = tasks;
            s.is_sample = true;
            s.loading = false;
        });
    }

    /// Asks the backend to retry `task_id`, then reloads the list.
    ///
    /// # Errors
    ///
    /// Returns the client error after recording "Failed to retry task" or the
    /// server's message in `error`.
    pub async fn retry(&self, task_id: &TaskId) -> Result<(), ClientError> {
        self.state.update(|s| {
            s.retrying = Some(task_id.clone());
            s.error = None;
        });

        let result = self.client.retry_task(task_id).await;
        self.state.update(|s| s.retrying = None);

        match result {
            Ok(task) => {
                tracing::info!(%task_id, retry_count = task.retry_count, "task retry requested");
                self.load();
                Ok(())
            }
            Err(e) => {
                let message = e.user_message("Failed to retry task");
                self.state.update(|s| s.error = Some(message));
                Err(e)
            }
        }
    }

    /// Drops `task_id` from the local list. Returns whether it was present.
    pub fn remove(&self, task_id: &TaskId) -> bool {
        self.state.update(|s| {
            let before = s.tasks.len();
            s.tasks.retain(|t| &t.task.id != task_id);
            s.tasks.len() != before
        })
    }

    pub fn set_filter(&self, filter: DeadLetterFilter) {
        self.state.update(|s| s.filter = filter);
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn load_filter_and_remove() {
        let h = Harness::start("/dlq").await;
        let store = DeadLetterStore::new(h.client.clone());
        store.load();

        let state = store.snapshot();
        assert!(state.is_sample);
        assert_eq!(state.tasks.len(), 3);
        assert_eq!(state.summary().total, 3);

        store.set_filter(DeadLetterFilter {
            search: "TIMEOUT".to_string(),
            ..DeadLetterFilter::default()
        });
        let visible: Vec<_> = store
            .snapshot()
            .visible()
            .iter()
            .map(|t| t.task.id.to_string())
            .collect();
        assert_eq!(visible, vec!["1".to_string()]);

        assert!(store.remove(&TaskId::from("2")));
        assert!(!store.remove(&TaskId::from("2")));
        assert_eq!(store.snapshot().tasks.len(), 2);
    }

    #[tokio::test]
    async fn retry_calls_backend() {
        let h = Harness::start("/dlq").await;
        Mock::given(method("POST"))
            .and(path("/api/tasks/1/retry"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "id": "1", "runId": "run-123", "nodeId": "node-1", "status": "PENDING", "retryCount": 3 }
            })))
            .expect(1)
            .mount(&h.server)
            .await;

        let store = DeadLetterStore::new(h.client.clone());
        store.load();
        store.retry(&TaskId::from("1")).await.expect("retry");

        let state = store.snapshot();
        assert!(state.retrying.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn retry_failure_is_recorded() {
        let h = Harness::start("/dlq").await;
        Mock::given(method("POST"))
            .and(path("/api/tasks/2/retry"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&h.server)
            .await;

        let store = DeadLetterStore::new(h.client.clone());
        store.load();
        store.retry(&TaskId::from("2")).await.unwrap_err();
        assert_eq!(store.snapshot().error.as_deref(), Some("Failed to retry task"));
    }
}
