//! Manual scheduler controls.

use crate::state::StateCell;
use flowforge_client::{ApiClient, ClientError, SchedulerConfig, SchedulerKind, SchedulerResponse};

/// How many past results the panel keeps.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerState {
    pub is_processing: bool,
    pub last_result: Option<SchedulerResponse>,
    pub error: Option<String>,
    /// Newest first.
    pub processing_history: Vec<SchedulerResponse>,
}

impl SchedulerState {
    fn record(&mut self, result: SchedulerResponse) {
        self.processing_history.insert(0, result.clone());
        self.processing_history.truncate(HISTORY_LIMIT);
        self.last_result = Some(result);
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerStore {
    client: ApiClient,
    state: StateCell<SchedulerState>,
}

impl SchedulerStore {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: StateCell::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &StateCell<SchedulerState> {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> SchedulerState {
        self.state.snapshot()
    }

    /// Runs one scheduling pass of `kind` and records its result.
    ///
    /// # Errors
    ///
    /// Returns the client error after recording its message, or the
    /// per-kind fallback, in `error`.
    pub async fn trigger(
        &self,
        kind: SchedulerKind,
        config: Option<&SchedulerConfig>,
    ) -> Result<SchedulerResponse, ClientError> {
        self.state.update(|s| {
            s.is_processing = true;
            s.error = None;
        });

        match self.client.trigger_scheduler(kind, config).await {
            Ok(result) => {
                tracing::info!(
                    %kind,
                    processed = result.processed_tasks,
                    errors = result.error_count(),
                    "scheduler pass finished"
                );
                self.state.update(|s| {
                    s.record(result.clone());
                    s.is_processing = false;
                });
                Ok(result)
            }
            Err(e) => {
                self.state.update(|s| {
                    s.is_processing = false;
                    s.error = Some(e.user_message(kind.failure_message()));
                });
                Err(e)
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    pub fn clear_history(&self) {
        self.state.update(|s| s.processing_history.clear());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn response(processed: u32) -> SchedulerResponse {
        SchedulerResponse {
            processed_tasks: processed,
            redis_tasks_processed: None,
            pending_tasks_found: 0,
            stuck_tasks_found: 0,
            results: Vec::new(),
            timestamp: None,
        }
    }

    #[test]
    fn history_is_capped_newest_first() {
        let mut state = SchedulerState::default();
        for n in 0..12 {
            state.record(response(n));
        }
        assert_eq!(state.processing_history.len(), HISTORY_LIMIT);
        assert_eq!(state.processing_history[0].processed_tasks, 11);
        assert_eq!(state.processing_history[9].processed_tasks, 2);
        assert_eq!(state.last_result.map(|r| r.processed_tasks), Some(11));
    }

    #[tokio::test]
    async fn trigger_records_result() {
        let h = Harness::start("/").await;
        Mock::given(method("POST"))
            .and(path("/api/scheduler/mongo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "processedTasks": 1,
                    "pendingTasksFound": 1,
                    "stuckTasksFound": 0,
                    "results": [{ "taskId": "t1", "status": "processed", "source": "mongodb" }]
                }
            })))
            .mount(&h.server)
            .await;

        let store = SchedulerStore::new(h.client.clone());
        store
            .trigger(SchedulerKind::Mongo, Some(&SchedulerConfig::panel_defaults()))
            .await
            .expect("trigger");

        let state = store.snapshot();
        assert!(!state.is_processing);
        assert_eq!(state.processing_history.len(), 1);
        assert_eq!(state.last_result.map(|r| r.processed_tasks), Some(1));

        store.clear_history();
        assert!(store.snapshot().processing_history.is_empty());
    }

    #[tokio::test]
    async fn failure_uses_kind_specific_fallback() {
        let h = Harness::start("/").await;
        Mock::given(method("POST"))
            .and(path("/api/scheduler/redis"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&h.server)
            .await;

        let store = SchedulerStore::new(h.client.clone());
        store.trigger(SchedulerKind::Redis, None).await.unwrap_err();

        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some("Failed to trigger Redis scheduler"));
        assert!(state.processing_history.is_empty());
    }
}
