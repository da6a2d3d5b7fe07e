//! The run being inspected on the run detail page.

use crate::state::StateCell;
use chrono::{DateTime, Utc};
use flowforge_client::{ApiClient, ClientError};
use flowforge_core::RunId;
use flowforge_workflow::{Run, RunMetrics, Task};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunDetailState {
    pub run_id: Option<RunId>,
    pub run: Option<Run>,
    pub tasks: Vec<Task>,
    pub loading: bool,
    /// The backend does not know `run_id`.
    pub not_found: bool,
    pub error: Option<String>,
}

impl RunDetailState {
    /// Metrics for the loaded run, measured up to `now` while it is open.
    #[must_use]
    pub fn metrics(&self, now: DateTime<Utc>) -> Option<RunMetrics> {
        self.run
            .as_ref()
            .map(|run| RunMetrics::compute(run, &self.tasks, now))
    }

    #[must_use]
    pub fn should_poll(&self) -> bool {
        self.run.as_ref().is_some_and(Run::should_poll)
    }
}

#[derive(Debug, Clone)]
pub struct RunDetailStore {
    client: ApiClient,
    state: StateCell<RunDetailState>,
}

impl RunDetailStore {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: StateCell::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &StateCell<RunDetailState> {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> RunDetailState {
        self.state.snapshot()
    }

    #[must_use]
    pub fn should_poll(&self) -> bool {
        self.state.read(RunDetailState::should_poll)
    }

    /// Switches to `run_id` and loads it.
    pub async fn open(&self, run_id: RunId) -> Result<(), ClientError> {
        self.state.update(|s| {
            *s = RunDetailState {
                run_id: Some(run_id),
                ..RunDetailState::default()
            };
        });
        self.refresh().await
    }

    /// Fetches the run and its tasks together.
    ///
    /// A response for a run that is no longer open is discarded.
    ///
    /// # Errors
    ///
    /// Returns the first failing request's error. A 404 sets `not_found`.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let Some(run_id) = self.state.read(|s| s.run_id.clone()) else {
            return Ok(());
        };
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = futures::try_join!(
            self.client.get_run(&run_id),
            self.client.list_tasks(&run_id)
        );

        let current = |s: &RunDetailState| s.run_id.as_ref() == Some(&run_id);
        match result {
            Ok((run, tasks)) => {
                tracing::debug!(%run_id, status = %run.status.as_str(), tasks = tasks.len(), "run refreshed");
                self.state.update(|s| {
                    if current(s) {
                        s.run = Some(run);
                        s.tasks = tasks;
                        s.not_found = false;
                        s.loading = false;
                    }
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%run_id, error = %e, "failed to load run");
                self.state.update(|s| {
                    if !current(s) {
                        return;
                    }
                    s.loading = false;
                    if e.is_not_found() {
                        s.not_found = true;
                        s.run = None;
                        s.tasks.clear();
                    } else {
                        s.error = Some(e.user_message("Failed to load run data"));
                    }
                });
                Err(e)
            }
        }
    }

    /// Cancels the open run, then reloads it.
    pub async fn cancel(&self) -> Result<(), ClientError> {
        let Some(run_id) = self.state.read(|s| s.run_id.clone()) else {
            return Ok(());
        };
        if let Err(e) = self.client.cancel_run(&run_id).await {
            self.record_error(&e, "Failed to cancel run");
            return Err(e);
        }
        tracing::info!(%run_id, "run cancelled");
        self.refresh().await
    }

    /// Starts a new run of the same workflow with the same input.
    ///
    /// Returns `None` when no run is loaded.
    pub async fn rerun(&self) -> Result<Option<Run>, ClientError> {
        let Some((workflow_id, input)) = self
            .state
            .read(|s| s.run.as_ref().map(|r| (r.workflow_id.clone(), r.input.clone())))
        else {
            return Ok(None);
        };
        match self.client.trigger_run(&workflow_id, input).await {
            Ok(run) => {
                tracing::info!(run_id = %run.id, %workflow_id, "run restarted");
                Ok(Some(run))
            }
            Err(e) => {
                self.record_error(&e, "Failed to retry run");
                Err(e)
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    fn record_error(&self, error: &ClientError, fallback: &str) {
        let message = error.user_message(fallback);
        self.state.update(|s| s.error = Some(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;
    use flowforge_workflow::RunStatus;
    use serde_json::{Value as JsonValue, json};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn run_json(status: &str) -> JsonValue {
        json!({
            "id": "r1",
            "workflowId": "wf-1",
            "status": status,
            "input": { "orderId": 7 },
            "startedAt": "2024-05-01T12:00:00Z"
        })
    }

    async fn mount_run(server: &MockServer, status: &str) {
        Mock::given(method("GET"))
            .and(path("/api/runs/r1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": run_json(status) })),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/runs/r1/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [
                    { "id": "t1", "runId": "r1", "nodeId": "n1", "status": "SUCCESS" },
                    { "id": "t2", "runId": "r1", "nodeId": "n2", "status": "RUNNING" }
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn open_loads_run_and_tasks() {
        let h = Harness::start("/runs/r1").await;
        mount_run(&h.server, "RUNNING").await;

        let store = RunDetailStore::new(h.client.clone());
        store.open(RunId::from("r1")).await.expect("open");

        let state = store.snapshot();
        assert_eq!(state.run.as_ref().map(|r| r.status), Some(RunStatus::Running));
        assert_eq!(state.tasks.len(), 2);
        assert!(store.should_poll());

        let metrics = state.metrics(Utc::now()).expect("metrics");
        assert_eq!(metrics.total_tasks, 2);
        assert_eq!(metrics.successful_tasks, 1);
    }

    #[tokio::test]
    async fn finished_run_stops_polling() {
        let h = Harness::start("/runs/r1").await;
        mount_run(&h.server, "SUCCESS").await;

        let store = RunDetailStore::new(h.client.clone());
        store.open(RunId::from("r1")).await.expect("open");
        assert!(!store.should_poll());
    }

    #[tokio::test]
    async fn missing_run_is_not_found() {
        let h = Harness::start("/runs/nope").await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&h.server)
            .await;

        let store = RunDetailStore::new(h.client.clone());
        let err = store.open(RunId::from("nope")).await.unwrap_err();

        assert!(err.is_not_found());
        let state = store.snapshot();
        assert!(state.not_found);
        assert!(state.error.is_none());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn rerun_reuses_input() {
        let h = Harness::start("/runs/r1").await;
        mount_run(&h.server, "FAILED").await;
        Mock::given(method("POST"))
            .and(path("/api/workflows/wf-1/runs"))
            .and(body_json(json!({ "input": { "orderId": 7 } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "id": "r2", "workflowId": "wf-1", "status": "PENDING" }
            })))
            .expect(1)
            .mount(&h.server)
            .await;

        let store = RunDetailStore::new(h.client.clone());
        assert!(store.rerun().await.expect("nothing loaded").is_none());

        store.open(RunId::from("r1")).await.expect("open");
        let fresh = store.rerun().await.expect("rerun").expect("new run");
        assert_eq!(fresh.id.as_str(), "r2");
    }

    #[tokio::test]
    async fn cancel_failure_is_recorded() {
        let h = Harness::start("/runs/r1").await;
        mount_run(&h.server, "RUNNING").await;
        Mock::given(method("DELETE"))
            .and(path("/api/runs/r1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&h.server)
            .await;

        let store = RunDetailStore::new(h.client.clone());
        store.open(RunId::from("r1")).await.expect("open");
        store.cancel().await.unwrap_err();
        assert_eq!(store.snapshot().error.as_deref(), Some("Failed to cancel run"));
    }
}
