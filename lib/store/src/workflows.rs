//! Workflow and run lists shown on the dashboard.

use crate::state::StateCell;
use flowforge_client::{ApiClient, BulkDelete, ClientError, Pagination};
use flowforge_core::WorkflowId;
use flowforge_workflow::{Run, WorkflowDefinition, WorkflowDraft, WorkflowUpdate};
use serde_json::Value as JsonValue;

/// Page size used when an action refreshes a list on its own.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    pub workflows: Vec<WorkflowDefinition>,
    pub runs: Vec<Run>,
    pub pagination: Pagination,
    pub run_pagination: Pagination,
    /// Last system metrics document, if fetched.
    pub metrics: Option<JsonValue>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WorkflowStore {
    client: ApiClient,
    state: StateCell<WorkflowState>,
}

impl WorkflowStore {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: StateCell::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &StateCell<WorkflowState> {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> WorkflowState {
        self.state.snapshot()
    }

    pub async fn fetch_workflows(&self, page: u32, limit: u32) -> Result<(), ClientError> {
        self.begin();
        let page = self
            .client
            .list_workflows(page, limit)
            .await
            .map_err(|e| self.fail(e, "Failed to fetch workflows"))?;
        self.state.update(|s| {
            s.workflows = page.data;
            s.pagination = page.pagination;
            s.loading = false;
        });
        Ok(())
    }

    /// Loads one workflow for editing. The list is left as it is.
    pub async fn fetch_workflow(&self, id: &WorkflowId) -> Result<WorkflowDefinition, ClientError> {
        self.begin();
        let workflow = self
            .client
            .get_workflow(id)
            .await
            .map_err(|e| self.fail(e, "Failed to fetch workflow"))?;
        self.state.update(|s| s.loading = false);
        Ok(workflow)
    }

    /// Creates a workflow and reloads the first page of the list.
    ///
    /// # Errors
    ///
    /// Returns the creation error. A failed reload is recorded in `error`
    /// but does not fail the call.
    pub async fn create_workflow(
        &self,
        draft: &WorkflowDraft,
    ) -> Result<WorkflowDefinition, ClientError> {
        self.begin();
        let created = self
            .client
            .create_workflow(draft)
            .await
            .map_err(|e| self.fail(e, "Failed to create workflow"))?;
        tracing::info!(workflow_id = %created.id, "workflow created");
        self.reload_workflows().await;
        Ok(created)
    }

    pub async fn update_workflow(
        &self,
        id: &WorkflowId,
        update: &WorkflowUpdate,
    ) -> Result<WorkflowDefinition, ClientError> {
        self.begin();
        let updated = self
            .client
            .update_workflow(id, update)
            .await
            .map_err(|e| self.fail(e, "Failed to update workflow"))?;
        self.reload_workflows().await;
        Ok(updated)
    }

    pub async fn delete_workflow(&self, id: &WorkflowId) -> Result<(), ClientError> {
        self.begin();
        self.client
            .delete_workflow(id)
            .await
            .map_err(|e| self.fail(e, "Failed to delete workflow"))?;
        self.reload_workflows().await;
        Ok(())
    }

    /// Deletes several workflows with their runs.
    pub async fn delete_workflows(&self, ids: Vec<WorkflowId>) -> Result<(), ClientError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.begin();
        self.client
            .delete_workflows(&BulkDelete::new(ids))
            .await
            .map_err(|e| self.fail(e, "Failed to delete workflows"))?;
        self.reload_workflows().await;
        Ok(())
    }

    pub async fn fetch_runs(
        &self,
        workflow_id: Option<&WorkflowId>,
        page: u32,
        limit: u32,
    ) -> Result<(), ClientError> {
        self.begin();
        let page = self
            .client
            .list_runs(workflow_id, page, limit)
            .await
            .map_err(|e| self.fail(e, "Failed to fetch runs"))?;
        self.state.update(|s| {
            s.runs = page.data;
            s.run_pagination = page.pagination;
            s.loading = false;
        });
        Ok(())
    }

    /// Starts a run and reloads the recent runs list.
    pub async fn trigger_run(
        &self,
        workflow_id: &WorkflowId,
        input: JsonValue,
    ) -> Result<Run, ClientError> {
        self.begin();
        let run = self
            .client
            .trigger_run(workflow_id, input)
            .await
            .map_err(|e| self.fail(e, "Failed to trigger run"))?;
        tracing::info!(run_id = %run.id, %workflow_id, "run triggered");
        if let Err(e) = self.fetch_runs(None, 1, DEFAULT_PAGE_SIZE).await {
            tracing::warn!(error = %e, "failed to reload runs after trigger");
        }
        Ok(run)
    }

    /// Loads the system metrics document. Failures leave the previous
    /// document in place.
    pub async fn fetch_metrics(&self) -> Result<(), ClientError> {
        match self.client.system_metrics().await {
            Ok(metrics) => {
                self.state.update(|s| s.metrics = Some(metrics));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load system metrics");
                Err(e)
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    async fn reload_workflows(&self) {
        if let Err(e) = self.fetch_workflows(1, DEFAULT_PAGE_SIZE).await {
            tracing::warn!(error = %e, "failed to reload workflows");
        }
    }

    fn begin(&self) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn fail(&self, error: ClientError, fallback: &str) -> ClientError {
        self.state.update(|s| {
            s.loading = false;
            s.error = Some(error.user_message(fallback));
        });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn workflow_json(id: &str, name: &str) -> JsonValue {
        json!({ "id": id, "name": name, "nodes": [], "edges": [] })
    }

    fn list_body(workflows: Vec<JsonValue>) -> JsonValue {
        let total = workflows.len();
        json!({
            "success": true,
            "data": {
                "workflows": workflows,
                "pagination": { "page": 1, "limit": 10, "total": total, "pages": 1 }
            }
        })
    }

    #[tokio::test]
    async fn fetch_replaces_list_and_pagination() {
        let h = Harness::start("/").await;
        Mock::given(method("GET"))
            .and(path("/api/workflows"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(vec![
                workflow_json("b", "Beta"),
                workflow_json("a", "Alpha"),
            ])))
            .mount(&h.server)
            .await;

        let store = WorkflowStore::new(h.client.clone());
        store.fetch_workflows(1, 10).await.expect("fetch");

        let state = store.snapshot();
        let names: Vec<_> = state.workflows.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
        assert_eq!(state.pagination.total, 2);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn create_refreshes_list() {
        let h = Harness::start("/workflow/new").await;
        Mock::given(method("POST"))
            .and(path("/api/workflows"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": workflow_json("new", "Fresh")
            })))
            .mount(&h.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/workflows"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(list_body(vec![workflow_json("new", "Fresh")])),
            )
            .expect(1)
            .mount(&h.server)
            .await;

        let store = WorkflowStore::new(h.client.clone());
        let draft = WorkflowDraft {
            name: "Fresh".to_string(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        let created = store.create_workflow(&draft).await.expect("create");

        assert_eq!(created.id.as_str(), "new");
        assert_eq!(store.snapshot().workflows.len(), 1);
    }

    #[tokio::test]
    async fn failures_record_message_and_propagate() {
        let h = Harness::start("/").await;
        Mock::given(method("POST"))
            .and(path("/api/workflows/wf-1/runs"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "success": false, "error": "Workflow has no nodes" })),
            )
            .mount(&h.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/runs"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&h.server)
            .await;

        let store = WorkflowStore::new(h.client.clone());
        let err = store
            .trigger_run(&WorkflowId::from("wf-1"), json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(store.snapshot().error.as_deref(), Some("Workflow has no nodes"));

        store.fetch_runs(None, 1, 10).await.unwrap_err();
        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some("Failed to fetch runs"));
        assert!(!state.loading);

        store.clear_error();
        assert!(store.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn single_workflow_fetch_leaves_list_alone() {
        let h = Harness::start("/workflow/wf-9").await;
        Mock::given(method("GET"))
            .and(path("/api/workflows/wf-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": workflow_json("wf-9", "Nightly")
            })))
            .mount(&h.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/workflows/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&h.server)
            .await;

        let store = WorkflowStore::new(h.client.clone());
        let workflow = store.fetch_workflow(&WorkflowId::from("wf-9")).await.expect("fetch");
        assert_eq!(workflow.name, "Nightly");
        assert!(store.snapshot().workflows.is_empty());

        let err = store
            .fetch_workflow(&WorkflowId::from("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.snapshot().error.as_deref(), Some("Failed to fetch workflow"));
    }

    #[tokio::test]
    async fn bulk_delete_skips_empty_selection() {
        let h = Harness::start("/").await;
        Mock::given(method("DELETE"))
            .and(path("/api/workflows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(0)
            .mount(&h.server)
            .await;

        let store = WorkflowStore::new(h.client.clone());
        store.delete_workflows(Vec::new()).await.expect("no-op");
    }

    #[tokio::test]
    async fn metrics_are_kept() {
        let h = Harness::start("/").await;
        Mock::given(method("GET"))
            .and(path("/api/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "totalRuns": 12, "successRate": 75.0 }
            })))
            .mount(&h.server)
            .await;

        let store = WorkflowStore::new(h.client.clone());
        store.fetch_metrics().await.expect("metrics");
        assert_eq!(store.snapshot().metrics.expect("metrics")["totalRuns"], 12);
    }
}
