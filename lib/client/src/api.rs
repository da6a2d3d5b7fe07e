//! Typed REST client.
//!
//! One method per backend operation, each issuing exactly one request. The
//! bearer token is read from the [`Session`] on every call, so a login in
//! another part of the app takes effect immediately. Any 401 response clears
//! the session and, unless the user is already on an authentication page,
//! sends them to the login route.

use crate::auth::{Credentials, LoginResponse};
use crate::config::ClientConfig;
use crate::envelope::{ApiResponse, Page, error_message, unwrap_lenient};
use crate::error::ClientError;
use crate::navigation::{Navigator, is_auth_path};
use crate::scheduler::{SchedulerConfig, SchedulerKind, SchedulerResponse};
use crate::session::{Session, SessionStorage};
use flowforge_core::{RunId, TaskId, WorkflowId};
use flowforge_workflow::{Run, Task, WorkflowDefinition, WorkflowDraft, WorkflowUpdate};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

/// Body of the bulk delete call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDelete {
    pub workflow_ids: Vec<WorkflowId>,
    /// Delete even when runs are still active.
    pub force: bool,
    /// Also delete the workflows' runs and tasks.
    pub cascade: bool,
}

impl BulkDelete {
    #[must_use]
    pub fn new(workflow_ids: Vec<WorkflowId>) -> Self {
        Self {
            workflow_ids,
            force: false,
            cascade: true,
        }
    }
}

/// Client for the FlowForge REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Session,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base_url", &self.config.api_base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            config,
            session: Session::new(storage),
            navigator,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The persisted session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    fn handle_unauthorized(&self) {
        self.session.clear();
        let current = self.navigator.current_path();
        if is_auth_path(&current) {
            tracing::debug!(path = %current, "401 on authentication page; not redirecting");
            return;
        }
        tracing::info!(from = %current, to = %self.config.login_path, "session rejected; redirecting to login");
        self.navigator.redirect(&self.config.login_path);
    }

    /// Sends one request and returns the raw body of a success response.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        configure: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<String, ClientError> {
        let mut builder = self.http.request(method.clone(), self.config.endpoint(path));
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(%method, path, "sending request");
        let response = configure(builder).send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "request failed to send");
            ClientError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        tracing::warn!(%method, path, status = status.as_u16(), message = ?message, "request rejected");
        Err(match status.as_u16() {
            401 => {
                self.handle_unauthorized();
                ClientError::Unauthorized { message }
            }
            404 => ClientError::NotFound { message },
            code => ClientError::Api {
                status: code,
                message,
            },
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        configure: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<T, ClientError> {
        let body = self.dispatch(method, path, configure).await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(ClientError::decode)?;
        envelope.into_data()
    }

    async fn call_unit(
        &self,
        method: Method,
        path: &str,
        configure: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<(), ClientError> {
        self.dispatch(method, path, configure).await.map(|_| ())
    }

    async fn call_page<T: DeserializeOwned>(
        &self,
        path: &str,
        collection: &str,
        query: Vec<(&'static str, String)>,
    ) -> Result<Page<T>, ClientError> {
        let payload: JsonValue = self.call(Method::GET, path, |b| b.query(&query)).await?;
        Page::from_payload(payload, collection)
    }

    // ---- authentication ----

    /// Exchanges credentials for a token. Does not persist anything.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    #[tracing::instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        self.call(Method::POST, "/auth/login", |b| b.json(credentials))
            .await
    }

    /// Creates an account and returns its token. Does not persist anything.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    #[tracing::instrument(skip_all, fields(email = %credentials.email))]
    pub async fn register(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        self.call(Method::POST, "/auth/register", |b| b.json(credentials))
            .await
    }

    // ---- workflows ----

    /// # Errors
    ///
    /// Returns the server's rejection, a transport failure or a decode error.
    pub async fn list_workflows(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<WorkflowDefinition>, ClientError> {
        self.call_page(
            "/workflows",
            "workflows",
            vec![("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for an unknown id.
    pub async fn get_workflow(&self, id: &WorkflowId) -> Result<WorkflowDefinition, ClientError> {
        self.call(Method::GET, &format!("/workflows/{id}"), |b| b)
            .await
    }

    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    #[tracing::instrument(skip_all, fields(name = %draft.name, nodes = draft.nodes.len()))]
    pub async fn create_workflow(
        &self,
        draft: &WorkflowDraft,
    ) -> Result<WorkflowDefinition, ClientError> {
        self.call(Method::POST, "/workflows", |b| b.json(draft)).await
    }

    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_workflow(
        &self,
        id: &WorkflowId,
        update: &WorkflowUpdate,
    ) -> Result<WorkflowDefinition, ClientError> {
        self.call(Method::PUT, &format!("/workflows/{id}"), |b| b.json(update))
            .await
    }

    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    #[tracing::instrument(skip(self))]
    pub async fn delete_workflow(&self, id: &WorkflowId) -> Result<(), ClientError> {
        self.call_unit(Method::DELETE, &format!("/workflows/{id}"), |b| b)
            .await
    }

    /// Deletes several workflows in one request.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    #[tracing::instrument(skip_all, fields(count = request.workflow_ids.len()))]
    pub async fn delete_workflows(&self, request: &BulkDelete) -> Result<(), ClientError> {
        self.call_unit(Method::DELETE, "/workflows", |b| b.json(request))
            .await
    }

    // ---- runs and tasks ----

    /// Lists runs, optionally restricted to one workflow.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection, a transport failure or a decode error.
    pub async fn list_runs(
        &self,
        workflow_id: Option<&WorkflowId>,
        page: u32,
        limit: u32,
    ) -> Result<Page<Run>, ClientError> {
        let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(id) = workflow_id {
            query.push(("workflowId", id.to_string()));
        }
        self.call_page("/runs", "runs", query).await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for an unknown id.
    pub async fn get_run(&self, id: &RunId) -> Result<Run, ClientError> {
        self.call(Method::GET, &format!("/runs/{id}"), |b| b).await
    }

    /// Starts a new run of `workflow_id` with `input`.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    #[tracing::instrument(skip(self, input))]
    pub async fn trigger_run(
        &self,
        workflow_id: &WorkflowId,
        input: JsonValue,
    ) -> Result<Run, ClientError> {
        self.call(Method::POST, &format!("/workflows/{workflow_id}/runs"), |b| {
            b.json(&json!({ "input": input }))
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_run(&self, id: &RunId) -> Result<(), ClientError> {
        self.call_unit(Method::DELETE, &format!("/runs/{id}"), |b| b)
            .await
    }

    /// # Errors
    ///
    /// Returns the server's rejection, a transport failure or a decode error.
    pub async fn list_tasks(&self, run_id: &RunId) -> Result<Vec<Task>, ClientError> {
        self.call(Method::GET, &format!("/runs/{run_id}/tasks"), |b| b)
            .await
    }

    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for an unknown id.
    pub async fn get_task(&self, id: &TaskId) -> Result<Task, ClientError> {
        self.call(Method::GET, &format!("/tasks/{id}"), |b| b).await
    }

    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    #[tracing::instrument(skip(self))]
    pub async fn retry_task(&self, id: &TaskId) -> Result<Task, ClientError> {
        self.call(Method::POST, &format!("/tasks/{id}/retry"), |b| b)
            .await
    }

    // ---- scheduler ----

    /// Runs one scheduling pass. `config` is ignored for [`SchedulerKind::Cron`].
    ///
    /// # Errors
    ///
    /// Returns the server's rejection, a transport failure or a decode error.
    #[tracing::instrument(skip(self, config))]
    pub async fn trigger_scheduler(
        &self,
        kind: SchedulerKind,
        config: Option<&SchedulerConfig>,
    ) -> Result<SchedulerResponse, ClientError> {
        let body = config.filter(|_| kind.accepts_config()).cloned();
        let raw = self
            .dispatch(Method::POST, kind.path(), |b| match &body {
                Some(config) => b.json(config),
                None => b,
            })
            .await?;
        let value: JsonValue = serde_json::from_str(&raw).map_err(ClientError::decode)?;
        serde_json::from_value(unwrap_lenient(value)).map_err(ClientError::decode)
    }

    // ---- metrics ----

    /// Opaque metrics document for one workflow.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    pub async fn workflow_metrics(&self, id: &WorkflowId) -> Result<JsonValue, ClientError> {
        self.call(Method::GET, &format!("/workflows/{id}/metrics"), |b| b)
            .await
    }

    /// Opaque system-wide metrics document.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection or a transport failure.
    pub async fn system_metrics(&self) -> Result<JsonValue, ClientError> {
        self.call(Method::GET, "/metrics", |b| b).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::User;
    use crate::navigation::MemoryNavigator;
    use crate::session::MemoryStorage;
    use flowforge_core::UserId;
    use flowforge_workflow::{GraphEditor, RunStatus};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        server: MockServer,
        client: ApiClient,
        navigator: Arc<MemoryNavigator>,
    }

    async fn harness(at: &str) -> Harness {
        let server = MockServer::start().await;
        let navigator = Arc::new(MemoryNavigator::at(at));
        let config = ClientConfig {
            api_base_url: format!("{}/api", server.uri()),
            ..ClientConfig::default()
        };
        let client = ApiClient::new(config, Arc::new(MemoryStorage::new()), navigator.clone())
            .expect("client");
        Harness {
            server,
            client,
            navigator,
        }
    }

    fn user() -> User {
        User {
            id: UserId::from("u-1"),
            email: "ada@example.com".to_string(),
            role: "user".to_string(),
        }
    }

    fn run_json(id: &str, status: &str) -> JsonValue {
        json!({ "id": id, "workflowId": "wf-1", "status": status, "input": {} })
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let h = harness("/").await;
        h.client.session().save("tok-1", &user()).expect("save");

        Mock::given(method("GET"))
            .and(path("/api/metrics"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "data": { "totalRuns": 5 } })),
            )
            .expect(1)
            .mount(&h.server)
            .await;

        let metrics = h.client.system_metrics().await.expect("metrics");
        assert_eq!(metrics["totalRuns"], 5);
    }

    #[tokio::test]
    async fn list_workflows_normalizes_page() {
        let h = harness("/").await;
        Mock::given(method("GET"))
            .and(path("/api/workflows"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "workflows": [
                        { "id": "wf-2", "name": "Second", "nodes": [], "edges": [] },
                        { "id": "wf-1", "name": "First", "nodes": [], "edges": [] }
                    ],
                    "pagination": { "page": 2, "limit": 5, "total": 7, "pages": 2 }
                }
            })))
            .mount(&h.server)
            .await;

        let page = h.client.list_workflows(2, 5).await.expect("page");
        let names: Vec<_> = page.data.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
        assert_eq!(page.pagination.total, 7);
    }

    #[tokio::test]
    async fn list_runs_passes_workflow_filter() {
        let h = harness("/").await;
        Mock::given(method("GET"))
            .and(path("/api/runs"))
            .and(query_param("workflowId", "wf-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "runs": [run_json("r1", "RUNNING")], "pagination": { "page": 1, "limit": 10, "total": 1, "pages": 1 } }
            })))
            .mount(&h.server)
            .await;

        let page = h
            .client
            .list_runs(Some(&WorkflowId::from("wf-1")), 1, 10)
            .await
            .expect("runs");
        assert_eq!(page.data[0].status, RunStatus::Running);
    }

    #[tokio::test]
    async fn create_workflow_sends_editor_payload() {
        let h = harness("/workflow/new").await;
        let mut editor = GraphEditor::starter();
        editor.name = "Fetcher".to_string();
        let draft = editor.draft();
        let expected_body = serde_json::to_value(&draft).expect("json");

        Mock::given(method("POST"))
            .and(path("/api/workflows"))
            .and(body_json(expected_body))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": { "id": "wf-9", "name": "Fetcher", "nodes": [], "edges": [] }
            })))
            .expect(1)
            .mount(&h.server)
            .await;

        let created = h.client.create_workflow(&draft).await.expect("created");
        assert_eq!(created.id.as_str(), "wf-9");
    }

    #[tokio::test]
    async fn trigger_run_wraps_input() {
        let h = harness("/").await;
        Mock::given(method("POST"))
            .and(path("/api/workflows/wf-1/runs"))
            .and(body_json(json!({ "input": { "orderId": 7 } })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "data": run_json("r2", "PENDING") })),
            )
            .mount(&h.server)
            .await;

        let run = h
            .client
            .trigger_run(&WorkflowId::from("wf-1"), json!({ "orderId": 7 }))
            .await
            .expect("run");
        assert_eq!(run.id.as_str(), "r2");
    }

    #[tokio::test]
    async fn unauthorized_clears_session_and_redirects() {
        let h = harness("/runs/42").await;
        h.client.session().save("stale", &user()).expect("save");

        Mock::given(method("GET"))
            .and(path("/api/runs/42"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "success": false, "error": "Token expired" })),
            )
            .mount(&h.server)
            .await;

        let err = h.client.get_run(&RunId::from("42")).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized { .. }));
        assert_eq!(err.server_message(), Some("Token expired"));
        assert!(h.client.session().token().is_none());
        assert!(h.client.session().restore().is_none());
        assert_eq!(h.navigator.redirects(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn unauthorized_on_login_page_does_not_redirect() {
        let h = harness("/login").await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "success": false, "error": "Invalid credentials" })),
            )
            .mount(&h.server)
            .await;

        let err = h
            .client
            .login(&Credentials::new("a@b.c", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.server_message(), Some("Invalid credentials"));
        assert!(h.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_on_register_page_clears_session_without_redirect() {
        let h = harness("/register").await;
        h.client.session().save("stale", &user()).expect("save");
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "success": false, "error": "Registration closed" })),
            )
            .mount(&h.server)
            .await;

        let err = h
            .client
            .register(&Credentials::new("new@b.c", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized { .. }));
        assert_eq!(err.server_message(), Some("Registration closed"));
        assert!(h.client.session().token().is_none());
        assert!(h.navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn not_found_and_server_errors_are_distinguished() {
        let h = harness("/").await;
        Mock::given(method("GET"))
            .and(path("/api/workflows/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&h.server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/runs/r1"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "success": false, "error": "Run already finished" })),
            )
            .mount(&h.server)
            .await;

        let err = h
            .client
            .get_workflow(&WorkflowId::from("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = h.client.cancel_run(&RunId::from("r1")).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.server_message(), Some("Run already finished"));
    }

    #[tokio::test]
    async fn bulk_delete_sends_ids() {
        let h = harness("/").await;
        Mock::given(method("DELETE"))
            .and(path("/api/workflows"))
            .and(body_json(json!({ "workflowIds": ["a", "b"], "force": false, "cascade": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&h.server)
            .await;

        h.client
            .delete_workflows(&BulkDelete::new(vec![WorkflowId::from("a"), WorkflowId::from("b")]))
            .await
            .expect("deleted");
    }

    #[tokio::test]
    async fn cron_trigger_sends_no_body() {
        let h = harness("/").await;
        Mock::given(method("POST"))
            .and(path("/api/scheduler/cron"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "processedTasks": 0, "pendingTasksFound": 0, "stuckTasksFound": 0, "results": [] }
            })))
            .mount(&h.server)
            .await;

        let response = h
            .client
            .trigger_scheduler(SchedulerKind::Cron, Some(&SchedulerConfig::panel_defaults()))
            .await
            .expect("response");
        assert_eq!(response.processed_tasks, 0);

        let requests = h.server.received_requests().await.expect("recording enabled");
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn scheduler_accepts_bare_response() {
        let h = harness("/").await;
        Mock::given(method("POST"))
            .and(path("/api/scheduler/redis"))
            .and(body_json(json!({ "maxTasks": 10, "processRetryQueue": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "processedTasks": 2,
                "redisTasksProcessed": 2,
                "pendingTasksFound": 0,
                "stuckTasksFound": 0,
                "results": []
            })))
            .mount(&h.server)
            .await;

        let response = h
            .client
            .trigger_scheduler(SchedulerKind::Redis, Some(&SchedulerConfig::panel_defaults()))
            .await
            .expect("response");
        assert_eq!(response.redis_tasks_processed, Some(2));
    }

    #[tokio::test]
    async fn list_tasks_and_retry() {
        let h = harness("/").await;
        let task = json!({
            "id": "t1", "runId": "r1", "nodeId": "n1", "status": "FAILED",
            "retryCount": 1, "maxRetries": 3, "error": "timeout"
        });
        Mock::given(method("GET"))
            .and(path("/api/runs/r1/tasks"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": [task.clone()] })),
            )
            .mount(&h.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/tasks/t1/retry"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": task })))
            .expect(1)
            .mount(&h.server)
            .await;

        let tasks = h.client.list_tasks(&RunId::from("r1")).await.expect("tasks");
        assert_eq!(tasks.len(), 1);
        let retried = h.client.retry_task(&tasks[0].id).await.expect("retry");
        assert_eq!(retried.retry_count, 1);
    }
}
