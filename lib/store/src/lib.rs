//! Application state for the FlowForge dashboard.
//!
//! Each store owns a [`StateCell`] and a clone of the [`ApiClient`]. Actions
//! set their busy flag, clear the previous error, call the client, then
//! either apply the result or record a user-facing message and hand the
//! error back to the caller. Views subscribe to the cells to re-render.

pub mod auth;
pub mod dead_letter;
pub mod run_detail;
pub mod scheduler;
pub mod state;
pub mod workflows;

pub use auth::{AuthState, AuthStore};
pub use dead_letter::{DeadLetterState, DeadLetterStore};
pub use run_detail::{RunDetailState, RunDetailStore};
pub use scheduler::{HISTORY_LIMIT, SchedulerState, SchedulerStore};
pub use state::StateCell;
pub use workflows::{DEFAULT_PAGE_SIZE, WorkflowState, WorkflowStore};

use flowforge_client::ApiClient;

/// Every store the application uses, built around one client.
#[derive(Debug, Clone)]
pub struct Stores {
    pub auth: AuthStore,
    pub workflows: WorkflowStore,
    pub scheduler: SchedulerStore,
    pub run_detail: RunDetailStore,
    pub dead_letter: DeadLetterStore,
}

impl Stores {
    /// Builds the stores and restores any persisted session.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let stores = Self {
            auth: AuthStore::new(client.clone()),
            workflows: WorkflowStore::new(client.clone()),
            scheduler: SchedulerStore::new(client.clone()),
            run_detail: RunDetailStore::new(client.clone()),
            dead_letter: DeadLetterStore::new(client),
        };
        stores.auth.restore();
        stores
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use flowforge_client::{
        ApiClient, ClientConfig, MemoryNavigator, MemoryStorage, User,
    };
    use flowforge_core::UserId;
    use serde_json::{Value as JsonValue, json};
    use std::sync::Arc;
    use wiremock::MockServer;

    pub struct Harness {
        pub server: MockServer,
        pub client: ApiClient,
        pub navigator: Arc<MemoryNavigator>,
    }

    impl Harness {
        pub async fn start(at: &str) -> Self {
            let server = MockServer::start().await;
            let navigator = Arc::new(MemoryNavigator::at(at));
            let config = ClientConfig {
                api_base_url: format!("{}/api", server.uri()),
                ..ClientConfig::default()
            };
            let client =
                ApiClient::new(config, Arc::new(MemoryStorage::new()), navigator.clone())
                    .expect("client");
            Self {
                server,
                client,
                navigator,
            }
        }

        pub fn sign_in(&self) {
            let user: User = serde_json::from_value(user_json()).expect("user");
            self.client.session().save("tok-1", &user).expect("save");
        }
    }

    pub fn user_json() -> JsonValue {
        json!({ "id": UserId::from("u-1"), "email": "ada@example.com", "role": "user" })
    }
}
