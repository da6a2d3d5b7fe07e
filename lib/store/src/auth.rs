//! Authentication state.

use crate::state::StateCell;
use flowforge_client::{ApiClient, ClientError, Credentials, LoginResponse, User};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthStore {
    client: ApiClient,
    state: StateCell<AuthState>,
}

impl AuthStore {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: StateCell::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &StateCell<AuthState> {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.snapshot()
    }

    /// Loads a persisted session, if any. Unreadable data counts as none.
    pub fn restore(&self) {
        let restored = self.client.session().restore();
        self.state.update(|s| match restored {
            Some((token, user)) => {
                tracing::debug!(user_id = %user.id, "restored persisted session");
                s.user = Some(user);
                s.token = Some(token);
                s.is_authenticated = true;
            }
            None => {
                s.user = None;
                s.token = None;
                s.is_authenticated = false;
            }
        });
    }

    /// Re-checks the persisted session and drops the in-memory one if the
    /// token has since been cleared, e.g. by a 401. Returns whether the user
    /// is still signed in.
    pub fn validate_session(&self) -> bool {
        if self.client.session().token().is_some() {
            return self.state.read(|s| s.is_authenticated);
        }
        if self.state.read(|s| s.is_authenticated) {
            tracing::info!("persisted token gone; signing out");
            self.reset();
        }
        false
    }

    /// Signs in and persists the session.
    ///
    /// # Errors
    ///
    /// Returns the client error after recording its message in `error`.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ClientError> {
        self.begin();
        let result = self.client.login(credentials).await;
        self.finish(result, "Login failed")
    }

    /// Creates an account, then signs in as it.
    ///
    /// # Errors
    ///
    /// Returns the client error after recording its message in `error`.
    pub async fn register(&self, credentials: &Credentials) -> Result<User, ClientError> {
        self.begin();
        let result = self.client.register(credentials).await;
        self.finish(result, "Registration failed")
    }

    /// Clears the persisted and in-memory session.
    pub fn logout(&self) {
        self.client.session().clear();
        self.reset();
        tracing::info!("signed out");
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    fn begin(&self) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn finish(
        &self,
        result: Result<LoginResponse, ClientError>,
        fallback: &str,
    ) -> Result<User, ClientError> {
        let persisted = result.and_then(|response| {
            self.client
                .session()
                .save(&response.token, &response.user)?;
            Ok(response)
        });

        match persisted {
            Ok(LoginResponse { token, user }) => {
                tracing::info!(user_id = %user.id, "signed in");
                self.state.update(|s| {
                    s.user = Some(user.clone());
                    s.token = Some(token);
                    s.is_authenticated = true;
                    s.loading = false;
                    s.error = None;
                });
                Ok(user)
            }
            Err(e) => {
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(e.user_message(fallback));
                });
                Err(e)
            }
        }
    }

    fn reset(&self) {
        self.state.update(|s| *s = AuthState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, user_json};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn login_persists_session() {
        let h = Harness::start("/login").await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "token": "tok-1", "user": user_json() }
            })))
            .mount(&h.server)
            .await;

        let store = AuthStore::new(h.client.clone());
        let user = store
            .login(&Credentials::new("ada@example.com", "secret"))
            .await
            .expect("login");

        assert_eq!(user.email, "ada@example.com");
        let state = store.snapshot();
        assert!(state.is_authenticated);
        assert!(!state.loading);
        assert_eq!(state.token.as_deref(), Some("tok-1"));
        assert_eq!(h.client.session().token().as_deref(), Some("tok-1"));

        // A fresh store sees the same session.
        let restored = AuthStore::new(h.client.clone());
        restored.restore();
        assert_eq!(restored.snapshot().user, Some(user));
    }

    #[tokio::test]
    async fn failed_login_records_server_message() {
        let h = Harness::start("/login").await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "success": false, "error": "Invalid credentials" })),
            )
            .mount(&h.server)
            .await;

        let store = AuthStore::new(h.client.clone());
        let err = store
            .login(&Credentials::new("ada@example.com", "nope"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Unauthorized { .. }));
        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
        assert!(!state.is_authenticated);
        assert!(!state.loading);

        store.clear_error();
        assert!(store.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn register_falls_back_to_generic_message() {
        let h = Harness::start("/register").await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&h.server)
            .await;

        let store = AuthStore::new(h.client.clone());
        store
            .register(&Credentials::new("new@example.com", "pw"))
            .await
            .unwrap_err();
        assert_eq!(store.snapshot().error.as_deref(), Some("Registration failed"));
    }

    #[tokio::test]
    async fn logout_and_validation() {
        let h = Harness::start("/").await;
        h.sign_in();

        let store = AuthStore::new(h.client.clone());
        store.restore();
        assert!(store.validate_session());

        h.client.session().clear();
        assert!(!store.validate_session());
        assert_eq!(store.snapshot(), AuthState::default());

        h.sign_in();
        store.restore();
        store.logout();
        assert!(h.client.session().token().is_none());
        assert!(!store.snapshot().is_authenticated);
    }
}
