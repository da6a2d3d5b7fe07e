//! Persisted authentication state.
//!
//! The token and the user record live in a key-value store under
//! `auth_token` and `user`. The browser build backs this with
//! `localStorage`; native consumers can use [`MemoryStorage`] or
//! [`FileStorage`]. [`Session`] is the typed view over either.

use crate::auth::User;
use crate::error::ClientError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key of the JSON user record.
pub const USER_KEY: &str = "user";

/// A string key-value store that survives page reloads.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;

    fn remove(&self, key: &str);
}

/// Typed access to the persisted token and user.
#[derive(Clone)]
pub struct Session {
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_token", &self.token().is_some())
            .finish()
    }
}

impl Session {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// The persisted user and token, if both are present and readable.
    ///
    /// A user record that does not parse is treated as no session at all:
    /// both keys are removed.
    #[must_use]
    pub fn restore(&self) -> Option<(String, User)> {
        let token = self.token()?;
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some((token, user)),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable persisted user");
                self.clear();
                None
            }
        }
    }

    /// Persists a fresh login.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if either key cannot be written.
    pub fn save(&self, token: &str, user: &User) -> Result<(), ClientError> {
        let user_json =
            serde_json::to_string(user).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_KEY, &user_json)
    }

    /// Removes both keys.
    pub fn clear(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(USER_KEY);
    }
}

/// In-process storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::SessionStorage;
    use crate::error::ClientError;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Mutex, PoisonError};

    /// Storage backed by a JSON object in a file.
    #[derive(Debug)]
    pub struct FileStorage {
        path: PathBuf,
        lock: Mutex<()>,
    }

    impl FileStorage {
        #[must_use]
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                lock: Mutex::new(()),
            }
        }

        fn read(&self) -> HashMap<String, String> {
            let Ok(bytes) = std::fs::read(&self.path) else {
                return HashMap::new();
            };
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt session file");
                HashMap::new()
            })
        }

        fn write(&self, values: &HashMap<String, String>) -> Result<(), ClientError> {
            let bytes =
                serde_json::to_vec_pretty(values).map_err(|e| ClientError::Storage(e.to_string()))?;
            std::fs::write(&self.path, bytes).map_err(|e| ClientError::Storage(e.to_string()))
        }
    }

    impl SessionStorage for FileStorage {
        fn get(&self, key: &str) -> Option<String> {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.read().remove(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut values = self.read();
            values.insert(key.to_string(), value.to_string());
            self.write(&values)
        }

        fn remove(&self, key: &str) {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut values = self.read();
            if values.remove(key).is_none() {
                return;
            }
            if let Err(e) = self.write(&values) {
                tracing::warn!(key, error = %e, "failed to remove session key");
            }
        }
    }
}
