//! Navigation seam used by the 401 handler.
//!
//! The client never touches the browser directly. It asks a [`Navigator`]
//! where the user currently is and tells it where to go.

use std::sync::{Mutex, PoisonError};

/// Paths on which a 401 does not trigger a redirect.
pub const AUTH_PATHS: [&str; 2] = ["/login", "/register"];

pub trait Navigator: Send + Sync {
    /// Path of the current location, e.g. `/runs/42`.
    fn current_path(&self) -> String;

    /// Leaves the current page for `path`.
    fn redirect(&self, path: &str);
}

/// True if `path` is one of the authentication pages.
#[must_use]
pub fn is_auth_path(path: &str) -> bool {
    AUTH_PATHS.iter().any(|p| path.contains(p))
}

/// Navigator for headless use: tracks a path and records redirects.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    path: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    /// Starts at `path`.
    #[must_use]
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(path.into()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// Every redirect so far, oldest first.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn redirect(&self, path: &str) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = path.to_string();
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}
