//! Shared, observable state.

use std::sync::{Arc, PoisonError, RwLock};

type Listener = Arc<dyn Fn() + Send + Sync>;

/// A value shared between a store and its views.
///
/// Writers go through [`StateCell::update`], which notifies every subscriber
/// after the lock is released. Readers take a [`StateCell::snapshot`].
pub struct StateCell<T> {
    value: Arc<RwLock<T>>,
    listeners: Arc<RwLock<Vec<Listener>>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.value.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_tuple("StateCell").field(&*value).finish()
    }
}

impl<T: Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> StateCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.value.read().unwrap_or_else(PoisonError::into_inner);
        f(&*value)
    }

    /// Mutates the value, then notifies subscribers.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = self.value.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut *value)
        };
        self.notify();
        result
    }

    /// Calls `listener` after every update.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener();
        }
    }
}

impl<T: Clone> StateCell<T> {
    #[must_use]
    pub fn snapshot(&self) -> T {
        self.read(T::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn update_notifies_after_release() {
        let cell = StateCell::new(1u32);
        let calls = Arc::new(AtomicUsize::new(0));

        let observer = cell.clone();
        let counter = calls.clone();
        cell.subscribe(move || {
            // Reading inside the listener must not deadlock.
            assert_eq!(observer.snapshot() % 2, 0);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        cell.update(|v| *v += 1);
        cell.update(|v| *v *= 2);
        assert_eq!(cell.snapshot(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clones_share_state() {
        let cell: StateCell<Vec<&str>> = StateCell::default();
        let other = cell.clone();
        other.update(|v| v.push("a"));
        assert_eq!(cell.read(Vec::len), 1);
    }
}
