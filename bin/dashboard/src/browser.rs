//! Browser-backed implementations of the client's storage and navigation
//! seams, plus the file download used by workflow export.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flowforge_client::{ClientError, Navigator, SessionStorage};
use wasm_bindgen::JsCast;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// `window.localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl SessionStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let storage = local_storage()
            .ok_or_else(|| ClientError::Storage("localStorage is unavailable".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| ClientError::Storage(format!("{e:?}")))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = local_storage() {
            if let Err(e) = storage.remove_item(key) {
                tracing::warn!(key, error = ?e, "failed to remove localStorage key");
            }
        }
    }
}

/// Navigation through `window.location`. Redirects are full page loads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_default()
    }

    fn redirect(&self, path: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(e) = window.location().set_href(path) {
            tracing::error!(path, error = ?e, "redirect failed");
        }
    }
}

/// `data:` URI carrying `contents` as base64 JSON.
#[must_use]
pub fn json_data_uri(contents: &str) -> String {
    format!("data:application/json;base64,{}", STANDARD.encode(contents))
}

/// Saves `contents` as a file called `file_name`.
pub fn download_json(file_name: &str, contents: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(body) = document.body() else {
        return;
    };
    let link = match document.create_element("a") {
        Ok(link) => link,
        Err(e) => {
            tracing::error!(error = ?e, "could not create download link");
            return;
        }
    };
    let result = link
        .set_attribute("href", &json_data_uri(contents))
        .and_then(|()| link.set_attribute("download", file_name))
        .and_then(|()| body.append_child(&link).map(|_| ()));
    if let Err(e) = result {
        tracing::error!(error = ?e, "could not prepare download");
        return;
    }
    if let Ok(element) = link.clone().dyn_into::<web_sys::HtmlElement>() {
        element.click();
    }
    link.remove();
    tracing::info!(file_name, bytes = contents.len(), "workflow exported");
}

/// Shows a blocking confirmation dialog. Defaults to `false` if it cannot.
#[must_use]
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_is_base64_json() {
        assert_eq!(
            json_data_uri("{}"),
            "data:application/json;base64,e30="
        );
    }
}
