//! Response envelope and pagination.
//!
//! Every endpoint answers `{ success, data?, error?, message? }`. List
//! endpoints put a collection under a resource-specific key next to a
//! `pagination` object; [`Page::from_payload`] normalizes those into
//! `{ data, pagination }`.

use crate::error::ClientError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The standard response wrapper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Returns the payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingData`] when `data` is absent.
    pub fn into_data(self) -> Result<T, ClientError> {
        self.data.ok_or(ClientError::MissingData)
    }
}

/// Extracts the error text from a failed response body, if it has one.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let envelope: ApiResponse<JsonValue> = serde_json::from_str(body).ok()?;
    envelope.error.or(envelope.message)
}

/// Unwraps `data` when `value` is an envelope, otherwise returns it as-is.
#[must_use]
pub fn unwrap_lenient(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(JsonValue::Null)
        }
        other => other,
    }
}

/// Pagination metadata of a list response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default, alias = "totalPages")]
    pub pages: u32,
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination::default(),
        }
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Normalizes a list payload whose items live under `collection`.
    ///
    /// Also accepts an already-normalized `{ data, pagination }` object and a
    /// bare array. Item order is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if the items or pagination do not
    /// deserialize.
    pub fn from_payload(payload: JsonValue, collection: &str) -> Result<Self, ClientError> {
        let (items, pagination) = match payload {
            JsonValue::Object(mut map) => {
                let items = map
                    .remove(collection)
                    .or_else(|| map.remove("data"))
                    .unwrap_or_else(|| JsonValue::Array(Vec::new()));
                (items, map.remove("pagination"))
            }
            JsonValue::Array(items) => (JsonValue::Array(items), None),
            JsonValue::Null => (JsonValue::Array(Vec::new()), None),
            other => {
                return Err(ClientError::Decode(format!(
                    "expected a list payload, got {other}"
                )));
            }
        };

        let data = serde_json::from_value(items).map_err(ClientError::decode)?;
        let pagination = pagination
            .filter(|p| !p.is_null())
            .map(serde_json::from_value)
            .transpose()
            .map_err(ClientError::decode)?
            .unwrap_or_default();
        Ok(Self { data, pagination })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Item {
        id: String,
    }

    #[test]
    fn normalizes_resource_key() {
        let page: Page<Item> = Page::from_payload(
            json!({
                "workflows": [{ "id": "b" }, { "id": "a" }, { "id": "c" }],
                "pagination": { "page": 2, "limit": 3, "total": 9, "pages": 3 }
            }),
            "workflows",
        )
        .expect("page");

        let ids: Vec<_> = page.data.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(
            page.pagination,
            Pagination {
                page: 2,
                limit: 3,
                total: 9,
                pages: 3
            }
        );
    }

    #[test]
    fn accepts_normalized_shape_and_total_pages_alias() {
        let page: Page<Item> = Page::from_payload(
            json!({ "data": [{ "id": "x" }], "pagination": { "page": 1, "totalPages": 4 } }),
            "runs",
        )
        .expect("page");
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.pagination.pages, 4);
    }

    #[test]
    fn missing_pieces_default_to_empty() {
        let page: Page<Item> = Page::from_payload(json!({}), "runs").expect("page");
        assert!(page.data.is_empty());
        assert_eq!(page.pagination, Pagination::default());
    }

    #[test]
    fn rejects_scalars() {
        let result: Result<Page<Item>, _> = Page::from_payload(json!(42), "runs");
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[test]
    fn error_message_from_body() {
        assert_eq!(
            error_message(r#"{"success":false,"error":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            error_message(r#"{"success":false,"message":"Bad input"}"#).as_deref(),
            Some("Bad input")
        );
        assert_eq!(error_message("<html>oops</html>"), None);
    }

    #[test]
    fn lenient_unwrap() {
        assert_eq!(unwrap_lenient(json!({ "success": true, "data": { "a": 1 } })), json!({ "a": 1 }));
        assert_eq!(unwrap_lenient(json!({ "processedTasks": 2 })), json!({ "processedTasks": 2 }));
    }

    #[test]
    fn missing_data_is_reported() {
        let envelope: ApiResponse<Item> = serde_json::from_str(r#"{"success":true}"#).expect("json");
        assert!(matches!(envelope.into_data(), Err(ClientError::MissingData)));
    }
}
