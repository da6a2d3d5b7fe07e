//! Strongly-typed ID types for domain entities.
//!
//! Workflow, run, task and user ids are assigned by the backend and treated
//! as opaque strings. Node and edge ids are minted by the editor; template
//! graphs ship hand-written ids such as `start-1`, so those are strings too.
//! Freshly generated node and edge ids are prefixed ULIDs taken from a
//! process-wide monotonic generator, which keeps them unique and time-ordered
//! even when several are created within the same millisecond.

use crate::error::ParseIdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;
use ulid::{Generator, Ulid};

static GENERATOR: Mutex<Generator> = Mutex::new(Generator::new());

// `SystemTime::now` is unavailable in the browser; chrono reads the JS clock there.
fn next_ulid() -> Ulid {
    let now = SystemTime::from(chrono::Utc::now());
    let mut generator = GENERATOR.lock().unwrap_or_else(PoisonError::into_inner);
    generator
        .generate_from_datetime(now)
        .unwrap_or_else(|_| Ulid::from_datetime(now))
}

/// Macro to generate a strongly-typed string-backed ID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the id, returning the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        reason: "identifier is empty".to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// Adds a `generate` constructor producing `<prefix>_<ulid>`.
macro_rules! generated_id {
    ($name:ident, $prefix:expr) => {
        impl $name {
            /// Generates a fresh, time-ordered id.
            #[must_use]
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, next_ulid()))
            }

            /// Returns the prefix used by generated ids.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user.
    UserId
);

define_id!(
    /// Unique identifier for a workflow definition.
    WorkflowId
);

define_id!(
    /// Unique identifier for a single execution (run) of a workflow.
    RunId
);

define_id!(
    /// Unique identifier for a task within a run.
    TaskId
);

define_id!(
    /// Identifier of a node within one workflow graph.
    NodeId
);

define_id!(
    /// Identifier of an edge within one workflow graph.
    EdgeId
);

generated_id!(NodeId, "node");
generated_id!(EdgeId, "edge");

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_node_id_has_prefix() {
        let id = NodeId::generate();
        assert!(id.as_str().starts_with("node_"));
    }

    #[test]
    fn generated_ids_are_unique_and_ordered() {
        let ids: Vec<NodeId> = (0..500).map(|_| NodeId::generate()).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(sorted, ids);
    }

    #[test]
    fn template_ids_are_preserved() {
        let id = NodeId::from("start-1");
        assert_eq!(id.to_string(), "start-1");
    }

    #[test]
    fn parse_rejects_blank() {
        let result: Result<WorkflowId, _> = "   ".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "WorkflowId");
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: RunId = " run-42 ".parse().expect("should parse");
        assert_eq!(id.as_str(), "run-42");
    }

    #[test]
    fn id_serde_is_transparent() {
        let id = EdgeId::new("e1-2");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"e1-2\"");
        let parsed: EdgeId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }
}
