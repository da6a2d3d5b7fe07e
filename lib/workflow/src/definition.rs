//! Workflow definition types.
//!
//! A workflow as the backend stores it: metadata plus a flat list of nodes
//! and edges. [`WorkflowDraft`] and [`WorkflowUpdate`] are the request
//! bodies for creating and updating one.

use crate::edge::WorkflowEdge;
use crate::node::WorkflowNode;
use chrono::{DateTime, Utc};
use flowforge_core::WorkflowId;
use serde::{Deserialize, Serialize};

fn default_version() -> u32 {
    1
}

/// A stored workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkflowDefinition {
    /// Returns the graph portion of the definition.
    #[must_use]
    pub fn graph(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}

/// Nodes and edges in wire form, as produced by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

/// Body of a create-workflow request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

/// Body of an update-workflow request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<WorkflowNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<WorkflowEdge>>,
}

impl From<WorkflowDraft> for WorkflowUpdate {
    fn from(draft: WorkflowDraft) -> Self {
        Self {
            name: Some(draft.name),
            description: draft.description,
            nodes: Some(draft.nodes),
            edges: Some(draft.edges),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definition_from_server_payload() {
        let def: WorkflowDefinition = serde_json::from_value(json!({
            "id": "wf-1",
            "name": "Order Processing",
            "nodes": [
                { "id": "start-1", "type": "start", "name": "Start", "config": {}, "position": { "x": 100, "y": 200 } }
            ],
            "edges": [],
            "createdAt": "2024-01-15T10:30:00Z",
            "updatedAt": "2024-01-15T10:30:00Z"
        }))
        .expect("deserialize");

        assert_eq!(def.id.as_str(), "wf-1");
        assert_eq!(def.version, 1);
        assert_eq!(def.description, None);
        assert_eq!(def.graph().nodes.len(), 1);
        assert!(def.created_at.is_some());
    }

    #[test]
    fn update_omits_absent_fields() {
        let update = WorkflowUpdate {
            name: Some("Renamed".to_string()),
            ..WorkflowUpdate::default()
        };
        let json = serde_json::to_value(&update).expect("serialize");
        assert_eq!(json, json!({ "name": "Renamed" }));
    }

    #[test]
    fn draft_converts_to_full_update() {
        let draft = WorkflowDraft {
            name: "Flow".to_string(),
            description: Some("desc".to_string()),
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        let update = WorkflowUpdate::from(draft);
        assert_eq!(update.name.as_deref(), Some("Flow"));
        assert_eq!(update.nodes, Some(Vec::new()));
    }
}
