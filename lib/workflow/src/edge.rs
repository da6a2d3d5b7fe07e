//! Edge types for workflow graphs.
//!
//! An edge is a directed link from one node id to another. Edges are not
//! validated: they may reference missing nodes, repeat, or loop back to
//! their own source.

use flowforge_core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};

/// A directed edge in a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// Optional rendering hint.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

impl WorkflowEdge {
    /// Creates an edge with an explicit id.
    #[must_use]
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: None,
        }
    }

    /// Creates an edge with a freshly generated id.
    #[must_use]
    pub fn connect(source: NodeId, target: NodeId) -> Self {
        Self::new(EdgeId::generate(), source, target)
    }

    /// Sets the rendering hint.
    #[must_use]
    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    /// True if either endpoint is `node_id`.
    #[must_use]
    pub fn touches(&self, node_id: &NodeId) -> bool {
        &self.source == node_id || &self.target == node_id
    }
}
