//! Error types for the workflow crate.
//!
//! - `GraphError`: a node or edge referenced by id is absent from the editor
//! - `WorkflowError`: editor-level failures, including document import

use flowforge_core::{EdgeId, NodeId};

/// Errors from graph operations on editor state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Node with the given ID was not found in the graph.
    #[error("node not found: {node_id}")]
    NodeNotFound { node_id: NodeId },
    /// Edge with the given ID was not found in the graph.
    #[error("edge not found: {edge_id}")]
    EdgeNotFound { edge_id: EdgeId },
}

/// High-level workflow editing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// A graph mutation referenced something that does not exist.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// An exported workflow document could not be read back.
    #[error("invalid workflow document: {reason}")]
    Import { reason: String },
    /// A node payload on the wire did not match its declared type.
    #[error("invalid configuration for {node_type} node: {reason}")]
    InvalidConfig { node_type: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_display() {
        let err = GraphError::NodeNotFound {
            node_id: NodeId::from("echo-1"),
        };
        assert_eq!(err.to_string(), "node not found: echo-1");
    }

    #[test]
    fn workflow_error_wraps_graph_error() {
        let err: WorkflowError = GraphError::EdgeNotFound {
            edge_id: EdgeId::from("e1"),
        }
        .into();
        assert_eq!(err.to_string(), "edge not found: e1");
    }

    #[test]
    fn import_error_display() {
        let err = WorkflowError::Import {
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.to_string().starts_with("invalid workflow document"));
    }
}
