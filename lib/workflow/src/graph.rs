//! Structural inspection of workflow graphs using petgraph.
//!
//! The builder never blocks a save on graph shape; the backend owns
//! validation. This module only reports what it sees so the UI can surface
//! hints such as edges pointing at deleted nodes or accidental loops.

use crate::edge::WorkflowEdge;
use crate::editor::GraphEditor;
use crate::node::WorkflowNode;
use flowforge_core::{EdgeId, NodeId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// What inspection found in a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphInspection {
    /// Edges whose source or target is not a node of the graph.
    pub dangling_edges: Vec<EdgeId>,
    /// Edges whose source equals their target.
    pub self_loops: Vec<EdgeId>,
    /// Edges repeating an earlier source/target pair.
    pub duplicate_edges: Vec<EdgeId>,
    /// Nodes with no incoming edge.
    pub entry_nodes: Vec<NodeId>,
    /// Nodes with no outgoing edge.
    pub terminal_nodes: Vec<NodeId>,
    /// Whether following edges can return to a node.
    pub has_cycle: bool,
}

impl GraphInspection {
    /// Inspects a node/edge list.
    #[must_use]
    pub fn inspect(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Self {
        let mut graph: DiGraph<&NodeId, &EdgeId> = DiGraph::new();
        let mut index: HashMap<&NodeId, NodeIndex> = HashMap::new();
        for node in nodes {
            index.entry(&node.id).or_insert_with(|| graph.add_node(&node.id));
        }

        let mut report = Self::default();
        let mut seen_pairs = HashSet::new();
        for edge in edges {
            if !seen_pairs.insert((&edge.source, &edge.target)) {
                report.duplicate_edges.push(edge.id.clone());
            }
            if edge.source == edge.target {
                report.self_loops.push(edge.id.clone());
            }
            match (index.get(&edge.source), index.get(&edge.target)) {
                (Some(&source), Some(&target)) => {
                    graph.add_edge(source, target, &edge.id);
                }
                _ => report.dangling_edges.push(edge.id.clone()),
            }
        }

        for idx in graph.node_indices() {
            let id = graph[idx];
            if graph.neighbors_directed(idx, Direction::Incoming).next().is_none() {
                report.entry_nodes.push(id.clone());
            }
            if graph.neighbors_directed(idx, Direction::Outgoing).next().is_none() {
                report.terminal_nodes.push(id.clone());
            }
        }

        report.has_cycle = petgraph::algo::is_cyclic_directed(&graph);
        report
    }

    /// True when nothing unusual was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling_edges.is_empty()
            && self.self_loops.is_empty()
            && self.duplicate_edges.is_empty()
            && !self.has_cycle
    }

    /// Human-readable hints, one per finding.
    #[must_use]
    pub fn notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if !self.dangling_edges.is_empty() {
            notes.push(format!(
                "{} connection(s) point at missing nodes",
                self.dangling_edges.len()
            ));
        }
        if !self.self_loops.is_empty() {
            notes.push(format!(
                "{} node(s) connect to themselves",
                self.self_loops.len()
            ));
        }
        if !self.duplicate_edges.is_empty() {
            notes.push(format!(
                "{} duplicate connection(s)",
                self.duplicate_edges.len()
            ));
        }
        if self.has_cycle {
            notes.push("the graph contains a cycle".to_string());
        }
        notes
    }
}

impl GraphEditor {
    /// Inspects the editor's current graph.
    #[must_use]
    pub fn inspect(&self) -> GraphInspection {
        GraphInspection::inspect(self.nodes(), self.edges())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeType, Position};
    use crate::template;

    #[test]
    fn templates_are_clean() {
        for t in template::all() {
            let report = GraphInspection::inspect(&t.nodes, &t.edges);
            assert!(report.is_clean(), "{}: {:?}", t.id, report.notes());
            assert_eq!(report.entry_nodes, vec![NodeId::from("start-1")]);
            assert_eq!(report.terminal_nodes, vec![NodeId::from("end-1")]);
        }
    }

    #[test]
    fn reports_dangling_and_self_loops() {
        let mut editor = GraphEditor::new();
        let a = editor.add_node_at(NodeType::Echo, Position::default());
        let loop_edge = editor.connect(a.clone(), a.clone());
        let dangling = editor.connect(a, NodeId::from("missing"));

        let report = editor.inspect();
        assert_eq!(report.self_loops, vec![loop_edge]);
        assert_eq!(report.dangling_edges, vec![dangling]);
        assert!(report.has_cycle);
        assert_eq!(report.notes().len(), 3);
    }

    #[test]
    fn reports_duplicates_and_cycles() {
        let mut editor = GraphEditor::new();
        let a = editor.add_node_at(NodeType::Http, Position::default());
        let b = editor.add_node_at(NodeType::Echo, Position::default());
        editor.connect(a.clone(), b.clone());
        let dup = editor.connect(a.clone(), b.clone());
        editor.connect(b, a);

        let report = editor.inspect();
        assert_eq!(report.duplicate_edges, vec![dup]);
        assert!(report.has_cycle);
        assert!(report.entry_nodes.is_empty());
    }

    #[test]
    fn isolated_node_is_entry_and_terminal() {
        let mut editor = GraphEditor::new();
        let a = editor.add_node_at(NodeType::Start, Position::default());
        let report = editor.inspect();
        assert!(report.is_clean());
        assert_eq!(report.entry_nodes, vec![a.clone()]);
        assert_eq!(report.terminal_nodes, vec![a]);
    }
}
