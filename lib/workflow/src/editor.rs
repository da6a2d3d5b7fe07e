//! In-memory editing model behind the workflow builder.
//!
//! The editor owns an ordered list of nodes and edges plus the current
//! selection. Mutations are permissive: connecting nodes does
//! not check that either endpoint exists, nor does it reject duplicates or
//! cycles. The one structural guarantee is that deleting a node also deletes
//! every edge touching it.

use crate::definition::{GraphSnapshot, WorkflowDefinition, WorkflowDraft, WorkflowUpdate};
use crate::edge::WorkflowEdge;
use crate::error::{GraphError, WorkflowError};
use crate::node::{NodeConfig, NodeType, Position, WorkflowNode};
use crate::template::WorkflowTemplate;
use chrono::Utc;
use flowforge_core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use ulid::Ulid;

/// Side length of the square in which new nodes are dropped.
pub const CANVAS_SPAWN_SIZE: u32 = 400;

/// Editing state for one workflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphEditor {
    pub name: String,
    pub description: String,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    selected: Option<NodeId>,
    saving: bool,
}

impl GraphEditor {
    /// Creates an empty editor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor state for a brand-new workflow: a single HTTP node.
    #[must_use]
    pub fn starter() -> Self {
        let mut editor = Self::new();
        let mut node = WorkflowNode::with_defaults(
            NodeId::from("1"),
            NodeType::Http,
            Position::new(250.0, 25.0),
        );
        if let NodeConfig::Http(config) = &mut node.config {
            config.url = "https://api.example.com/data".to_string();
        }
        editor.nodes.push(node);
        editor
    }

    /// Editor state for an existing workflow.
    #[must_use]
    pub fn from_definition(definition: &WorkflowDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            description: definition.description.clone().unwrap_or_default(),
            nodes: definition.nodes.clone(),
            edges: definition.edges.clone(),
            selected: None,
            saving: false,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| &n.id == node_id)
    }

    fn node_mut(&mut self, node_id: &NodeId) -> Result<&mut WorkflowNode, GraphError> {
        self.nodes
            .iter_mut()
            .find(|n| &n.id == node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })
    }

    /// Adds a node of `node_type` at a pseudo-random canvas position.
    pub fn add_node(&mut self, node_type: NodeType) -> NodeId {
        let bits = Ulid::from_datetime(SystemTime::from(Utc::now())).random();
        let span = u128::from(CANVAS_SPAWN_SIZE);
        let position = Position::new((bits % span) as f64, ((bits >> 64) % span) as f64);
        self.add_node_at(node_type, position)
    }

    /// Adds a node of `node_type` at `position`.
    pub fn add_node_at(&mut self, node_type: NodeType, position: Position) -> NodeId {
        let id = NodeId::generate();
        self.nodes
            .push(WorkflowNode::with_defaults(id.clone(), node_type, position));
        tracing::debug!(node_id = %id, %node_type, "added node");
        id
    }

    /// Appends an edge from `source` to `target`.
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> EdgeId {
        let edge = WorkflowEdge::connect(source, target);
        let id = edge.id.clone();
        self.edges.push(edge);
        id
    }

    /// Replaces a node's configuration wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if no node has `node_id`.
    pub fn update_node_config(
        &mut self,
        node_id: &NodeId,
        config: NodeConfig,
    ) -> Result<(), WorkflowError> {
        self.node_mut(node_id)?.config = config;
        Ok(())
    }

    /// Renames a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if no node has `node_id`.
    pub fn rename_node(
        &mut self,
        node_id: &NodeId,
        name: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        self.node_mut(node_id)?.name = name.into();
        Ok(())
    }

    /// Moves a node on the canvas.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if no node has `node_id`.
    pub fn move_node(&mut self, node_id: &NodeId, position: Position) -> Result<(), WorkflowError> {
        self.node_mut(node_id)?.position = position;
        Ok(())
    }

    /// Removes a node and every edge touching it.
    ///
    /// Edges referencing `node_id` are removed even when the node itself is
    /// already gone.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Option<WorkflowNode> {
        let removed = self
            .nodes
            .iter()
            .position(|n| &n.id == node_id)
            .map(|index| self.nodes.remove(index));
        self.edges.retain(|e| !e.touches(node_id));
        if self.selected.as_ref() == Some(node_id) {
            self.selected = None;
        }
        removed
    }

    /// Removes a single edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if no edge has `edge_id`.
    pub fn remove_edge(&mut self, edge_id: &EdgeId) -> Result<WorkflowEdge, WorkflowError> {
        let index = self
            .edges
            .iter()
            .position(|e| &e.id == edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound {
                edge_id: edge_id.clone(),
            })?;
        Ok(self.edges.remove(index))
    }

    /// Sets or clears the selected node.
    pub fn select(&mut self, node_id: Option<NodeId>) {
        self.selected = node_id;
    }

    #[must_use]
    pub fn selected(&self) -> Option<&WorkflowNode> {
        self.selected.as_ref().and_then(|id| self.node(id))
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    /// Current nodes and edges in wire form.
    #[must_use]
    pub fn serialize(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    fn description_opt(&self) -> Option<String> {
        let trimmed = self.description.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Body of the create-workflow call.
    #[must_use]
    pub fn draft(&self) -> WorkflowDraft {
        WorkflowDraft {
            name: self.name.trim().to_string(),
            description: self.description_opt(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Body of the update-workflow call.
    #[must_use]
    pub fn update(&self) -> WorkflowUpdate {
        WorkflowUpdate::from(self.draft())
    }

    /// True when the name is non-blank.
    #[must_use]
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Replaces the graph with a copy of `template`'s nodes and edges.
    ///
    /// Unsaved edits are discarded.
    pub fn load_template(&mut self, template: &WorkflowTemplate) {
        self.nodes = template.nodes.clone();
        self.edges = template.edges.clone();
        self.selected = None;
        tracing::debug!(template = %template.id, "loaded template");
    }

    /// Snapshot suitable for downloading.
    #[must_use]
    pub fn export(&self) -> ExportedWorkflow {
        ExportedWorkflow {
            name: self.name.clone(),
            description: self.description.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Replaces the editor contents with a previously exported document.
    ///
    /// On error the editor is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Import`] if `json` is not an exported
    /// workflow.
    pub fn import(&mut self, json: &str) -> Result<(), WorkflowError> {
        let doc: ExportedWorkflow =
            serde_json::from_str(json).map_err(|e| WorkflowError::Import {
                reason: e.to_string(),
            })?;
        self.name = doc.name;
        self.description = doc.description;
        self.nodes = doc.nodes;
        self.edges = doc.edges;
        self.selected = None;
        Ok(())
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Marks a save as in flight. Returns false if one already is.
    pub fn begin_save(&mut self) -> bool {
        if self.saving {
            return false;
        }
        self.saving = true;
        true
    }

    /// Clears the in-flight flag, whatever the outcome of the save.
    pub fn finish_save(&mut self) {
        self.saving = false;
    }
}

/// Downloadable workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedWorkflow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl ExportedWorkflow {
    /// File name: the workflow name with whitespace runs replaced by `_`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let mut stem = String::with_capacity(self.name.len());
        let mut in_space = false;
        for c in self.name.chars() {
            if c.is_whitespace() {
                if !in_space {
                    stem.push('_');
                }
                in_space = true;
            } else {
                stem.push(c);
                in_space = false;
            }
        }
        if stem.is_empty() {
            stem.push_str("workflow");
        }
        format!("{stem}.json")
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration holds a value JSON cannot encode.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
