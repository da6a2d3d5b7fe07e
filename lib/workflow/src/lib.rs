//! Workflow model for the FlowForge dashboard.
//!
//! This crate holds everything the dashboard knows about workflows without
//! talking to the network:
//!
//! - **Graph Model**: typed nodes, edges and stored definitions
//! - **Editor**: the mutable builder state and its export/import format
//! - **Templates**: the built-in starter workflows
//! - **Inspection**: advisory structural checks using petgraph
//! - **Execution**: runs, tasks and the views derived from them
//! - **Dead Letters**: failed-task classification and filtering

pub mod dead_letter;
pub mod definition;
pub mod edge;
pub mod editor;
pub mod error;
pub mod execution;
pub mod graph;
pub mod node;
pub mod template;

pub use dead_letter::{DeadLetterFilter, DeadLetterSummary, DeadLetterTask, ErrorKind};
pub use definition::{GraphSnapshot, WorkflowDefinition, WorkflowDraft, WorkflowUpdate};
pub use edge::WorkflowEdge;
pub use editor::{ExportedWorkflow, GraphEditor};
pub use error::{GraphError, WorkflowError};
pub use execution::{
    POLL_INTERVAL, Run, RunFilter, RunMetrics, RunStatus, SystemStats, Task, TaskGraphNode,
};
pub use graph::GraphInspection;
pub use node::{
    CustomConfig, EchoConfig, HttpConfig, HttpMethod, LogLevel, NodeConfig, NodeType, Position,
    WorkflowNode,
};
pub use template::{Difficulty, TemplateCategory, TemplateFilter, WorkflowTemplate};
