//! Core types shared by every FlowForge dashboard crate.
//!
//! This crate provides the identifier newtypes used on the wire and in the
//! editor, plus the error foundation the other crates build on.

pub mod error;
pub mod id;

pub use error::{ParseIdError, Result};
pub use id::{EdgeId, NodeId, RunId, TaskId, UserId, WorkflowId};
