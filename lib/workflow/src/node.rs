//! Workflow node types and configurations.
//!
//! Nodes are the building blocks of workflows. Each node has:
//! - A unique ID within the workflow
//! - A display name
//! - A typed configuration whose variant determines the node type
//! - A canvas position
//!
//! On the wire a node is `{ id, type, name, config, position }` with `config`
//! being a free-form object. [`NodeConfig`] gives every known node type a
//! typed shape while keeping unrecognized keys in an `extra` map, so a node
//! fetched from the server survives a load/save cycle unchanged.

use crate::error::WorkflowError;
use flowforge_core::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default timeout applied to new HTTP nodes, in milliseconds.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// The kind of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Entry marker of a workflow.
    Start,
    /// Terminal marker of a workflow.
    End,
    /// Outbound HTTP request.
    Http,
    /// Log a message.
    Echo,
    /// User-supplied script.
    Custom,
}

impl NodeType {
    /// Every node type, in palette order.
    pub const ALL: [Self; 5] = [Self::Start, Self::End, Self::Http, Self::Echo, Self::Custom];

    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Http => "http",
            Self::Echo => "echo",
            Self::Custom => "custom",
        }
    }

    /// Display name given to freshly added nodes of this type.
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::End => "End",
            Self::Http => "HTTP Request",
            Self::Echo => "Echo",
            Self::Custom => "Custom Task",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WorkflowError::InvalidConfig {
                node_type: s.to_string(),
                reason: "unknown node type".to_string(),
            })
    }
}

/// HTTP method of an HTTP node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Methods offered by the configuration panel.
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Delete, Self::Patch];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| WorkflowError::InvalidConfig {
                node_type: NodeType::Http.to_string(),
                reason: format!("unsupported method '{s}'"),
            })
    }
}

/// Severity of an echo node's message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    /// Levels offered by the configuration panel.
    pub const ALL: [Self; 4] = [Self::Info, Self::Warn, Self::Error, Self::Debug];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| WorkflowError::InvalidConfig {
                node_type: NodeType::Echo.to_string(),
                reason: format!("unsupported level '{s}'"),
            })
    }
}

fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

/// Configuration of an HTTP request node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request body; `null` when the request has none.
    #[serde(default)]
    pub body: Option<JsonValue>,
    /// Timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Keys this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            url: String::new(),
            headers: BTreeMap::new(),
            body: None,
            timeout: DEFAULT_HTTP_TIMEOUT_MS,
            extra: Map::new(),
        }
    }
}

fn default_echo_message() -> String {
    "Hello World".to_string()
}

/// Configuration of an echo node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoConfig {
    #[serde(default = "default_echo_message")]
    pub message: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            message: default_echo_message(),
            level: LogLevel::Info,
            extra: Map::new(),
        }
    }
}

fn default_custom_code() -> String {
    r#"console.log("Custom task");"#.to_string()
}

/// Configuration of a custom script node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomConfig {
    #[serde(default = "default_custom_code")]
    pub code: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Default for CustomConfig {
    fn default() -> Self {
        Self {
            code: default_custom_code(),
            extra: Map::new(),
        }
    }
}

/// Typed node configuration. The variant is the node's type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    /// Start marker; its payload is kept as-is.
    Start(Map<String, JsonValue>),
    /// End marker; its payload is kept as-is.
    End(Map<String, JsonValue>),
    Http(HttpConfig),
    Echo(EchoConfig),
    Custom(CustomConfig),
}

impl NodeConfig {
    /// The default configuration for a freshly added node of `node_type`.
    #[must_use]
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Start => Self::Start(Map::new()),
            NodeType::End => Self::End(Map::new()),
            NodeType::Http => Self::Http(HttpConfig::default()),
            NodeType::Echo => Self::Echo(EchoConfig::default()),
            NodeType::Custom => Self::Custom(CustomConfig::default()),
        }
    }

    /// Returns the node type implied by this configuration.
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        match self {
            Self::Start(_) => NodeType::Start,
            Self::End(_) => NodeType::End,
            Self::Http(_) => NodeType::Http,
            Self::Echo(_) => NodeType::Echo,
            Self::Custom(_) => NodeType::Custom,
        }
    }

    /// Builds a typed configuration from a wire `type` tag and `config` object.
    ///
    /// A missing (`null`) config is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidConfig`] when the payload is not an
    /// object or a typed field has the wrong shape.
    pub fn from_wire(node_type: NodeType, config: JsonValue) -> Result<Self, WorkflowError> {
        let object = match config {
            JsonValue::Null => Map::new(),
            JsonValue::Object(map) => map,
            other => {
                return Err(WorkflowError::InvalidConfig {
                    node_type: node_type.to_string(),
                    reason: format!("expected an object, got {other}"),
                });
            }
        };

        let invalid = |e: serde_json::Error| WorkflowError::InvalidConfig {
            node_type: node_type.to_string(),
            reason: e.to_string(),
        };

        Ok(match node_type {
            NodeType::Start => Self::Start(object),
            NodeType::End => Self::End(object),
            NodeType::Http => {
                Self::Http(serde_json::from_value(JsonValue::Object(object)).map_err(invalid)?)
            }
            NodeType::Echo => {
                Self::Echo(serde_json::from_value(JsonValue::Object(object)).map_err(invalid)?)
            }
            NodeType::Custom => {
                Self::Custom(serde_json::from_value(JsonValue::Object(object)).map_err(invalid)?)
            }
        })
    }

    /// Renders the configuration as the free-form wire object.
    #[must_use]
    pub fn to_wire(&self) -> JsonValue {
        let rendered = match self {
            Self::Start(map) | Self::End(map) => Ok(JsonValue::Object(map.clone())),
            Self::Http(config) => serde_json::to_value(config),
            Self::Echo(config) => serde_json::to_value(config),
            Self::Custom(config) => serde_json::to_value(config),
        };
        // The typed configs only hold strings, numbers, maps and JSON values.
        rendered.unwrap_or_else(|_| JsonValue::Object(Map::new()))
    }
}

/// A point on the builder canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node in a workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeWire", into = "NodeWire")]
pub struct WorkflowNode {
    pub id: NodeId,
    pub name: String,
    pub config: NodeConfig,
    pub position: Position,
}

impl WorkflowNode {
    /// Creates a new node.
    #[must_use]
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        config: NodeConfig,
        position: Position,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            config,
            position,
        }
    }

    /// Creates a node of `node_type` with its default name and configuration.
    #[must_use]
    pub fn with_defaults(id: NodeId, node_type: NodeType, position: Position) -> Self {
        Self::new(
            id,
            node_type.default_name(),
            NodeConfig::default_for(node_type),
            position,
        )
    }

    /// Returns the type of this node.
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        self.config.node_type()
    }
}

/// Wire shape of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeWire {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    name: String,
    #[serde(default)]
    config: JsonValue,
    #[serde(default)]
    position: Position,
}

impl TryFrom<NodeWire> for WorkflowNode {
    type Error = WorkflowError;

    fn try_from(wire: NodeWire) -> Result<Self, Self::Error> {
        Ok(Self {
            config: NodeConfig::from_wire(wire.node_type, wire.config)?,
            id: wire.id,
            name: wire.name,
            position: wire.position,
        })
    }
}

impl From<WorkflowNode> for NodeWire {
    fn from(node: WorkflowNode) -> Self {
        Self {
            node_type: node.node_type(),
            config: node.config.to_wire(),
            id: node.id,
            name: node.name,
            position: node.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_names_per_type() {
        assert_eq!(NodeType::Http.default_name(), "HTTP Request");
        assert_eq!(NodeType::Echo.default_name(), "Echo");
        assert_eq!(NodeType::Custom.default_name(), "Custom Task");
    }

    #[test]
    fn default_http_config_shape() {
        let config = NodeConfig::default_for(NodeType::Http).to_wire();
        assert_eq!(
            config,
            json!({
                "method": "GET",
                "url": "",
                "headers": {},
                "body": null,
                "timeout": 30000
            })
        );
    }

    #[test]
    fn default_echo_and_custom_configs() {
        assert_eq!(
            NodeConfig::default_for(NodeType::Echo).to_wire(),
            json!({ "message": "Hello World", "level": "info" })
        );
        assert_eq!(
            NodeConfig::default_for(NodeType::Custom).to_wire(),
            json!({ "code": "console.log(\"Custom task\");" })
        );
        assert_eq!(NodeConfig::default_for(NodeType::Start).to_wire(), json!({}));
    }

    #[test]
    fn node_deserializes_from_wire() {
        let node: WorkflowNode = serde_json::from_value(json!({
            "id": "http-1",
            "type": "http",
            "name": "Fetch Data",
            "config": { "method": "POST", "url": "https://example.com", "headers": {}, "timeout": 10000 },
            "position": { "x": 300, "y": 200 }
        }))
        .expect("deserialize");

        assert_eq!(node.node_type(), NodeType::Http);
        let NodeConfig::Http(config) = &node.config else {
            panic!("expected http config");
        };
        assert_eq!(config.method, HttpMethod::Post);
        assert_eq!(config.timeout, 10_000);
        assert_eq!(config.body, None);
        assert_eq!(node.position, Position::new(300.0, 200.0));
    }

    #[test]
    fn unknown_config_keys_survive() {
        let wire = json!({
            "id": "echo-1",
            "type": "echo",
            "name": "Log",
            "config": { "message": "hi", "level": "warn", "channel": "ops" },
            "position": { "x": 0.0, "y": 0.0 }
        });
        let node: WorkflowNode = serde_json::from_value(wire.clone()).expect("deserialize");
        let back = serde_json::to_value(&node).expect("serialize");
        assert_eq!(back, wire);
    }

    #[test]
    fn mismatched_config_is_rejected() {
        let result: Result<WorkflowNode, _> = serde_json::from_value(json!({
            "id": "echo-1",
            "type": "echo",
            "name": "Log",
            "config": { "level": "shout" },
            "position": { "x": 0, "y": 0 }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_config_uses_defaults() {
        let node: WorkflowNode = serde_json::from_value(json!({
            "id": "c1",
            "type": "custom",
            "name": "Script"
        }))
        .expect("deserialize");
        assert_eq!(node.config, NodeConfig::default_for(NodeType::Custom));
    }

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("patch".parse::<HttpMethod>().ok(), Some(HttpMethod::Patch));
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }
}
