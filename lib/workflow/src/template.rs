//! Built-in workflow templates.
//!
//! The catalog is a fixed set of starter graphs. Loading a template into the
//! editor deep-copies its nodes and edges, so edits never leak back into
//! the catalog.

use crate::edge::WorkflowEdge;
use crate::node::{
    CustomConfig, EchoConfig, HttpConfig, LogLevel, NodeConfig, Position, WorkflowNode,
};
use flowforge_core::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::fmt;
use std::sync::LazyLock;

/// Broad grouping of templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Basic,
    Api,
    Automation,
    Monitoring,
}

impl TemplateCategory {
    pub const ALL: [Self; 4] = [Self::Basic, Self::Api, Self::Automation, Self::Monitoring];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Api => "api",
            Self::Automation => "automation",
            Self::Monitoring => "monitoring",
        }
    }

    /// Parses a filter value; `"all"` and unknown values mean no filter.
    #[must_use]
    pub fn from_filter(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much experience a template assumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parses a filter value; `"all"` and unknown values mean no filter.
    #[must_use]
    pub fn from_filter(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == value)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canned workflow the builder can start from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: TemplateCategory,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowTemplate {
    /// Case-insensitive match against name, description and tags.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// Combined picker filter. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFilter {
    pub query: String,
    pub category: Option<TemplateCategory>,
    pub difficulty: Option<Difficulty>,
}

impl TemplateFilter {
    /// Returns the catalog entries accepted by every active criterion.
    #[must_use]
    pub fn apply(&self) -> Vec<&'static WorkflowTemplate> {
        all()
            .iter()
            .filter(|t| self.query.is_empty() || t.matches(&self.query))
            .filter(|t| self.category.is_none_or(|c| t.category == c))
            .filter(|t| self.difficulty.is_none_or(|d| t.difficulty == d))
            .collect()
    }
}

static CATALOG: LazyLock<Vec<WorkflowTemplate>> = LazyLock::new(build_catalog);

/// Every built-in template, in display order.
#[must_use]
pub fn all() -> &'static [WorkflowTemplate] {
    &CATALOG
}

/// Looks a template up by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static WorkflowTemplate> {
    all().iter().find(|t| t.id == id)
}

#[must_use]
pub fn by_category(category: TemplateCategory) -> Vec<&'static WorkflowTemplate> {
    all().iter().filter(|t| t.category == category).collect()
}

#[must_use]
pub fn by_difficulty(difficulty: Difficulty) -> Vec<&'static WorkflowTemplate> {
    all().iter().filter(|t| t.difficulty == difficulty).collect()
}

/// Case-insensitive search over name, description and tags.
#[must_use]
pub fn search(query: &str) -> Vec<&'static WorkflowTemplate> {
    all().iter().filter(|t| t.matches(query)).collect()
}

fn node(id: &str, name: &str, config: NodeConfig, x: f64, y: f64) -> WorkflowNode {
    WorkflowNode::new(NodeId::from(id), name, config, Position::new(x, y))
}

fn start(x: f64) -> WorkflowNode {
    node("start-1", "Start", NodeConfig::Start(Map::new()), x, 200.0)
}

fn end(x: f64) -> WorkflowNode {
    node("end-1", "End", NodeConfig::End(Map::new()), x, 200.0)
}

fn get(url: &str, timeout: u64) -> NodeConfig {
    NodeConfig::Http(HttpConfig {
        url: url.to_string(),
        timeout,
        ..HttpConfig::default()
    })
}

fn echo(message: &str, level: LogLevel) -> NodeConfig {
    NodeConfig::Echo(EchoConfig {
        message: message.to_string(),
        level,
        ..EchoConfig::default()
    })
}

fn edge(id: &str, source: &str, target: &str) -> WorkflowEdge {
    WorkflowEdge::new(id, source, target)
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|t| (*t).to_string()).collect()
}

const PROCESS_POSTS_SCRIPT: &str = "// Process the fetched data\nconst posts = input.data;\nconst processedCount = posts.length;\noutput = { processedCount, message: `Processed ${processedCount} posts` };";

fn build_catalog() -> Vec<WorkflowTemplate> {
    vec![
        WorkflowTemplate {
            id: "simple-echo".to_string(),
            name: "Simple Echo Workflow".to_string(),
            description: "A basic workflow that logs a message to demonstrate the system"
                .to_string(),
            category: TemplateCategory::Basic,
            difficulty: Difficulty::Beginner,
            tags: tags(&["echo", "logging", "basic"]),
            nodes: vec![
                start(100.0),
                node(
                    "echo-1",
                    "Log Message",
                    echo("Hello from FlowForge!", LogLevel::Info),
                    300.0,
                    200.0,
                ),
                end(500.0),
            ],
            edges: vec![
                edge("edge-1", "start-1", "echo-1"),
                edge("edge-2", "echo-1", "end-1"),
            ],
        },
        WorkflowTemplate {
            id: "api-call".to_string(),
            name: "API Call Workflow".to_string(),
            description: "Make an HTTP request to an external API and log the response"
                .to_string(),
            category: TemplateCategory::Api,
            difficulty: Difficulty::Beginner,
            tags: tags(&["http", "api", "external"]),
            nodes: vec![
                start(100.0),
                node(
                    "http-1",
                    "Fetch Data",
                    get("https://jsonplaceholder.typicode.com/posts/1", 30_000),
                    300.0,
                    200.0,
                ),
                node(
                    "echo-1",
                    "Log Response",
                    echo("API call completed successfully", LogLevel::Info),
                    500.0,
                    200.0,
                ),
                end(700.0),
            ],
            edges: vec![
                edge("edge-1", "start-1", "http-1"),
                edge("edge-2", "http-1", "echo-1"),
                edge("edge-3", "echo-1", "end-1"),
            ],
        },
        WorkflowTemplate {
            id: "error-handling".to_string(),
            name: "Error Handling Workflow".to_string(),
            description: "Demonstrates how to handle errors in workflows with multiple paths"
                .to_string(),
            category: TemplateCategory::Automation,
            difficulty: Difficulty::Intermediate,
            tags: tags(&["error-handling", "conditional", "automation"]),
            nodes: vec![
                start(100.0),
                node(
                    "http-1",
                    "API Call",
                    get("https://httpstat.us/404", 30_000),
                    300.0,
                    200.0,
                ),
                node(
                    "echo-success",
                    "Success Log",
                    echo("API call succeeded", LogLevel::Info),
                    500.0,
                    100.0,
                ),
                node(
                    "echo-error",
                    "Error Log",
                    echo("API call failed, handling error", LogLevel::Error),
                    500.0,
                    300.0,
                ),
                end(700.0),
            ],
            edges: vec![
                edge("edge-1", "start-1", "http-1"),
                edge("edge-success", "http-1", "echo-success"),
                edge("edge-error", "http-1", "echo-error"),
                edge("edge-end-1", "echo-success", "end-1"),
                edge("edge-end-2", "echo-error", "end-1"),
            ],
        },
        WorkflowTemplate {
            id: "monitoring-workflow".to_string(),
            name: "Health Check Workflow".to_string(),
            description: "Monitor multiple services and report their status".to_string(),
            category: TemplateCategory::Monitoring,
            difficulty: Difficulty::Intermediate,
            tags: tags(&["monitoring", "health-check", "multiple-services"]),
            nodes: vec![
                start(100.0),
                node(
                    "http-1",
                    "Check Service 1",
                    get("https://httpstat.us/200", 10_000),
                    300.0,
                    100.0,
                ),
                node(
                    "http-2",
                    "Check Service 2",
                    get("https://httpstat.us/200", 10_000),
                    300.0,
                    300.0,
                ),
                node(
                    "echo-1",
                    "Report Status",
                    echo("Health check completed", LogLevel::Info),
                    500.0,
                    200.0,
                ),
                end(700.0),
            ],
            edges: vec![
                edge("edge-1", "start-1", "http-1"),
                edge("edge-2", "start-1", "http-2"),
                edge("edge-3", "http-1", "echo-1"),
                edge("edge-4", "http-2", "echo-1"),
                edge("edge-5", "echo-1", "end-1"),
            ],
        },
        WorkflowTemplate {
            id: "data-processing".to_string(),
            name: "Data Processing Workflow".to_string(),
            description: "Fetch data, process it, and store results".to_string(),
            category: TemplateCategory::Automation,
            difficulty: Difficulty::Advanced,
            tags: tags(&["data-processing", "automation", "complex"]),
            nodes: vec![
                start(100.0),
                node(
                    "http-1",
                    "Fetch Data",
                    get("https://jsonplaceholder.typicode.com/posts", 30_000),
                    300.0,
                    200.0,
                ),
                node(
                    "custom-1",
                    "Process Data",
                    NodeConfig::Custom(CustomConfig {
                        code: PROCESS_POSTS_SCRIPT.to_string(),
                        ..CustomConfig::default()
                    }),
                    500.0,
                    200.0,
                ),
                node(
                    "echo-1",
                    "Log Results",
                    echo("Data processing completed", LogLevel::Info),
                    700.0,
                    200.0,
                ),
                end(900.0),
            ],
            edges: vec![
                edge("edge-1", "start-1", "http-1"),
                edge("edge-2", "http-1", "custom-1"),
                edge("edge-3", "custom-1", "echo-1"),
                edge("edge-4", "echo-1", "end-1"),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    #[test]
    fn catalog_has_five_templates() {
        assert_eq!(all().len(), 5);
    }

    #[test]
    fn find_by_id() {
        let template = find("simple-echo").expect("template exists");
        assert_eq!(template.nodes.len(), 3);
        assert_eq!(template.nodes[1].name, "Log Message");
        assert_eq!(template.nodes[1].node_type(), NodeType::Echo);
        assert!(find("missing").is_none());
    }

    #[test]
    fn every_edge_references_existing_nodes() {
        for template in all() {
            for edge in &template.edges {
                assert!(template.nodes.iter().any(|n| n.id == edge.source), "{}", template.id);
                assert!(template.nodes.iter().any(|n| n.id == edge.target), "{}", template.id);
            }
        }
    }

    #[test]
    fn search_is_case_insensitive_over_tags() {
        let results = search("HEALTH-check");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "monitoring-workflow");
    }

    #[test]
    fn search_matches_description() {
        let ids: Vec<_> = search("multiple paths").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["error-handling"]);
    }

    #[test]
    fn category_and_difficulty_helpers() {
        assert_eq!(by_category(TemplateCategory::Automation).len(), 2);
        assert_eq!(by_difficulty(Difficulty::Beginner).len(), 2);
        assert_eq!(by_difficulty(Difficulty::Advanced)[0].id, "data-processing");
    }

    #[test]
    fn filter_combines_criteria() {
        let filter = TemplateFilter {
            query: "automation".to_string(),
            category: Some(TemplateCategory::Automation),
            difficulty: Some(Difficulty::Advanced),
        };
        let ids: Vec<_> = filter.apply().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["data-processing"]);
    }

    #[test]
    fn empty_filter_returns_everything() {
        assert_eq!(TemplateFilter::default().apply().len(), all().len());
    }

    #[test]
    fn all_filter_value_means_unfiltered() {
        assert_eq!(TemplateCategory::from_filter("all"), None);
        assert_eq!(Difficulty::from_filter("advanced"), Some(Difficulty::Advanced));
    }
}
