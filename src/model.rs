use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Id prefix the analysis pass gives to functions outside the analyzed codebase.
pub const EXTERNAL_PREFIX: &str = "ext::";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Function,
    Other(String),
}

impl NodeKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "function" => NodeKind::Function,
            other => NodeKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Function => "function",
            NodeKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Call,
    Other(String),
}

impl EdgeKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "call" => EdgeKind::Call,
            other => EdgeKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EdgeKind::Call => "call",
            EdgeKind::Other(kind) => kind,
        }
    }
}

impl Serialize for EdgeKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub name: Option<String>,
    pub package: Option<String>,
    pub file: Option<String>,
    pub line: Option<i64>,
    pub end_line: Option<i64>,
    pub type_info: Option<String>,
}

pub fn is_external_id(id: &str) -> bool {
    id.starts_with(EXTERNAL_PREFIX)
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Serialize, Clone)]
pub struct SourceFile {
    pub file: String,
    pub content: String,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Caller,
    Callee,
}

/// One direction-tagged row of a neighborhood query.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct NeighborRow {
    pub direction: Direction,
    pub id: String,
    pub name: Option<String>,
}

/// The function a neighborhood is centred on.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TargetNode {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FunctionHit {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    /// Response-local label (`edge-<index>`), not a stable key.
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SourceSlice {
    pub file_name: String,
    pub start_line: i64,
    pub end_line: i64,
    pub code: String,
}

/// Display metadata for nodes whose source cannot be produced.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct NodeMeta {
    pub name: Option<String>,
    pub package: Option<String>,
    pub type_info: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoreOverview {
    pub db_path: String,
    pub nodes: i64,
    pub nodes_by_kind: BTreeMap<String, i64>,
    pub edges: i64,
    pub call_edges: i64,
    pub source_files: i64,
}
