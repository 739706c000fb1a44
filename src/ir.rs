use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    TopDown,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomTop),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::TopDown => "TD",
            Self::BottomTop => "BT",
            Self::LeftRight => "LR",
            Self::RightLeft => "RL",
        }
    }

    /// Ranks advance along the X axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    /// Ranks advance towards decreasing coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::RightLeft | Self::BottomTop)
    }
}

/// Diagram families that share the layered pipeline. Only node padding
/// differs between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    Flowchart,
    Class,
    State,
    Er,
    C4,
    Requirement,
    Block,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub directed: bool,
    pub arrow_start: bool,
    pub arrow_end: bool,
    pub style: EdgeStyle,
}

impl Edge {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            label: None,
            directed: true,
            arrow_start: false,
            arrow_end: true,
            style: EdgeStyle::Solid,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    Solid,
    Dotted,
    Thick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeShape {
    Rectangle,
    RoundRect,
    Stadium,
    Subroutine,
    Cylinder,
    Circle,
    DoubleCircle,
    Diamond,
    Hexagon,
    Parallelogram,
    ParallelogramAlt,
    Trapezoid,
    TrapezoidAlt,
    Asymmetric,
    Text,
}

#[derive(Debug, Clone)]
pub struct Graph {
    pub kind: DiagramKind,
    pub direction: Direction,
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
    /// Declaration index per node id. Only used to break ties.
    pub node_order: HashMap<String, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            kind: DiagramKind::Flowchart,
            direction: Direction::TopDown,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            node_order: HashMap::new(),
        }
    }

    pub fn ensure_node(&mut self, id: &str, label: Option<String>, shape: Option<NodeShape>) {
        let next_index = self.node_order.len();
        self.node_order.entry(id.to_string()).or_insert(next_index);
        let entry = self.nodes.entry(id.to_string()).or_insert(Node {
            id: id.to_string(),
            label: id.to_string(),
            shape: NodeShape::Rectangle,
        });
        if let Some(label) = label {
            entry.label = label;
        }
        if let Some(shape) = shape {
            entry.shape = shape;
        }
    }

    /// Appends an edge without declaring its endpoints.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Node ids sorted by declaration order, then by id for nodes that were
    /// inserted into `nodes` directly.
    pub fn ordered_node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.keys().cloned().collect();
        ids.sort_by(|a, b| {
            let a_key = self.node_order.get(a).copied().unwrap_or(usize::MAX);
            let b_key = self.node_order.get(b).copied().unwrap_or(usize::MAX);
            a_key.cmp(&b_key).then_with(|| a.cmp(b))
        });
        ids
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid graph document: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("unknown direction `{0}` (expected TD, TB, BT, LR or RL)")]
    UnknownDirection(String),
}

/// JSON form of a graph, as emitted by the diagram parsers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    #[serde(default = "default_kind")]
    pub kind: DiagramKind,
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
}

#[derive(Debug, Deserialize)]
pub struct NodeDocument {
    pub id: String,
    pub label: Option<String>,
    pub shape: Option<NodeShape>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDocument {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    #[serde(default = "default_true")]
    pub directed: bool,
    #[serde(default)]
    pub arrow_start: bool,
    #[serde(default = "default_true")]
    pub arrow_end: bool,
    pub style: Option<EdgeStyle>,
}

fn default_kind() -> DiagramKind {
    DiagramKind::Flowchart
}

fn default_direction() -> String {
    "TD".to_string()
}

fn default_true() -> bool {
    true
}

impl GraphDocument {
    pub fn from_json(input: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn into_graph(self) -> Result<Graph, GraphError> {
        let direction = Direction::from_token(self.direction.trim())
            .ok_or_else(|| GraphError::UnknownDirection(self.direction.clone()))?;
        let mut graph = Graph::new();
        graph.kind = self.kind;
        graph.direction = direction;
        for node in self.nodes {
            graph.ensure_node(&node.id, node.label, node.shape);
        }
        for edge in self.edges {
            graph.add_edge(Edge {
                from: edge.from,
                to: edge.to,
                label: edge.label,
                directed: edge.directed,
                arrow_start: edge.arrow_start,
                arrow_end: edge.arrow_end,
                style: edge.style.unwrap_or(EdgeStyle::Solid),
            });
        }
        Ok(graph)
    }
}

pub fn parse_graph_json(input: &str) -> Result<Graph, GraphError> {
    GraphDocument::from_json(input)?.into_graph()
}
