use std::collections::BTreeMap;

use crate::ir::{DiagramKind, Direction};

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

impl TextBlock {
    pub fn empty() -> Self {
        Self {
            lines: vec![String::new()],
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }
}

/// A positioned node. `x`/`y` is the center of the node's box.
#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: TextBlock,
    pub shape: crate::ir::NodeShape,
}

impl NodeLayout {
    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Extent along the rank axis.
    pub(super) fn main_extent(&self, horizontal: bool) -> f32 {
        if horizontal { self.width } else { self.height }
    }

    /// Extent along the within-layer axis.
    pub(super) fn cross_extent(&self, horizontal: bool) -> f32 {
        if horizontal { self.height } else { self.width }
    }
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub label: Option<TextBlock>,
    pub label_anchor: (f32, f32),
    pub points: Vec<(f32, f32)>,
    pub directed: bool,
    pub arrow_start: bool,
    pub arrow_end: bool,
    pub style: crate::ir::EdgeStyle,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub kind: DiagramKind,
    pub direction: Direction,
    pub nodes: BTreeMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn empty(kind: DiagramKind, direction: Direction) -> Self {
        Self {
            kind,
            direction,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            width: 0.0,
            height: 0.0,
        }
    }
}
