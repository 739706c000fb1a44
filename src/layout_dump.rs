use crate::layout::{Layout, TextBlock};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub kind: String,
    pub direction: String,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub shape: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: LabelDump,
}

#[derive(Debug, Serialize)]
pub struct LabelDump {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

impl From<&TextBlock> for LabelDump {
    fn from(block: &TextBlock) -> Self {
        Self {
            lines: block.lines.clone(),
            width: block.width,
            height: block.height,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub directed: bool,
    pub arrow_start: bool,
    pub arrow_end: bool,
    pub style: String,
    pub points: Vec<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelDump>,
    pub label_anchor: [f32; 2],
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.clone(),
                shape: format!("{:?}", node.shape),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                label: LabelDump::from(&node.label),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                directed: edge.directed,
                arrow_start: edge.arrow_start,
                arrow_end: edge.arrow_end,
                style: format!("{:?}", edge.style),
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
                label: edge.label.as_ref().map(LabelDump::from),
                label_anchor: [edge.label_anchor.0, edge.label_anchor.1],
            })
            .collect();

        LayoutDump {
            kind: format!("{:?}", layout.kind),
            direction: layout.direction.token().to_string(),
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or to stdout when `path` is
/// `None` or `-`.
pub fn write_layout_dump(path: Option<&Path>, layout: &Layout) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout);
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.flush()?;
        }
        _ => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
