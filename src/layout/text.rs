use crate::config::{LayoutConfig, NodePadding};
use crate::ir::{DiagramKind, Node, NodeShape};
use crate::text_metrics::TextMeasure;

use super::{NodeLayout, TextBlock};

pub(super) fn measure_label(
    text: &str,
    measurer: &dyn TextMeasure,
    config: &LayoutConfig,
) -> TextBlock {
    let mut lines = split_lines(text);
    if lines.is_empty() {
        lines.push(String::new());
    }

    let font_size = config.font_size;
    let family = config.font_family.as_str();
    let max_len = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let max_width = lines
        .iter()
        .map(|line| measurer.line_width(line, font_size, family))
        .fold(0.0, f32::max);
    // Narrow fonts under-report; never go below the average advance.
    let guard_width = max_len as f32 * measurer.average_char_width(font_size, family);
    let width = max_width.max(guard_width);
    let height = if lines.len() == 1 && lines[0].is_empty() {
        0.0
    } else {
        lines.len() as f32 * font_size * config.label_line_height
    };

    TextBlock {
        lines,
        width,
        height,
    }
}

pub(super) fn split_lines(text: &str) -> Vec<String> {
    text.replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("<br>", "\n")
        .replace("\\n", "\n")
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

fn shape_padding_factors(shape: NodeShape) -> (f32, f32) {
    match shape {
        NodeShape::Stadium => (0.43, 0.5),
        NodeShape::Subroutine => (0.54, 0.5),
        NodeShape::Parallelogram => (0.894, 0.5),
        NodeShape::ParallelogramAlt => (0.904, 0.5),
        NodeShape::Text => (0.0, 0.0),
        _ => (1.0, 1.0),
    }
}

pub(super) fn shape_size(shape: NodeShape, label: &TextBlock, padding: NodePadding) -> (f32, f32) {
    let (pad_x_factor, pad_y_factor) = shape_padding_factors(shape);
    let base_width = label.width + padding.x * pad_x_factor * 2.0;
    let base_height = label.height + padding.y * pad_y_factor * 2.0;
    let mut width = base_width;
    let mut height = base_height;

    match shape {
        NodeShape::Diamond => {
            // Diamonds are squares sized off the larger dimension.
            let size = base_width.max(base_height) * 0.95;
            width = size;
            height = size;
        }
        NodeShape::Circle | NodeShape::DoubleCircle => {
            let size = if label.is_blank() {
                (padding.y * 1.4).max(14.0)
            } else {
                width.max(height)
            };
            width = size;
            height = size;
        }
        NodeShape::RoundRect => {
            width *= 1.1;
            height *= 1.05;
        }
        NodeShape::Cylinder => {
            width *= 1.1;
            height *= 1.1;
        }
        NodeShape::Hexagon => {
            width *= 1.2;
            height *= 1.1;
        }
        NodeShape::Trapezoid | NodeShape::TrapezoidAlt | NodeShape::Asymmetric => {
            width *= 1.2;
        }
        _ => {}
    }

    (width.max(1.0), height.max(1.0))
}

/// Sizes a node; the center stays at the origin until positioning.
pub(super) fn size_node(
    node: &Node,
    kind: DiagramKind,
    measurer: &dyn TextMeasure,
    config: &LayoutConfig,
) -> NodeLayout {
    let label = measure_label(&node.label, measurer, config);
    let (width, height) = shape_size(node.shape, &label, config.padding_for(kind));
    NodeLayout {
        id: node.id.clone(),
        x: 0.0,
        y: 0.0,
        width,
        height,
        label,
        shape: node.shape,
    }
}
