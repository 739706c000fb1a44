use std::collections::BTreeMap;

use super::{EdgeLayout, NodeLayout};

/// Translates nodes and edge geometry so the minimum occupied coordinate
/// sits at `pad` on both axes, and returns the canvas size
/// `(extent_x + 2 * pad, extent_y + 2 * pad)`.
///
/// An empty node map yields `(0.0, 0.0)` and leaves the edges untouched.
pub fn normalize(
    nodes: &mut BTreeMap<String, NodeLayout>,
    edges: &mut [EdgeLayout],
    pad: f32,
) -> (f32, f32) {
    if nodes.is_empty() {
        return (0.0, 0.0);
    }

    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    let mut include = |x: f32, y: f32| {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    };
    for node in nodes.values() {
        include(node.left(), node.top());
        include(node.right(), node.bottom());
    }
    for edge in edges.iter() {
        for &(x, y) in &edge.points {
            include(x, y);
        }
        include(edge.label_anchor.0, edge.label_anchor.1);
    }

    let dx = pad - min_x;
    let dy = pad - min_y;
    for node in nodes.values_mut() {
        node.x += dx;
        node.y += dy;
    }
    for edge in edges.iter_mut() {
        for point in &mut edge.points {
            point.0 += dx;
            point.1 += dy;
        }
        edge.label_anchor.0 += dx;
        edge.label_anchor.1 += dy;
    }

    (max_x - min_x + 2.0 * pad, max_y - min_y + 2.0 * pad)
}
