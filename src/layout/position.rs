use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::ir::Direction;

use super::NodeLayout;

/// Places node centers from their rank and in-layer order.
///
/// Ranks advance along the main axis (X for LR/RL, Y for TD/BT); each rank
/// line sits half its tallest node past the previous rank plus
/// `rank_spacing`. Within a layer nodes are packed with `node_spacing` and
/// centered on the cross axis. Reversed directions are laid out forward and
/// then mirrored across the total main extent.
pub fn position_nodes(
    layers: &[Vec<String>],
    nodes: &mut BTreeMap<String, NodeLayout>,
    direction: Direction,
    config: &LayoutConfig,
) {
    if layers.is_empty() {
        return;
    }
    let horizontal = direction.is_horizontal();
    let pad = config.boundary_pad;

    let mut main_cursor = 0.0f32;
    for layer in layers {
        let max_main = layer
            .iter()
            .filter_map(|id| nodes.get(id))
            .map(|node| node.main_extent(horizontal))
            .fold(0.0f32, f32::max);
        let main = pad + main_cursor + max_main / 2.0;

        let mut cross_cursor = 0.0f32;
        let mut placed: Vec<(&str, f32)> = Vec::with_capacity(layer.len());
        for id in layer {
            let Some(node) = nodes.get(id) else {
                continue;
            };
            let extent = node.cross_extent(horizontal);
            placed.push((id.as_str(), cross_cursor + extent / 2.0));
            cross_cursor += extent + config.node_spacing;
        }
        let layer_extent = (cross_cursor - config.node_spacing).max(0.0);
        let shift = -layer_extent / 2.0;

        for (id, cross) in placed {
            if let Some(node) = nodes.get_mut(id) {
                set_axes(node, horizontal, main, pad + cross + shift);
            }
        }
        main_cursor += max_main + config.rank_spacing;
    }

    if direction.is_reversed() {
        let total_main = main_cursor - config.rank_spacing;
        let far_edge = 2.0 * pad + total_main;
        for id in layers.iter().flatten() {
            if let Some(node) = nodes.get_mut(id) {
                if horizontal {
                    node.x = far_edge - node.x;
                } else {
                    node.y = far_edge - node.y;
                }
            }
        }
    }
}

fn set_axes(node: &mut NodeLayout, horizontal: bool, main: f32, cross: f32) {
    if horizontal {
        node.x = main;
        node.y = cross;
    } else {
        node.x = cross;
        node.y = main;
    }
}
