mod grid;
mod heap;
pub mod normalize;
pub mod position;
pub mod ranking;
pub mod routing;
mod text;
pub(crate) mod types;
pub use types::*;

use normalize::normalize;
use position::position_nodes;
use ranking::{assign_ranks, count_crossings, order_layers};
use routing::route_edges;
use text::{measure_label, size_node};

use crate::config::LayoutConfig;
use crate::ir::Graph;
use crate::text_metrics::{HeuristicMetrics, TextMeasure};
use std::collections::BTreeMap;

/// Lays out `graph` with the deterministic heuristic text metrics.
pub fn compute_layout(graph: &Graph, config: &LayoutConfig) -> Layout {
    compute_layout_with(graph, config, &HeuristicMetrics)
}

/// Lays out `graph`, sizing node and edge labels with `measurer`.
pub fn compute_layout_with(
    graph: &Graph,
    config: &LayoutConfig,
    measurer: &dyn TextMeasure,
) -> Layout {
    let nodes: BTreeMap<String, NodeLayout> = graph
        .nodes
        .values()
        .map(|node| {
            (
                node.id.clone(),
                size_node(node, graph.kind, measurer, config),
            )
        })
        .collect();
    let edge_labels: Vec<Option<TextBlock>> = graph
        .edges
        .iter()
        .map(|edge| {
            edge.label
                .as_deref()
                .filter(|label| !label.trim().is_empty())
                .map(|label| measure_label(label, measurer, config))
        })
        .collect();
    layout_sized(graph, nodes, &edge_labels, config)
}

/// Runs ranking, ordering, positioning, routing and normalization over nodes
/// that already carry their width, height and label.
///
/// `sized` entries for ids not in `graph` are ignored; graph nodes missing
/// from `sized` are laid out as zero-size points. `edge_labels` is indexed
/// like `graph.edges`.
pub fn layout_sized(
    graph: &Graph,
    mut sized: BTreeMap<String, NodeLayout>,
    edge_labels: &[Option<TextBlock>],
    config: &LayoutConfig,
) -> Layout {
    let span = tracing::info_span!(
        "compute_layout",
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        direction = graph.direction.token()
    );
    let _guard = span.enter();

    if graph.nodes.is_empty() {
        return Layout::empty(graph.kind, graph.direction);
    }

    let node_ids = graph.ordered_node_ids();
    let mut nodes: BTreeMap<String, NodeLayout> = node_ids
        .iter()
        .map(|id| {
            let node = sized.remove(id).unwrap_or_else(|| NodeLayout {
                id: id.clone(),
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
                label: TextBlock::empty(),
                shape: graph
                    .nodes
                    .get(id)
                    .map_or(crate::ir::NodeShape::Rectangle, |node| node.shape),
            });
            (id.clone(), node)
        })
        .collect();

    let ranks = {
        let _stage = tracing::debug_span!("assign_ranks").entered();
        assign_ranks(&node_ids, &graph.edges, &graph.node_order)
    };

    let layers = {
        let _stage = tracing::debug_span!("order_layers", passes = config.order_passes).entered();
        order_layers(&ranks, &graph.edges, config.order_passes)
    };
    tracing::debug!(
        layers = layers.len(),
        crossings = count_crossings(&layers, &graph.edges),
        "layers ordered"
    );

    {
        let _stage = tracing::debug_span!("position_nodes").entered();
        position_nodes(&layers, &mut nodes, graph.direction, config);
    }

    let (mut edges, stats) = {
        let _stage = tracing::debug_span!("route_edges").entered();
        route_edges(&graph.edges, edge_labels, &nodes, graph.direction, config)
    };
    tracing::debug!(
        routed = edges.len(),
        searched = stats.searched,
        fallbacks = stats.fallbacks,
        self_loops = stats.self_loops,
        dropped = stats.dropped,
        "edges routed"
    );

    let (width, height) = {
        let _stage = tracing::debug_span!("normalize").entered();
        normalize(&mut nodes, &mut edges, config.boundary_pad)
    };
    tracing::debug!(width, height, "layout complete");

    Layout {
        kind: graph.kind,
        direction: graph.direction,
        nodes,
        edges,
        width,
        height,
    }
}
