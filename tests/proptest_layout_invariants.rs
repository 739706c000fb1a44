//! Property-based invariant tests for the layered layout pipeline.
//!
//! For any graph of plain nodes and edges (cycles, self loops and dangling
//! endpoints included):
//!
//! 1. Totality: every node gets a rank and a `NodeLayout`
//! 2. Determinism: two runs produce bit-identical coordinates
//! 3. Non-negativity: boxes, edge points and label anchors sit at or past 0
//! 4. Endpoint identity: routes start and end on their nodes' boundaries
//! 5. Rank monotonicity: acyclic edges always point to a later rank
//! 6. Direction ordering: rank order shows up on the main axis

use layerflow::layout::ranking::assign_ranks;
use layerflow::layout::{Layout, NodeLayout};
use layerflow::{Direction, Edge, Graph, LayoutConfig, compute_layout};
use proptest::prelude::*;

const EPS: f32 = 1e-3;

// ── Helpers ─────────────────────────────────────────────────────────────

fn make_graph(node_count: usize, edges: &[(usize, usize)], direction: Direction) -> Graph {
    let mut graph = Graph::new();
    graph.direction = direction;
    for i in 0..node_count {
        graph.ensure_node(&format!("N{i}"), None, None);
    }
    for &(from, to) in edges {
        graph.add_edge(Edge::new(&format!("N{from}"), &format!("N{to}")));
    }
    graph
}

fn on_boundary(point: (f32, f32), node: &NodeLayout) -> bool {
    let (x, y) = point;
    let inside = x >= node.left() - EPS
        && x <= node.right() + EPS
        && y >= node.top() - EPS
        && y <= node.bottom() + EPS;
    let on_side = (x - node.left()).abs() < EPS
        || (x - node.right()).abs() < EPS
        || (y - node.top()).abs() < EPS
        || (y - node.bottom()).abs() < EPS;
    inside && on_side
}

fn main_axis(layout: &Layout, id: &str) -> f32 {
    let node = &layout.nodes[id];
    if layout.direction.is_horizontal() {
        node.x
    } else {
        node.y
    }
}

// ── Strategies ──────────────────────────────────────────────────────────

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::TopDown),
        Just(Direction::BottomTop),
        Just(Direction::LeftRight),
        Just(Direction::RightLeft),
    ]
}

/// Arbitrary graphs: cycles, self loops and duplicate edges allowed.
fn graph_strategy(
    max_nodes: usize,
    max_edges: usize,
) -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Direction)> {
    (1..=max_nodes, direction_strategy()).prop_flat_map(move |(n, dir)| {
        (
            Just(n),
            proptest::collection::vec((0..n, 0..n), 0..=max_edges),
            Just(dir),
        )
    })
}

/// Acyclic graphs: every edge points from a lower to a higher index.
fn dag_strategy(
    max_nodes: usize,
    max_edges: usize,
) -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Direction)> {
    (2..=max_nodes, direction_strategy()).prop_flat_map(move |(n, dir)| {
        let edge_count = 1..=max_edges.min(n * (n - 1) / 2);
        (
            Just(n),
            proptest::collection::vec((0..n, 0..n), edge_count).prop_map(|edges| {
                edges
                    .into_iter()
                    .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
                    .filter(|(a, b)| a != b)
                    .collect::<Vec<_>>()
            }),
            Just(dir),
        )
    })
}

// ── 1. Totality ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_node_is_ranked_and_placed((n, edges, dir) in graph_strategy(10, 18)) {
        let graph = make_graph(n, &edges, dir);
        let ids = graph.ordered_node_ids();
        let ranks = assign_ranks(&ids, &graph.edges, &graph.node_order);
        prop_assert_eq!(ranks.len(), n);

        let layout = compute_layout(&graph, &LayoutConfig::default());
        prop_assert_eq!(layout.nodes.len(), n);
        prop_assert_eq!(layout.edges.len(), edges.len());
        for id in graph.nodes.keys() {
            prop_assert!(layout.nodes.contains_key(id), "node {} missing", id);
        }
    }
}

// ── 2. Determinism ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn layout_is_deterministic((n, edges, dir) in graph_strategy(8, 14)) {
        let graph = make_graph(n, &edges, dir);
        let config = LayoutConfig::default();
        let first = compute_layout(&graph, &config);
        let second = compute_layout(&graph, &config);
        for (id, node) in &first.nodes {
            let other = &second.nodes[id];
            prop_assert_eq!(node.x.to_bits(), other.x.to_bits());
            prop_assert_eq!(node.y.to_bits(), other.y.to_bits());
        }
        prop_assert_eq!(first.edges.len(), second.edges.len());
        for (a, b) in first.edges.iter().zip(&second.edges) {
            prop_assert_eq!(&a.points, &b.points);
            prop_assert_eq!(a.label_anchor, b.label_anchor);
        }
        prop_assert_eq!(first.width.to_bits(), second.width.to_bits());
        prop_assert_eq!(first.height.to_bits(), second.height.to_bits());
    }
}

// ── 3. Non-negativity ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn normalized_layout_is_non_negative((n, edges, dir) in graph_strategy(10, 18)) {
        let layout = compute_layout(&make_graph(n, &edges, dir), &LayoutConfig::default());
        for node in layout.nodes.values() {
            prop_assert!(node.left() >= -EPS, "{} left {}", node.id, node.left());
            prop_assert!(node.top() >= -EPS, "{} top {}", node.id, node.top());
            prop_assert!(node.right() <= layout.width + EPS);
            prop_assert!(node.bottom() <= layout.height + EPS);
        }
        for edge in &layout.edges {
            for &(x, y) in &edge.points {
                prop_assert!(x >= -EPS && y >= -EPS, "point ({}, {})", x, y);
            }
            prop_assert!(edge.label_anchor.0 >= -EPS && edge.label_anchor.1 >= -EPS);
        }
    }
}

// ── 4. Endpoint identity ────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn routes_start_and_end_on_node_boundaries((n, edges, dir) in graph_strategy(8, 14)) {
        let layout = compute_layout(&make_graph(n, &edges, dir), &LayoutConfig::default());
        for edge in &layout.edges {
            prop_assert!(edge.points.len() >= 2);
            let first = edge.points[0];
            let last = edge.points[edge.points.len() - 1];
            prop_assert!(on_boundary(first, &layout.nodes[&edge.from]),
                "{}->{} starts at {:?}", edge.from, edge.to, first);
            prop_assert!(on_boundary(last, &layout.nodes[&edge.to]),
                "{}->{} ends at {:?}", edge.from, edge.to, last);
        }
    }
}

// ── 5. Rank monotonicity ────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn acyclic_edges_advance_rank((n, edges, dir) in dag_strategy(12, 24)) {
        let graph = make_graph(n, &edges, dir);
        let ids = graph.ordered_node_ids();
        let ranks = assign_ranks(&ids, &graph.edges, &graph.node_order);
        for edge in &graph.edges {
            prop_assert!(ranks[&edge.to] > ranks[&edge.from],
                "{}({}) -> {}({})", edge.from, ranks[&edge.from], edge.to, ranks[&edge.to]);
        }
    }
}

// ── 6. Direction ordering ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn chain_follows_direction(len in 2usize..7, dir in direction_strategy()) {
        let edges: Vec<(usize, usize)> = (0..len - 1).map(|i| (i, i + 1)).collect();
        let layout = compute_layout(&make_graph(len, &edges, dir), &LayoutConfig::default());
        for i in 0..len - 1 {
            let here = main_axis(&layout, &format!("N{i}"));
            let next = main_axis(&layout, &format!("N{}", i + 1));
            if dir.is_reversed() {
                prop_assert!(here > next, "N{} at {} vs {}", i, here, next);
            } else {
                prop_assert!(here < next, "N{} at {} vs {}", i, here, next);
            }
        }
    }
}
