use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::ir::{Direction, Edge};

use super::grid::ObstacleGrid;
use super::heap::MinHeap;
use super::{EdgeLayout, NodeLayout, TextBlock};

// ── A* cost scaling ─────────────────────────────────────────────────
/// Integer cost of one cell step, so fractional turn penalties stay integral.
const ASTAR_STEP_COST: u32 = 10;

/// Tolerance for treating two coordinates as equal.
const EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl EdgeSide {
    pub fn is_vertical(self) -> bool {
        matches!(self, EdgeSide::Left | EdgeSide::Right)
    }
}

/// Side of the source node an edge leaves from, and of the target node it
/// enters, for the given flow direction.
pub fn edge_sides(direction: Direction) -> (EdgeSide, EdgeSide) {
    match direction {
        Direction::TopDown => (EdgeSide::Bottom, EdgeSide::Top),
        Direction::BottomTop => (EdgeSide::Top, EdgeSide::Bottom),
        Direction::LeftRight => (EdgeSide::Right, EdgeSide::Left),
        Direction::RightLeft => (EdgeSide::Left, EdgeSide::Right),
    }
}

/// Midpoint of one side of the node's box.
pub fn anchor_point_for_node(node: &NodeLayout, side: EdgeSide) -> (f32, f32) {
    match side {
        EdgeSide::Left => (node.left(), node.y),
        EdgeSide::Right => (node.right(), node.y),
        EdgeSide::Top => (node.x, node.top()),
        EdgeSide::Bottom => (node.x, node.bottom()),
    }
}

pub fn edge_endpoints(
    from: &NodeLayout,
    to: &NodeLayout,
    direction: Direction,
) -> ((f32, f32), (f32, f32)) {
    let (start_side, end_side) = edge_sides(direction);
    (
        anchor_point_for_node(from, start_side),
        anchor_point_for_node(to, end_side),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingStats {
    pub searched: usize,
    pub fallbacks: usize,
    pub self_loops: usize,
    pub dropped: usize,
}

/// Routes every edge whose endpoints are both positioned, in input order.
/// `edge_labels` is indexed like `edges`.
pub fn route_edges(
    edges: &[Edge],
    edge_labels: &[Option<TextBlock>],
    nodes: &BTreeMap<String, NodeLayout>,
    direction: Direction,
    config: &LayoutConfig,
) -> (Vec<EdgeLayout>, RoutingStats) {
    let mut stats = RoutingStats::default();
    let grid = ObstacleGrid::build(nodes, &config.routing);
    if grid.is_none() && !nodes.is_empty() {
        tracing::debug!("no routing grid, every edge takes the fallback route");
    }

    let mut routed = Vec::with_capacity(edges.len());
    for (idx, edge) in edges.iter().enumerate() {
        let (Some(from), Some(to)) = (nodes.get(&edge.from), nodes.get(&edge.to)) else {
            stats.dropped += 1;
            continue;
        };

        let points = if edge.is_self_loop() {
            stats.self_loops += 1;
            route_self_loop(from, direction, config.routing.self_loop_extent)
        } else {
            let (start, end) = edge_endpoints(from, to, direction);
            let searched = grid.as_ref().and_then(|grid| {
                route_with_grid(
                    grid,
                    &edge.from,
                    &edge.to,
                    start,
                    end,
                    config.routing.turn_penalty,
                )
            });
            match searched {
                Some(points) => {
                    stats.searched += 1;
                    points
                }
                None => {
                    tracing::trace!(
                        from = %edge.from,
                        to = %edge.to,
                        "no grid path, using fallback"
                    );
                    stats.fallbacks += 1;
                    fallback_route(start, end, direction)
                }
            }
        };

        routed.push(EdgeLayout {
            from: edge.from.clone(),
            to: edge.to.clone(),
            label: edge_labels.get(idx).cloned().flatten(),
            label_anchor: label_anchor(&points),
            points,
            directed: edge.directed,
            arrow_start: edge.arrow_start,
            arrow_end: edge.arrow_end,
            style: edge.style,
        });
    }
    (routed, stats)
}

/// Grid path from `start` to `end`, simplified and pinned to the exact
/// boundary points. `None` when either point is off-grid or no path exists.
pub(super) fn route_with_grid(
    grid: &ObstacleGrid,
    from_id: &str,
    to_id: &str,
    start: (f32, f32),
    end: (f32, f32),
    turn_penalty: f32,
) -> Option<Vec<(f32, f32)>> {
    let start_cell = grid.cell_for_point(start.0, start.1)?;
    let end_cell = grid.cell_for_point(end.0, end.1)?;
    if start_cell == end_cell {
        return Some(vec![start, end]);
    }

    let cells = astar(grid, start_cell, end_cell, from_id, to_id, turn_penalty)?;
    let centers: Vec<(f32, f32)> = cells
        .iter()
        .map(|&(ix, iy)| grid.cell_center(ix, iy))
        .collect();
    let mut points = compress_path(&centers);
    if let Some(first) = points.first_mut() {
        *first = start;
    }
    if let Some(last) = points.last_mut() {
        *last = end;
    }
    Some(points)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridState {
    x: i32,
    y: i32,
    dir: u8,
}

const DIRS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// 4-connected A* over the obstacle grid with a Manhattan heuristic.
///
/// A cell is enterable when it is free, covered only by the edge's own
/// endpoint nodes, or is the start/goal cell. Search states carry the
/// incoming direction so `turn_penalty` can discourage staircases; the
/// heuristic stays admissible because turning only adds cost.
pub(super) fn astar(
    grid: &ObstacleGrid,
    start: (i32, i32),
    goal: (i32, i32),
    from_id: &str,
    to_id: &str,
    turn_penalty: f32,
) -> Option<Vec<(i32, i32)>> {
    if !grid.contains(start.0, start.1) || !grid.contains(goal.0, goal.1) {
        return None;
    }
    let cols = grid.cols;
    let turn_cost = (turn_penalty.max(0.0) * ASTAR_STEP_COST as f32).round() as u32;
    let state_index = |s: GridState| ((s.y * cols + s.x) as usize) * 4 + s.dir as usize;
    let heuristic = |x: i32, y: i32| {
        ((x - goal.0).unsigned_abs() + (y - goal.1).unsigned_abs()) * ASTAR_STEP_COST
    };

    let states = (grid.cols as usize) * (grid.rows as usize) * 4;
    let mut best_cost = vec![u32::MAX; states];
    let mut prev: Vec<Option<GridState>> = vec![None; states];
    let mut open: MinHeap<(u32, u32), GridState> = MinHeap::new();

    let h0 = heuristic(start.0, start.1);
    for dir in 0..4u8 {
        let state = GridState {
            x: start.0,
            y: start.1,
            dir,
        };
        best_cost[state_index(state)] = 0;
        open.push((h0, h0), state);
    }

    let mut reached: Option<GridState> = None;
    while let Some(((estimate, h), state)) = open.pop() {
        let cost = estimate - h;
        if cost != best_cost[state_index(state)] {
            continue;
        }
        if (state.x, state.y) == goal {
            reached = Some(state);
            break;
        }
        for (dir_idx, (dx, dy)) in DIRS.iter().enumerate() {
            let (nx, ny) = (state.x + dx, state.y + dy);
            if !grid.contains(nx, ny) {
                continue;
            }
            let endpoint_cell = (nx, ny) == goal || (nx, ny) == start;
            if !endpoint_cell && !grid.is_passable(nx, ny, from_id, to_id) {
                continue;
            }
            let mut next_cost = cost.saturating_add(ASTAR_STEP_COST);
            if state.dir != dir_idx as u8 {
                next_cost = next_cost.saturating_add(turn_cost);
            }
            let next = GridState {
                x: nx,
                y: ny,
                dir: dir_idx as u8,
            };
            let next_idx = state_index(next);
            if next_cost >= best_cost[next_idx] {
                continue;
            }
            best_cost[next_idx] = next_cost;
            prev[next_idx] = Some(state);
            let h = heuristic(nx, ny);
            open.push((next_cost.saturating_add(h), h), next);
        }
    }

    let mut cur = reached?;
    let mut cells = vec![(cur.x, cur.y)];
    while let Some(before) = prev[state_index(cur)] {
        cells.push((before.x, before.y));
        cur = before;
    }
    cells.reverse();
    Some(cells)
}

/// Deterministic three-segment route through the midline between the
/// endpoints, perpendicular to the flow. Always succeeds.
pub fn fallback_route(start: (f32, f32), end: (f32, f32), direction: Direction) -> Vec<(f32, f32)> {
    let raw = if direction.is_horizontal() {
        let mid_x = (start.0 + end.0) / 2.0;
        [start, (mid_x, start.1), (mid_x, end.1), end]
    } else {
        let mid_y = (start.1 + end.1) / 2.0;
        [start, (start.0, mid_y), (end.0, mid_y), end]
    };
    compress_path(&raw)
}

fn same_point(a: (f32, f32), b: (f32, f32)) -> bool {
    (a.0 - b.0).abs() <= EPS && (a.1 - b.1).abs() <= EPS
}

/// `b` lies on the straight run from `a` to `c`.
fn is_straight_through(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let (dx1, dy1) = (b.0 - a.0, b.1 - a.1);
    let (dx2, dy2) = (c.0 - b.0, c.1 - b.1);
    let cross = dx1 * dy2 - dy1 * dx2;
    let dot = dx1 * dx2 + dy1 * dy2;
    cross.abs() <= EPS && dot > 0.0
}

/// Drops repeated points and points where the path does not turn. The
/// endpoints are always kept.
pub fn compress_path(points: &[(f32, f32)]) -> Vec<(f32, f32)> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<(f32, f32)> = Vec::with_capacity(points.len());
    for &point in points {
        if out.last().is_some_and(|&last| same_point(last, point)) {
            continue;
        }
        if out.len() >= 2 && is_straight_through(out[out.len() - 2], out[out.len() - 1], point) {
            out.pop();
        }
        out.push(point);
    }
    if out.len() < 2 {
        out.push(points[points.len() - 1]);
    }
    out
}

pub fn path_length(points: &[(f32, f32)]) -> f32 {
    points
        .windows(2)
        .map(|seg| {
            let dx = seg[1].0 - seg[0].0;
            let dy = seg[1].1 - seg[0].1;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

/// Point at half the polyline's arc length.
pub fn label_anchor(points: &[(f32, f32)]) -> (f32, f32) {
    let Some(&first) = points.first() else {
        return (0.0, 0.0);
    };
    let total = path_length(points);
    if total <= EPS {
        return first;
    }
    let half = total / 2.0;
    let mut walked = 0.0f32;
    for seg in points.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        if len > 0.0 && walked + len >= half {
            let t = ((half - walked) / len).clamp(0.0, 1.0);
            return (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
        }
        walked += len;
    }
    points[points.len() - 1]
}

/// Loop that leaves and re-enters the node's forward side, a quarter of the
/// side's length either way from its midpoint.
pub fn route_self_loop(node: &NodeLayout, direction: Direction, extent: f32) -> Vec<(f32, f32)> {
    let (side, _) = edge_sides(direction);
    let (bx, by) = anchor_point_for_node(node, side);
    let reach = extent.max(1.0);
    if side.is_vertical() {
        let out = if side == EdgeSide::Right { reach } else { -reach };
        let q = node.height / 4.0;
        vec![(bx, by - q), (bx + out, by - q), (bx + out, by + q), (bx, by + q)]
    } else {
        let out = if side == EdgeSide::Bottom { reach } else { -reach };
        let q = node.width / 4.0;
        vec![(bx - q, by), (bx - q, by + out), (bx + q, by + out), (bx + q, by)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;

    fn node(id: &str, x: f32, y: f32, width: f32, height: f32) -> NodeLayout {
        NodeLayout {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            label: TextBlock::empty(),
            shape: crate::ir::NodeShape::Rectangle,
        }
    }

    fn nodes(list: Vec<NodeLayout>) -> BTreeMap<String, NodeLayout> {
        list.into_iter().map(|n| (n.id.clone(), n)).collect()
    }

    fn on_boundary(point: (f32, f32), node: &NodeLayout) -> bool {
        let within_x = point.0 >= node.left() - 1e-3 && point.0 <= node.right() + 1e-3;
        let within_y = point.1 >= node.top() - 1e-3 && point.1 <= node.bottom() + 1e-3;
        let on_vertical =
            (point.0 - node.left()).abs() < 1e-3 || (point.0 - node.right()).abs() < 1e-3;
        let on_horizontal =
            (point.1 - node.top()).abs() < 1e-3 || (point.1 - node.bottom()).abs() < 1e-3;
        within_x && within_y && (on_vertical || on_horizontal)
    }

    fn segment_hits_box(a: (f32, f32), b: (f32, f32), node: &NodeLayout) -> bool {
        let steps = 200;
        (0..=steps).any(|i| {
            let t = i as f32 / steps as f32;
            let (x, y) = (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
            x > node.left() && x < node.right() && y > node.top() && y < node.bottom()
        })
    }

    #[test]
    fn endpoints_follow_direction() {
        let a = node("A", 0.0, 0.0, 40.0, 20.0);
        let b = node("B", 100.0, 0.0, 40.0, 20.0);
        assert_eq!(edge_endpoints(&a, &b, Direction::LeftRight), ((20.0, 0.0), (80.0, 0.0)));
        assert_eq!(edge_endpoints(&a, &b, Direction::RightLeft), ((-20.0, 0.0), (120.0, 0.0)));
        assert_eq!(edge_endpoints(&a, &b, Direction::TopDown), ((0.0, 10.0), (100.0, -10.0)));
        assert_eq!(edge_endpoints(&a, &b, Direction::BottomTop), ((0.0, -10.0), (100.0, 10.0)));
    }

    #[test]
    fn compress_path_keeps_only_turns() {
        let raw = vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (20.0, 0.0),
            (20.0, 10.0),
            (20.0, 20.0),
            (30.0, 20.0),
        ];
        assert_eq!(
            compress_path(&raw),
            vec![(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (30.0, 20.0)]
        );
        assert_eq!(
            compress_path(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]),
            vec![(1.0, 1.0), (1.0, 1.0)]
        );
    }

    #[test]
    fn label_anchor_uses_arc_length() {
        // Total length 40; the midpoint is 10 along the long second leg.
        let points = vec![(0.0, 0.0), (0.0, 10.0), (30.0, 10.0)];
        let (x, y) = label_anchor(&points);
        assert!((x - 10.0).abs() < 1e-4 && (y - 10.0).abs() < 1e-4);
        assert_eq!(label_anchor(&[(5.0, 5.0), (5.0, 5.0)]), (5.0, 5.0));
    }

    #[test]
    fn fallback_is_a_z_shape() {
        let points = fallback_route((0.0, 0.0), (100.0, 40.0), Direction::LeftRight);
        assert_eq!(points, vec![(0.0, 0.0), (50.0, 0.0), (50.0, 40.0), (100.0, 40.0)]);
        let straight = fallback_route((0.0, 0.0), (0.0, 80.0), Direction::TopDown);
        assert_eq!(straight, vec![(0.0, 0.0), (0.0, 80.0)]);
    }

    #[test]
    fn grid_route_avoids_blocking_node() {
        let layout = nodes(vec![
            node("A", 0.0, 0.0, 40.0, 40.0),
            node("X", 110.0, 0.0, 60.0, 60.0),
            node("B", 220.0, 0.0, 40.0, 40.0),
        ]);
        let grid = ObstacleGrid::build(&layout, &RoutingConfig::default()).expect("grid");
        let (start, end) = edge_endpoints(&layout["A"], &layout["B"], Direction::LeftRight);
        let points = route_with_grid(&grid, "A", "B", start, end, 0.5).expect("path");
        assert_eq!(points[0], start);
        assert_eq!(*points.last().unwrap(), end);
        assert!(points.len() > 2);
        for seg in points.windows(2) {
            assert!(!segment_hits_box(seg[0], seg[1], &layout["X"]), "path crosses X: {points:?}");
        }
    }

    #[test]
    fn astar_reports_unreachable_goal() {
        // B sits inside a ring of blockers padded shut around it.
        let mut list = vec![
            node("A", -200.0, 0.0, 20.0, 20.0),
            node("B", 0.0, 0.0, 20.0, 20.0),
        ];
        for (i, (x, y)) in [
            (-30.0, -30.0),
            (0.0, -30.0),
            (30.0, -30.0),
            (-30.0, 0.0),
            (30.0, 0.0),
            (-30.0, 30.0),
            (0.0, 30.0),
            (30.0, 30.0),
        ]
        .into_iter()
        .enumerate()
        {
            list.push(node(&format!("W{i}"), x, y, 30.0, 30.0));
        }
        let layout = nodes(list);
        let grid = ObstacleGrid::build(&layout, &RoutingConfig::default()).expect("grid");
        let start = grid.cell_for_point(-200.0, 0.0).expect("start");
        // Goal cell at B's center is walled in; the start/goal exemption only
        // applies to the goal itself, not the ring around it.
        let goal = grid.cell_for_point(0.0, 0.0).expect("goal");
        assert!(astar(&grid, start, goal, "A", "B", 0.5).is_none());

        let (s, e) = edge_endpoints(&layout["A"], &layout["B"], Direction::LeftRight);
        let routed = route_edges(
            &[Edge::new("A", "B")],
            &[None],
            &layout,
            Direction::LeftRight,
            &LayoutConfig::default(),
        );
        assert_eq!(routed.1.fallbacks, 1);
        let points = &routed.0[0].points;
        assert_eq!(points[0], s);
        assert_eq!(*points.last().unwrap(), e);
    }

    #[test]
    fn same_cell_returns_direct_segment() {
        let layout = nodes(vec![
            node("A", 0.0, 0.0, 20.0, 20.0),
            node("B", 21.0, 0.0, 20.0, 20.0),
        ]);
        let grid = ObstacleGrid::build(&layout, &RoutingConfig::default()).expect("grid");
        let points =
            route_with_grid(&grid, "A", "B", (10.0, 0.0), (11.0, 0.0), 0.5).expect("path");
        assert_eq!(points, vec![(10.0, 0.0), (11.0, 0.0)]);
    }

    #[test]
    fn unresolved_endpoints_are_dropped() {
        let layout = nodes(vec![node("A", 0.0, 0.0, 20.0, 20.0)]);
        let (edges, stats) = route_edges(
            &[Edge::new("A", "ghost"), Edge::new("ghost", "A")],
            &[],
            &layout,
            Direction::TopDown,
            &LayoutConfig::default(),
        );
        assert!(edges.is_empty());
        assert_eq!(stats.dropped, 2);
    }

    #[test]
    fn missing_grid_falls_back_for_every_edge() {
        let mut config = LayoutConfig::default();
        config.routing.max_cells = 1;
        let layout = nodes(vec![
            node("A", 0.0, 0.0, 20.0, 20.0),
            node("B", 0.0, 100.0, 20.0, 20.0),
        ]);
        let (edges, stats) = route_edges(
            &[Edge::new("A", "B")],
            &[],
            &layout,
            Direction::TopDown,
            &config,
        );
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(edges[0].points, vec![(0.0, 10.0), (0.0, 90.0)]);
        assert_eq!(edges[0].label_anchor, (0.0, 50.0));
    }

    #[test]
    fn tiny_grid_cell_falls_back_instead_of_overflowing() {
        let mut config = LayoutConfig::default();
        config.routing.grid_cell = 1e-30;
        config.routing.max_cells = usize::MAX;
        let layout = nodes(vec![
            node("A", 0.0, 0.0, 40.0, 20.0),
            node("B", 100.0, 0.0, 40.0, 20.0),
        ]);
        let (edges, stats) = route_edges(
            &[Edge::new("A", "B")],
            &[],
            &layout,
            Direction::LeftRight,
            &config,
        );
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.searched, 0);
        let (start, end) = edge_endpoints(&layout["A"], &layout["B"], Direction::LeftRight);
        assert_eq!(edges[0].points, fallback_route(start, end, Direction::LeftRight));
    }

    #[test]
    fn self_loop_starts_and_ends_on_the_node() {
        let a = node("A", 50.0, 50.0, 40.0, 20.0);
        for direction in [
            Direction::TopDown,
            Direction::BottomTop,
            Direction::LeftRight,
            Direction::RightLeft,
        ] {
            let points = route_self_loop(&a, direction, 20.0);
            assert_eq!(points.len(), 4);
            assert!(on_boundary(points[0], &a));
            assert!(on_boundary(points[3], &a));
        }
    }

    #[test]
    fn routed_endpoints_lie_on_node_boundaries() {
        let layout = nodes(vec![
            node("A", 0.0, 0.0, 40.0, 30.0),
            node("B", 0.0, 120.0, 60.0, 30.0),
            node("C", 90.0, 120.0, 30.0, 30.0),
        ]);
        let edges = [Edge::new("A", "B"), Edge::new("A", "C"), Edge::new("C", "A")];
        let config = LayoutConfig::default();
        let (routed, stats) = route_edges(&edges, &[], &layout, Direction::TopDown, &config);
        assert_eq!(routed.len(), 3);
        assert_eq!(stats.searched + stats.fallbacks, 3);
        for edge in &routed {
            assert!(edge.points.len() >= 2);
            assert!(on_boundary(edge.points[0], &layout[&edge.from]));
            assert!(on_boundary(*edge.points.last().unwrap(), &layout[&edge.to]));
        }
    }
}
