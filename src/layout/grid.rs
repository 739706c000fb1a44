use std::collections::BTreeMap;

use crate::config::RoutingConfig;

use super::NodeLayout;

/// Occupancy grid over the positioned nodes. Built once per layout call and
/// shared read-only by every edge search.
#[derive(Debug, Clone)]
pub(super) struct ObstacleGrid {
    cell: f32,
    min_x: f32,
    min_y: f32,
    pub(super) cols: i32,
    pub(super) rows: i32,
    /// Indices into `node_ids` of the nodes whose padded box covers each cell.
    owners: Vec<Vec<usize>>,
    node_ids: Vec<String>,
}

impl ObstacleGrid {
    pub(super) fn build(
        nodes: &BTreeMap<String, NodeLayout>,
        routing: &RoutingConfig,
    ) -> Option<Self> {
        let cell = routing.grid_cell;
        if nodes.is_empty() || !(cell > 0.0) {
            return None;
        }
        let pad = routing.obstacle_padding.max(0.0);
        let boxes: Vec<(f32, f32, f32, f32)> = nodes
            .values()
            .map(|node| {
                (
                    node.left() - pad,
                    node.top() - pad,
                    node.right() + pad,
                    node.bottom() + pad,
                )
            })
            .collect();

        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for (left, top, right, bottom) in &boxes {
            min_x = min_x.min(*left);
            min_y = min_y.min(*top);
            max_x = max_x.max(*right);
            max_y = max_y.max(*bottom);
        }
        let margin = routing.grid_margin.max(0.0);
        min_x -= margin;
        min_y -= margin;
        max_x += margin;
        max_y += margin;
        if !(max_x - min_x).is_finite() || !(max_y - min_y).is_finite() {
            return None;
        }

        // Size in f32 first; a tiny cell would overflow the integer casts.
        let cols_f = ((max_x - min_x) / cell).ceil() + 1.0;
        let rows_f = ((max_y - min_y) / cell).ceil() + 1.0;
        let axis_ok = |n: f32| n.is_finite() && n > 1.0 && n <= i32::MAX as f32;
        if !axis_ok(cols_f) || !axis_ok(rows_f) {
            return None;
        }
        let total_f = cols_f * rows_f;
        if !total_f.is_finite() || total_f > routing.max_cells as f32 {
            tracing::debug!(
                total_cells = total_f,
                max_cells = routing.max_cells,
                "routing grid over budget"
            );
            return None;
        }
        let cols = cols_f as i32;
        let rows = rows_f as i32;
        let total_cells = (cols as usize) * (rows as usize);

        let mut owners = vec![Vec::new(); total_cells];
        for (idx, (left, top, right, bottom)) in boxes.iter().enumerate() {
            let start_x = ((left - min_x) / cell).floor().max(0.0) as i32;
            let end_x = ((right - min_x) / cell).floor().min((cols - 1) as f32) as i32;
            let start_y = ((top - min_y) / cell).floor().max(0.0) as i32;
            let end_y = ((bottom - min_y) / cell).floor().min((rows - 1) as f32) as i32;
            for iy in start_y..=end_y {
                for ix in start_x..=end_x {
                    owners[(iy * cols + ix) as usize].push(idx);
                }
            }
        }

        Some(Self {
            cell,
            min_x,
            min_y,
            cols,
            rows,
            owners,
            node_ids: nodes.keys().cloned().collect(),
        })
    }

    fn index(&self, ix: i32, iy: i32) -> usize {
        (iy * self.cols + ix) as usize
    }

    pub(super) fn contains(&self, ix: i32, iy: i32) -> bool {
        ix >= 0 && iy >= 0 && ix < self.cols && iy < self.rows
    }

    pub(super) fn cell_for_point(&self, x: f32, y: f32) -> Option<(i32, i32)> {
        let ix = ((x - self.min_x) / self.cell).floor() as i32;
        let iy = ((y - self.min_y) / self.cell).floor() as i32;
        self.contains(ix, iy).then_some((ix, iy))
    }

    pub(super) fn cell_center(&self, ix: i32, iy: i32) -> (f32, f32) {
        (
            self.min_x + (ix as f32 + 0.5) * self.cell,
            self.min_y + (iy as f32 + 0.5) * self.cell,
        )
    }

    pub(super) fn is_blocked(&self, ix: i32, iy: i32) -> bool {
        !self.owners[self.index(ix, iy)].is_empty()
    }

    /// Free cells, and cells covered only by the edge's own endpoints.
    pub(super) fn is_passable(&self, ix: i32, iy: i32, from_id: &str, to_id: &str) -> bool {
        if !self.is_blocked(ix, iy) {
            return true;
        }
        self.owners[self.index(ix, iy)].iter().all(|&owner| {
            let id = self.node_ids[owner].as_str();
            id == from_id || id == to_id
        })
    }
}
