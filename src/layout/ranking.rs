use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::ir::Edge;

/// Assigns every id in `node_ids` a layer index.
///
/// Kahn's algorithm over the edges whose endpoints are both known, processed
/// FIFO in declaration order. When the queue drains with nodes still unranked
/// the graph has a cycle: the unranked node declared first is forced in, ranked
/// after whichever of its predecessors already have a rank. Each forced step
/// ranks one node, so the loop terminates.
pub fn assign_ranks(
    node_ids: &[String],
    edges: &[Edge],
    node_order: &HashMap<String, usize>,
) -> HashMap<String, usize> {
    let known: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        if edge.is_self_loop() {
            continue;
        }
        let (from, to) = (edge.from.as_str(), edge.to.as_str());
        if known.contains(from) && known.contains(to) {
            successors.entry(from).or_default().push(to);
            predecessors.entry(to).or_default().push(from);
        }
    }

    let fallback_order: HashMap<&str, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();
    let order_key = |id: &str| -> usize {
        node_order
            .get(id)
            .copied()
            .unwrap_or_else(|| fallback_order.get(id).copied().unwrap_or(usize::MAX))
    };
    let mut ordered: Vec<&str> = node_ids.iter().map(String::as_str).collect();
    ordered.sort_by(|a, b| order_key(a).cmp(&order_key(b)).then_with(|| a.cmp(b)));
    ordered.dedup();

    let mut in_degree: HashMap<&str, usize> = ordered
        .iter()
        .map(|id| (*id, predecessors.get(id).map_or(0, Vec::len)))
        .collect();
    let mut queue: VecDeque<&str> = ordered
        .iter()
        .copied()
        .filter(|id| in_degree.get(id).copied() == Some(0))
        .collect();

    let mut ranks: HashMap<String, usize> = HashMap::with_capacity(ordered.len());
    loop {
        while let Some(id) = queue.pop_front() {
            if ranks.contains_key(id) {
                continue;
            }
            let rank = predecessors
                .get(id)
                .into_iter()
                .flatten()
                .filter_map(|pred| ranks.get(*pred))
                .map(|rank| rank + 1)
                .max()
                .unwrap_or(0);
            ranks.insert(id.to_string(), rank);

            for next in successors.get(id).into_iter().flatten() {
                if ranks.contains_key(*next) {
                    continue;
                }
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(*next);
                    }
                }
            }
        }

        if ranks.len() >= ordered.len() {
            break;
        }

        // `ordered` is in declaration order, so the first hit is the lowest index.
        let Some(forced) = ordered.iter().copied().find(|id| !ranks.contains_key(*id)) else {
            break;
        };
        tracing::trace!(node = forced, "breaking cycle");
        queue.push_back(forced);
    }

    ranks
}

/// Groups ranked nodes into one sequence per rank, each sorted by id.
pub fn build_layers(ranks: &HashMap<String, usize>) -> Vec<Vec<String>> {
    let Some(max_rank) = ranks.values().copied().max() else {
        return Vec::new();
    };
    let mut layers: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
    for (id, rank) in ranks {
        layers[*rank].push(id.clone());
    }
    for layer in &mut layers {
        layer.sort();
    }
    layers
}

/// Orders each rank to reduce crossings with the median heuristic.
///
/// Even passes sweep down, sorting each layer by the median position of its
/// predecessors in the layer above; odd passes sweep up using successors.
/// Only edges spanning exactly one rank take part.
pub fn order_layers(
    ranks: &HashMap<String, usize>,
    edges: &[Edge],
    passes: usize,
) -> Vec<Vec<String>> {
    let mut layers = build_layers(ranks);
    if layers.len() <= 1 {
        return layers;
    }

    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        let (Some(from_rank), Some(to_rank)) = (ranks.get(&edge.from), ranks.get(&edge.to)) else {
            continue;
        };
        if *to_rank != from_rank + 1 {
            continue;
        }
        outgoing
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
        incoming
            .entry(edge.to.as_str())
            .or_default()
            .push(edge.from.as_str());
    }

    let max_rank = layers.len() - 1;
    for pass in 0..passes {
        if pass % 2 == 0 {
            for rank in 1..=max_rank {
                reorder_layer(&mut layers, rank, rank - 1, &incoming);
            }
        } else {
            for rank in (0..max_rank).rev() {
                reorder_layer(&mut layers, rank, rank + 1, &outgoing);
            }
        }
    }
    layers
}

fn reorder_layer(
    layers: &mut [Vec<String>],
    rank: usize,
    fixed_rank: usize,
    neighbors: &HashMap<&str, Vec<&str>>,
) {
    if layers[rank].len() <= 1 {
        return;
    }
    let mut scored: Vec<(Option<f32>, String)> = {
        let positions: HashMap<&str, usize> = layers[fixed_rank]
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.as_str(), idx))
            .collect();
        layers[rank]
            .iter()
            .map(|id| (median_position(id, neighbors, &positions), id.clone()))
            .collect()
    };
    // Stable: ties and nodes without a median keep their relative order.
    scored.sort_by(|(a, _), (b, _)| compare_medians(*a, *b));
    layers[rank] = scored.into_iter().map(|(_, id)| id).collect();
}

fn compare_medians(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Median of the positions of `node_id`'s neighbors in the fixed layer, or
/// `None` when it has no neighbor there.
pub fn median_position(
    node_id: &str,
    neighbors: &HashMap<&str, Vec<&str>>,
    positions: &HashMap<&str, usize>,
) -> Option<f32> {
    let mut values: Vec<f32> = neighbors
        .get(node_id)?
        .iter()
        .filter_map(|neighbor| positions.get(neighbor))
        .map(|pos| *pos as f32)
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) * 0.5)
    }
}

/// Number of pairwise crossings between edges joining adjacent layers.
pub fn count_crossings(layers: &[Vec<String>], edges: &[Edge]) -> usize {
    let mut slot: HashMap<&str, (usize, usize)> = HashMap::new();
    for (rank, layer) in layers.iter().enumerate() {
        for (idx, id) in layer.iter().enumerate() {
            slot.insert(id.as_str(), (rank, idx));
        }
    }

    let mut between: Vec<Vec<(usize, usize)>> = vec![Vec::new(); layers.len()];
    for edge in edges {
        let (Some(&(from_rank, from_idx)), Some(&(to_rank, to_idx))) =
            (slot.get(edge.from.as_str()), slot.get(edge.to.as_str()))
        else {
            continue;
        };
        if to_rank == from_rank + 1 {
            between[from_rank].push((from_idx, to_idx));
        } else if from_rank == to_rank + 1 {
            between[to_rank].push((to_idx, from_idx));
        }
    }

    let mut crossings = 0;
    for pairs in &between {
        for (i, a) in pairs.iter().enumerate() {
            for b in &pairs[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}
