//! # Search Algorithms
//!
//! Breadth-first reachability helpers used to extract cave regions and to
//! check the connectivity invariants of grids and graphs.

use crate::{Position, TileGrid};
use ::pathfinding::prelude::{bfs_reach, dijkstra_all};
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Collects every position 4-connected to `start` for which `passable` holds.
///
/// Uses an explicit work list, so region size is not bounded by stack depth.
pub fn flood_fill<F>(start: Position, passable: F) -> BTreeSet<Position>
where
    F: Fn(Position) -> bool,
{
    if !passable(start) {
        return BTreeSet::new();
    }
    bfs_reach(start, |pos| {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|next| passable(*next))
            .collect::<Vec<_>>()
    })
    .collect()
}

/// Floor cells reachable from `start` in a grid.
pub fn reachable_floor(grid: &TileGrid, start: Position) -> BTreeSet<Position> {
    flood_fill(start, |pos| grid.is_floor(pos.x, pos.y))
}

/// Checks that all floor cells of a grid form a single 4-connected region.
///
/// A grid without floor is trivially connected.
pub fn floor_is_connected(grid: &TileGrid) -> bool {
    match grid.first_floor() {
        Ok(start) => reachable_floor(grid, start).len() == grid.floor_count(),
        Err(_) => true,
    }
}

/// Checks that every node can reach every other node.
pub fn is_connected<N, FN, IN>(nodes: &[N], neighbors: FN) -> bool
where
    N: Eq + Hash + Clone,
    FN: FnMut(&N) -> IN,
    IN: IntoIterator<Item = N>,
{
    match nodes.first() {
        Some(start) => bfs_reach(start.clone(), neighbors).count() == nodes.len(),
        None => true,
    }
}

/// Number of hops from `start` to every reachable node, `start` included.
pub fn hop_distances<N, FN, IN>(start: &N, mut neighbors: FN) -> HashMap<N, usize>
where
    N: Eq + Hash + Clone,
    FN: FnMut(&N) -> IN,
    IN: IntoIterator<Item = N>,
{
    let mut distances: HashMap<N, usize> = dijkstra_all(start, |node| {
        neighbors(node)
            .into_iter()
            .map(|next| (next, 1_usize))
            .collect::<Vec<_>>()
    })
    .into_iter()
    .map(|(node, (_, cost))| (node, cost))
    .collect();
    distances.insert(start.clone(), 0);
    distances
}
