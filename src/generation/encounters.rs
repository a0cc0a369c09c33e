//! # Encounter Placement
//!
//! Picks the player spawn inside a generated cave and seeds enemy packs far
//! enough from it and from each other.

use crate::{DeepwildError, DeepwildResult, EnemyType, Position, TileGrid};
use ::pathfinding::prelude::bfs_reach;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Spawn placement tuning, in cell units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    /// Packs only form strictly farther than this from the player start
    pub safe_spawn_dist: f64,
    /// Minimum distance between two pack centres
    pub cluster_dist: f64,
    /// Enemies per pack
    pub pack_size: usize,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            safe_spawn_dist: 10.0,
            cluster_dist: 20.0,
            pack_size: 3,
        }
    }
}

impl SpawnParams {
    pub fn validate(&self) -> DeepwildResult<()> {
        if !self.safe_spawn_dist.is_finite() || self.safe_spawn_dist < 0.0 {
            return Err(DeepwildError::InvalidParameters(format!(
                "safe_spawn_dist must be a non-negative number, got {}",
                self.safe_spawn_dist
            )));
        }
        if !self.cluster_dist.is_finite() || self.cluster_dist <= 0.0 {
            return Err(DeepwildError::InvalidParameters(format!(
                "cluster_dist must be positive, got {}",
                self.cluster_dist
            )));
        }
        Ok(())
    }
}

/// One enemy to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub enemy_type: EnemyType,
    pub position: Position,
    /// Index of the cluster this enemy belongs to
    pub pack: usize,
}

/// Spawn layout of one area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterLayout {
    pub player_start: Position,
    pub clusters: Vec<Position>,
    pub enemy_spawns: Vec<EnemySpawn>,
}

/// Places the player start and enemy packs on a cave.
///
/// The start is the first floor cell in column-major order. Scanning on in
/// that order, a floor cell becomes a pack centre when it is farther than
/// `safe_spawn_dist` from the start and at least `cluster_dist` from every
/// earlier centre. Each pack fills its centre and the nearest free floor
/// cells breadth-first.
pub fn populate_area(
    grid: &TileGrid,
    enemy_type: EnemyType,
    params: &SpawnParams,
) -> DeepwildResult<EncounterLayout> {
    let player_start = grid.first_floor()?;

    let mut clusters: Vec<Position> = Vec::new();
    for pos in grid.floor_positions() {
        if pos == player_start || player_start.euclidean_distance(pos) <= params.safe_spawn_dist {
            continue;
        }
        if clusters
            .iter()
            .all(|cluster| cluster.euclidean_distance(pos) >= params.cluster_dist)
        {
            clusters.push(pos);
        }
    }

    let mut occupied: HashSet<Position> = HashSet::from([player_start]);
    let mut enemy_spawns = Vec::new();
    for (pack, cluster) in clusters.iter().enumerate() {
        let members: Vec<Position> = bfs_reach(*cluster, |pos| {
            pos.cardinal_adjacent_positions()
                .into_iter()
                .filter(|next| grid.is_floor(next.x, next.y))
                .collect::<Vec<_>>()
        })
        .filter(|pos| !occupied.contains(pos))
        .take(params.pack_size)
        .collect();

        for position in members {
            occupied.insert(position);
            enemy_spawns.push(EnemySpawn {
                enemy_type,
                position,
                pack,
            });
        }
    }

    debug!(
        "Placed start at {} with {} packs ({} enemies)",
        player_start,
        clusters.len(),
        enemy_spawns.len()
    );
    Ok(EncounterLayout {
        player_start,
        clusters,
        enemy_spawns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;

    fn open_grid(width: u32, height: u32) -> TileGrid {
        let mut grid = TileGrid::new(width, height);
        let interior: Vec<Position> = grid.interior_positions().collect();
        for pos in interior {
            grid.set(pos, Cell::Floor).unwrap();
        }
        grid
    }

    #[test]
    fn test_start_is_first_floor_in_scan_order() {
        let grid = open_grid(12, 8);
        let layout = populate_area(&grid, EnemyType::Mob, &SpawnParams::default()).unwrap();
        assert_eq!(layout.player_start, Position::new(1, 1));
    }

    #[test]
    fn test_clusters_respect_distances() {
        let grid = open_grid(40, 20);
        let params = SpawnParams {
            safe_spawn_dist: 8.0,
            cluster_dist: 10.0,
            pack_size: 3,
        };
        let layout = populate_area(&grid, EnemyType::GiantLizard, &params).unwrap();

        assert!(!layout.clusters.is_empty());
        for (i, a) in layout.clusters.iter().enumerate() {
            assert!(a.euclidean_distance(layout.player_start) > params.safe_spawn_dist);
            for b in &layout.clusters[i + 1..] {
                assert!(a.euclidean_distance(*b) >= params.cluster_dist);
            }
        }
    }

    #[test]
    fn test_packs_fill_floor_without_overlap() {
        let grid = open_grid(40, 20);
        let params = SpawnParams {
            safe_spawn_dist: 5.0,
            cluster_dist: 6.0,
            pack_size: 4,
        };
        let layout = populate_area(&grid, EnemyType::Mob, &params).unwrap();

        assert_eq!(layout.enemy_spawns.len(), layout.clusters.len() * 4);
        let unique: HashSet<Position> = layout.enemy_spawns.iter().map(|s| s.position).collect();
        assert_eq!(unique.len(), layout.enemy_spawns.len());
        assert!(!unique.contains(&layout.player_start));
        assert!(layout
            .enemy_spawns
            .iter()
            .all(|s| grid.is_floor(s.position.x, s.position.y) && s.enemy_type == EnemyType::Mob));
        // Each pack starts on its own cluster cell.
        for (pack, cluster) in layout.clusters.iter().enumerate() {
            assert!(layout
                .enemy_spawns
                .iter()
                .any(|s| s.pack == pack && s.position == *cluster));
        }
    }

    #[test]
    fn test_small_cave_has_no_packs() {
        let grid = open_grid(6, 6);
        let layout = populate_area(&grid, EnemyType::Mob, &SpawnParams::default()).unwrap();
        assert!(layout.clusters.is_empty());
        assert!(layout.enemy_spawns.is_empty());
    }

    #[test]
    fn test_empty_cave_reports_no_floor() {
        let grid = TileGrid::new(10, 10);
        assert!(matches!(
            populate_area(&grid, EnemyType::Mob, &SpawnParams::default()),
            Err(DeepwildError::NoFloorFound)
        ));
    }

    #[test]
    fn test_params_validation() {
        assert!(SpawnParams::default().validate().is_ok());
        let bad = SpawnParams {
            cluster_dist: 0.0,
            ..SpawnParams::default()
        };
        assert!(bad.validate().is_err());
    }
}
