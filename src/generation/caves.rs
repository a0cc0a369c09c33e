//! # Cave Generation
//!
//! Organic cave layouts built with a randomized cellular automaton.
//!
//! The generator works in five phases:
//! 1. Random fill of the interior, the border ring stays wall
//! 2. Relaxation through independent single-cell automaton updates
//! 3. Edge smoothing that removes thin wall spurs
//! 4. Region extraction, discarding floor pockets below the minimum size
//! 5. Connectivity repair with biased random-walk tunnels
//!
//! After a final smoothing sweep every floor cell is reachable from every
//! other floor cell.

use crate::utils::{flood_fill, reachable_floor};
use crate::{
    Cell, DeepwildError, DeepwildResult, Direction, GenerationConfig, Generator, Position, Region,
    TileGrid,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::utils::{check_probability, rng_from_seed};

/// Tuning for the cave generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveParams {
    /// Number of single-cell automaton updates
    pub iterations: u32,
    /// Wall neighbours (out of 8) above which a cell becomes wall, below which floor
    pub wall_threshold_neighbors: usize,
    /// Probability that an interior cell starts as wall
    pub initial_wall_probability: f64,
    /// Floor regions smaller than this many cells are filled in
    pub room_min_size: usize,
    /// Sweeps of the edge smoothing pass
    pub smoothing_passes: u32,
    /// A wall with at most this many cardinal wall neighbours becomes floor
    pub smoothing_threshold: usize,
    /// Random-walk tunnels give up after this many steps per `width + height`
    pub tunnel_step_factor: u32,
}

impl Default for CaveParams {
    fn default() -> Self {
        Self {
            iterations: 30_000,
            wall_threshold_neighbors: 4,
            initial_wall_probability: 0.35,
            room_min_size: 16,
            smoothing_passes: 5,
            smoothing_threshold: 1,
            tunnel_step_factor: 8,
        }
    }
}

impl CaveParams {
    /// Rejects parameters that can never produce a cave of the given size.
    pub fn validate(&self, width: u32, height: u32) -> DeepwildResult<()> {
        if width < 3 || height < 3 {
            return Err(DeepwildError::InvalidParameters(format!(
                "Cave grid must be at least 3x3, got {}x{}",
                width, height
            )));
        }
        let interior = (width as usize - 2) * (height as usize - 2);
        if self.room_min_size == 0 || self.room_min_size > interior {
            return Err(DeepwildError::InvalidParameters(format!(
                "room_min_size must be within 1..={} for a {}x{} grid, got {}",
                interior, width, height, self.room_min_size
            )));
        }
        check_probability("initial_wall_probability", self.initial_wall_probability)?;
        if self.wall_threshold_neighbors > 8 {
            return Err(DeepwildError::InvalidParameters(format!(
                "wall_threshold_neighbors must be at most 8, got {}",
                self.wall_threshold_neighbors
            )));
        }
        if self.smoothing_threshold > 4 {
            return Err(DeepwildError::InvalidParameters(format!(
                "smoothing_threshold must be at most 4, got {}",
                self.smoothing_threshold
            )));
        }
        Ok(())
    }
}

/// How a single tunnel reached its anchor region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelOutcome {
    /// The random walk entered the anchor region
    Walked { steps: usize },
    /// The walk hit its step cap and was finished with a straight carve
    DirectFallback { steps: usize },
}

/// Cellular-automata cave generator.
#[derive(Debug, Clone, Default)]
pub struct CaveGenerator;

impl CaveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates a `width × height` cave from the given parameters.
    ///
    /// An all-wall grid is a valid outcome for degenerate parameters; the
    /// caller decides whether to retry (see [`Generator::validate`]).
    #[cfg_attr(feature = "dev-tools", tracing::instrument(skip(self, params, rng)))]
    pub fn generate_grid(
        &self,
        width: u32,
        height: u32,
        params: &CaveParams,
        rng: &mut StdRng,
    ) -> DeepwildResult<TileGrid> {
        params.validate(width, height)?;
        let mut grid = TileGrid::new(width, height);

        self.random_fill(&mut grid, params, rng)?;
        self.relax(&mut grid, params, rng)?;
        self.smooth_edges(&mut grid, params)?;

        let regions = self.extract_regions(&mut grid, params.room_min_size)?;
        let tunnels = self.connect_regions(&mut grid, &regions, params, rng)?;
        let fallbacks = tunnels
            .iter()
            .filter(|outcome| matches!(outcome, TunnelOutcome::DirectFallback { .. }))
            .count();
        if fallbacks > 0 {
            warn!(
                "{} of {} cave tunnels hit the step cap and were carved straight",
                fallbacks,
                tunnels.len()
            );
        }

        self.smooth_edges(&mut grid, params)?;

        info!(
            "Generated {}x{} cave: {} regions, {} tunnels, {} floor cells",
            width,
            height,
            regions.len(),
            tunnels.len(),
            grid.floor_count()
        );
        grid.set_regions(regions);
        Ok(grid)
    }

    /// Every interior cell becomes wall with the configured probability.
    fn random_fill(
        &self,
        grid: &mut TileGrid,
        params: &CaveParams,
        rng: &mut StdRng,
    ) -> DeepwildResult<()> {
        for y in 1..grid.height as i32 - 1 {
            for x in 1..grid.width as i32 - 1 {
                if rng.gen::<f64>() >= params.initial_wall_probability {
                    grid.set(Position::new(x, y), Cell::Floor)?;
                }
            }
        }
        Ok(())
    }

    /// Independent updates of random interior cells, not a synchronous sweep.
    fn relax(
        &self,
        grid: &mut TileGrid,
        params: &CaveParams,
        rng: &mut StdRng,
    ) -> DeepwildResult<()> {
        let max_x = grid.width as i32 - 2;
        let max_y = grid.height as i32 - 2;
        for _ in 0..params.iterations {
            let pos = Position::new(rng.gen_range(1..=max_x), rng.gen_range(1..=max_y));
            let walls = grid.wall_neighbors(pos);
            if walls > params.wall_threshold_neighbors {
                grid.set(pos, Cell::Wall)?;
            } else if walls < params.wall_threshold_neighbors {
                grid.set(pos, Cell::Floor)?;
            }
        }
        debug!(
            "Relaxation finished after {} updates: {} floor cells",
            params.iterations,
            grid.floor_count()
        );
        Ok(())
    }

    /// Opens walls that have too few cardinal wall neighbours.
    fn smooth_edges(&self, grid: &mut TileGrid, params: &CaveParams) -> DeepwildResult<()> {
        for _ in 0..params.smoothing_passes {
            let positions: Vec<Position> = grid.interior_positions().collect();
            for pos in positions {
                if grid.is_wall(pos.x, pos.y)
                    && grid.cardinal_wall_neighbors(pos) <= params.smoothing_threshold
                {
                    grid.set(pos, Cell::Floor)?;
                }
            }
        }
        Ok(())
    }

    /// Partitions the floor into regions and fills in the small ones.
    ///
    /// Regions are returned in the column-major order of their first cell.
    fn extract_regions(
        &self,
        grid: &mut TileGrid,
        room_min_size: usize,
    ) -> DeepwildResult<Vec<Region>> {
        let mut seen: BTreeSet<Position> = BTreeSet::new();
        let mut retained = Vec::new();
        let mut discarded = 0_usize;

        for start in grid.floor_positions() {
            if seen.contains(&start) {
                continue;
            }
            let cells = flood_fill(start, |pos| grid.is_floor(pos.x, pos.y));
            seen.extend(cells.iter().copied());

            if cells.len() >= room_min_size {
                retained.extend(Region::new(cells));
            } else {
                for pos in &cells {
                    grid.set(*pos, Cell::Wall)?;
                }
                discarded += 1;
            }
        }

        debug!(
            "Region extraction kept {} regions and filled {} small pockets",
            retained.len(),
            discarded
        );
        Ok(retained)
    }

    /// Tunnels each region to its nearest region it cannot yet reach.
    ///
    /// Every pass either joins two components or finds everything already
    /// joined, so after one pass over all regions the floor is connected.
    fn connect_regions(
        &self,
        grid: &mut TileGrid,
        regions: &[Region],
        params: &CaveParams,
        rng: &mut StdRng,
    ) -> DeepwildResult<Vec<TunnelOutcome>> {
        let mut outcomes = Vec::new();

        for (index, current) in regions.iter().enumerate() {
            let anchor = current.representative();
            let reachable = reachable_floor(grid, anchor);

            let mut nearest: Option<(Position, f64)> = None;
            for (other_index, other) in regions.iter().enumerate() {
                let candidate = other.representative();
                if other_index == index || reachable.contains(&candidate) {
                    continue;
                }
                let distance = anchor.euclidean_distance(candidate);
                if nearest.map_or(true, |(_, best)| distance < best) {
                    nearest = Some((candidate, distance));
                }
            }

            if let Some((start, _)) = nearest {
                let outcome = self.carve_tunnel(grid, anchor, start, current, params, rng)?;
                debug!("Tunnel {} -> {}: {:?}", start, anchor, outcome);
                outcomes.push(outcome);
            }
        }

        Ok(outcomes)
    }

    /// Random walk from `start` until it enters `target`, biased toward `anchor`.
    ///
    /// Each step picks north, south, east or west with weight 1, plus 1 for
    /// each direction that closes the offset to the anchor. Steps off the
    /// interior are skipped but still count toward the step cap.
    pub fn carve_tunnel(
        &self,
        grid: &mut TileGrid,
        anchor: Position,
        start: Position,
        target: &Region,
        params: &CaveParams,
        rng: &mut StdRng,
    ) -> DeepwildResult<TunnelOutcome> {
        let step_cap = params.tunnel_step_factor as usize * (grid.width + grid.height) as usize;
        let mut walker = start;
        let mut steps = 0_usize;

        while !target.contains(walker) {
            if steps >= step_cap {
                self.carve_direct(grid, walker, anchor)?;
                return Ok(TunnelOutcome::DirectFallback { steps });
            }

            let direction = biased_direction(walker, anchor, rng.gen::<f64>());
            let next = walker.step(direction);
            if grid.is_interior(next) {
                walker = next;
                if grid.is_wall(walker.x, walker.y) {
                    grid.set(walker, Cell::Floor)?;
                }
            }
            steps += 1;
        }

        Ok(TunnelOutcome::Walked { steps })
    }

    /// L-shaped carve: along the row of `from`, then along the column of `to`.
    fn carve_direct(&self, grid: &mut TileGrid, from: Position, to: Position) -> DeepwildResult<()> {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            grid.set(Position::new(x, from.y), Cell::Floor)?;
        }
        for y in from.y.min(to.y)..=from.y.max(to.y) {
            grid.set(Position::new(to.x, y), Cell::Floor)?;
        }
        Ok(())
    }
}

/// Picks a walk direction from a uniform roll in `[0, 1)`.
///
/// The unit interval is split north, south, east, west in proportion to
/// each direction's weight.
fn biased_direction(walker: Position, anchor: Position, roll: f64) -> Direction {
    const BIAS: f64 = 1.0;
    let mut weights = [1.0_f64; 4];

    if walker.x < anchor.x {
        weights[2] += BIAS;
    } else if walker.x > anchor.x {
        weights[3] += BIAS;
    }
    if walker.y < anchor.y {
        weights[1] += BIAS;
    } else if walker.y > anchor.y {
        weights[0] += BIAS;
    }

    let total: f64 = weights.iter().sum();
    let mut upper = 0.0;
    for (direction, weight) in Direction::all().into_iter().zip(weights) {
        upper += weight / total;
        if roll < upper {
            return direction;
        }
    }
    Direction::West
}

impl Generator<TileGrid> for CaveGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DeepwildResult<TileGrid> {
        self.generate_grid(config.map_width, config.map_height, &config.cave, rng)
    }

    fn validate(&self, grid: &TileGrid, config: &GenerationConfig) -> DeepwildResult<()> {
        if grid.floor_count() == 0 {
            return Err(DeepwildError::NoFloorFound);
        }
        if !grid.border_is_solid() {
            return Err(DeepwildError::InvalidState(
                "Cave border ring contains floor".to_string(),
            ));
        }
        let start = grid.first_floor()?;
        let reachable = reachable_floor(grid, start);
        if reachable.len() != grid.floor_count() {
            return Err(DeepwildError::InvalidState(format!(
                "Only {} of {} floor cells are connected",
                reachable.len(),
                grid.floor_count()
            )));
        }
        if reachable.len() < config.cave.room_min_size {
            return Err(DeepwildError::InvalidState(format!(
                "Cave floor of {} cells is below the minimum region size {}",
                reachable.len(),
                config.cave.room_min_size
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "CaveGenerator"
    }
}

/// Generates a cave from a raw seed.
///
/// # Examples
///
/// ```
/// use deepwild::{generate_cave, CaveParams};
///
/// let grid = generate_cave(20, 20, &CaveParams::default(), 42).unwrap();
/// assert!(grid.border_is_solid());
/// ```
pub fn generate_cave(
    width: u32,
    height: u32,
    params: &CaveParams,
    seed: u64,
) -> DeepwildResult<TileGrid> {
    let mut rng = rng_from_seed(seed);
    CaveGenerator::new().generate_grid(width, height, params, &mut rng)
}
