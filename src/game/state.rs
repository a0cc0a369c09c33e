//! # Game State Module
//!
//! The world layer tying the overworld graph to the cave behind each node.
//!
//! A [`GameState`] owns one generated overworld and lazily builds the area
//! map of every node the traveller enters. Area seeds are derived from the
//! world seed and the node coordinate, so a world seed reproduces every cave
//! no matter in which order the nodes are visited.

use crate::generation::utils::{create_rng, rng_from_seed};
use crate::utils::derive_area_seed;
use crate::{
    populate_area, CaveGenerator, CaveParams, DeepwildError, DeepwildResult, EnemySpawn,
    EnemyType, GenerationConfig, Generator, GoalPolicy, OverworldGraph, OverworldGraphGenerator,
    Position, TileGrid,
};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// A generated cave plus everything placed in it.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaMap {
    /// Overworld node this area belongs to
    pub node: Position,
    /// Enemy type of every pack in the area
    pub enemy_type: EnemyType,
    /// The cave itself
    pub grid: TileGrid,
    /// Where the player appears on entry
    pub player_start: Position,
    /// Pack centres, in placement order
    pub clusters: Vec<Position>,
    /// Every enemy to spawn
    pub enemy_spawns: Vec<EnemySpawn>,
    /// Seed the cave was generated from
    pub seed: u64,
}

impl AreaMap {
    /// Generates the area of `node` from an explicit seed.
    ///
    /// Returns [`DeepwildError::NoFloorFound`] when the cave came out solid,
    /// leaving the retry decision to the caller.
    pub fn generate(
        node: Position,
        profile: &MapProfile,
        config: &GenerationConfig,
        seed: u64,
    ) -> DeepwildResult<Self> {
        let mut rng = rng_from_seed(seed);
        let grid = CaveGenerator::new().generate_grid(
            config.map_width,
            config.map_height,
            &profile.cave,
            &mut rng,
        )?;
        let layout = populate_area(&grid, profile.enemy_type, &config.spawn)?;

        Ok(Self {
            node,
            enemy_type: profile.enemy_type,
            grid,
            player_start: layout.player_start,
            clusters: layout.clusters,
            enemy_spawns: layout.enemy_spawns,
            seed,
        })
    }

    pub fn enemy_count(&self) -> usize {
        self.enemy_spawns.len()
    }
}

/// What an area map is generated from.
#[derive(Debug, Clone, PartialEq)]
pub struct MapProfile {
    pub cave: CaveParams,
    pub enemy_type: EnemyType,
}

/// One run through a generated world.
#[derive(Debug, Clone)]
pub struct GameState {
    config: GenerationConfig,
    overworld: OverworldGraph,
    areas: BTreeMap<Position, AreaMap>,
    visits: BTreeMap<Position, u32>,
}

impl GameState {
    /// Starts a new game: builds the overworld, picks the goal and enters
    /// the starting node.
    ///
    /// # Examples
    ///
    /// ```
    /// use deepwild::{GameState, GenerationConfig};
    ///
    /// let game = GameState::new_game(&GenerationConfig::for_testing(3)).unwrap();
    /// let area = game.current_area().unwrap();
    /// assert_eq!(area.node, game.overworld().current_node());
    /// ```
    pub fn new_game(config: &GenerationConfig) -> DeepwildResult<Self> {
        config.validate()?;

        let mut rng = create_rng(config);
        let generator = OverworldGraphGenerator::new();
        let mut overworld = generator.generate(config, &mut rng)?;
        generator.validate(&overworld, config)?;

        if let Some(goal) = pick_goal(&overworld, config.goal_policy) {
            overworld.set_goal(goal)?;
        }

        let mut state = Self {
            config: config.clone(),
            overworld,
            areas: BTreeMap::new(),
            visits: BTreeMap::new(),
        };
        let start = state.overworld.current_node();
        state.enter(start)?;

        info!(
            "New game with seed {}: {} nodes, {} edges, start {}, goal {:?}",
            config.seed,
            state.overworld.node_count(),
            state.overworld.edge_count(),
            start,
            state.overworld.goal()
        );
        Ok(state)
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn overworld(&self) -> &OverworldGraph {
        &self.overworld
    }

    /// The area the traveller is standing in.
    pub fn current_area(&self) -> DeepwildResult<&AreaMap> {
        let node = self.overworld.current_node();
        self.areas
            .get(&node)
            .ok_or_else(|| DeepwildError::InvalidState(format!("No area generated for {}", node)))
    }

    /// The cached area of a node, if it was ever entered.
    pub fn area(&self, node: Position) -> Option<&AreaMap> {
        self.areas.get(&node)
    }

    /// Cave parameters and enemy type used for a node's area.
    pub fn map_profile(&self, node: Position) -> DeepwildResult<MapProfile> {
        let attrs = self
            .overworld
            .node_attr(node)
            .ok_or_else(|| DeepwildError::InvalidTravel(format!("Unknown node {}", node)))?;
        Ok(MapProfile {
            cave: self.config.cave.clone(),
            enemy_type: attrs.enemy_type,
        })
    }

    /// Sets the pending destination; it must neighbour the current node.
    pub fn set_destination(&mut self, node: Position) -> DeepwildResult<()> {
        self.overworld.set_destination(node)
    }

    /// Picks the neighbour closest to a point on the overworld map as the
    /// destination and returns it.
    pub fn choose_destination_near(&mut self, x: f64, y: f64) -> DeepwildResult<Position> {
        let node = self.overworld.closest_neighbor(x, y).ok_or_else(|| {
            DeepwildError::InvalidTravel(format!(
                "Node {} has no neighbours",
                self.overworld.current_node()
            ))
        })?;
        self.overworld.set_destination(node)?;
        Ok(node)
    }

    /// Travels to the pending destination and enters its area.
    ///
    /// The area is built before the move is committed; if it cannot be
    /// generated the traveller stays where they are with the destination
    /// still pending.
    pub fn travel(&mut self) -> DeepwildResult<&AreaMap> {
        let node = self
            .overworld
            .destination()
            .ok_or_else(|| DeepwildError::InvalidTravel("No destination set".to_string()))?;
        let area = self.prepare_area(node)?;
        self.overworld.commit_travel()?;
        self.record_entry(node, area);
        self.current_area()
    }

    /// True when the current node is the goal.
    pub fn reached_goal(&self) -> bool {
        self.overworld.goal() == Some(self.overworld.current_node())
    }

    /// Number of distinct nodes visited so far.
    pub fn visited_count(&self) -> usize {
        self.overworld
            .nodes()
            .filter(|node| {
                self.overworld
                    .node_attr(*node)
                    .is_some_and(|attrs| attrs.visited)
            })
            .count()
    }

    /// How many times a node has been entered.
    pub fn visits(&self, node: Position) -> u32 {
        self.visits.get(&node).copied().unwrap_or(0)
    }

    fn enter(&mut self, node: Position) -> DeepwildResult<()> {
        let area = self.prepare_area(node)?;
        self.record_entry(node, area);
        Ok(())
    }

    /// The fresh area for the next entry of `node`, or `None` when the
    /// cached one is reused.
    fn prepare_area(&self, node: Position) -> DeepwildResult<Option<AreaMap>> {
        if self.areas.contains_key(&node) && !self.config.regenerate_on_visit {
            debug!("Re-entering cached area {}", node);
            return Ok(None);
        }
        self.generate_area(node, self.visits(node)).map(Some)
    }

    fn record_entry(&mut self, node: Position, area: Option<AreaMap>) {
        *self.visits.entry(node).or_insert(0) += 1;
        if let Some(area) = area {
            self.areas.insert(node, area);
        }
    }

    /// Builds the area of `node`, regenerating solid caves with a fresh
    /// derived seed until `max_map_attempts` is spent.
    fn generate_area(&self, node: Position, visit: u32) -> DeepwildResult<AreaMap> {
        let profile = self.map_profile(node)?;
        let max_attempts = self.config.max_map_attempts;
        let first_attempt = visit.saturating_mul(max_attempts);

        for attempt in 0..max_attempts {
            let seed = derive_area_seed(
                self.config.seed,
                node,
                first_attempt.saturating_add(attempt),
            );
            match AreaMap::generate(node, &profile, &self.config, seed) {
                Ok(area) => {
                    debug!(
                        "Generated area {} ({}) with {} floor cells and {} enemies",
                        node,
                        profile.enemy_type.name(),
                        area.grid.floor_count(),
                        area.enemy_count()
                    );
                    return Ok(area);
                }
                Err(DeepwildError::NoFloorFound) => {
                    warn!(
                        "Area {} attempt {} has no floor, regenerating",
                        node,
                        attempt + 1
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(DeepwildError::GenerationExhausted {
            attempts: max_attempts,
            reason: format!("area {} never produced a floor cell", node),
        })
    }
}

/// Applies the goal policy. Ties go to the smaller coordinate; a lone
/// starting node never becomes its own goal.
fn pick_goal(overworld: &OverworldGraph, policy: GoalPolicy) -> Option<Position> {
    match policy {
        GoalPolicy::None => None,
        GoalPolicy::FarthestFromStart => overworld
            .hop_distances(overworld.current_node())
            .into_iter()
            .filter(|(_, hops)| *hops > 0)
            .fold(None, |best: Option<(Position, usize)>, (node, hops)| match best {
                Some((_, best_hops)) if best_hops >= hops => best,
                _ => Some((node, hops)),
            })
            .map(|(node, _)| node),
    }
}
