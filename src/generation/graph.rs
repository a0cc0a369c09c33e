//! # Overworld Graph Generation
//!
//! Randomized geometric graph construction for the overworld.
//!
//! Nodes are placed greedily on a shuffled grid with a minimum spacing, fully
//! connected with distance-weighted edges, then thinned by probabilistic
//! pruning that never strips an endpoint below a minimum degree. A pruned
//! graph that falls apart is thrown away and generation restarts from
//! scratch, up to an attempt budget.

use crate::config::{DEFAULT_MAX_GRAPH_ATTEMPTS, DEFAULT_OVERWORLD_HEIGHT, DEFAULT_OVERWORLD_WIDTH};
use crate::{
    DeepwildError, DeepwildResult, EnemyType, GenerationConfig, Generator, NodeAttrs,
    OverworldEdge, OverworldGraph, Position,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::utils::rng_from_seed;

/// Tuning for the overworld generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverworldParams {
    /// Candidate grid width; nodes sit on interior coordinates only
    pub grid_width: u32,
    /// Candidate grid height
    pub grid_height: u32,
    /// Minimum Euclidean distance between two nodes
    pub min_node_distance: f64,
    /// Constant part of an edge's keep probability
    pub base_prune_chance: f64,
    /// Scales `min_node_distance / weight` in an edge's keep probability
    pub prune_length_bonus: f64,
    /// Degree both endpoints must still have after a pruned edge is removed
    pub min_degree: usize,
    /// Full regenerations allowed before reporting exhaustion
    pub max_attempts: u32,
}

impl Default for OverworldParams {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_OVERWORLD_WIDTH,
            grid_height: DEFAULT_OVERWORLD_HEIGHT,
            min_node_distance: 4.0,
            base_prune_chance: 0.1,
            prune_length_bonus: 0.3,
            min_degree: 1,
            max_attempts: DEFAULT_MAX_GRAPH_ATTEMPTS,
        }
    }
}

impl OverworldParams {
    /// Rejects parameters that cannot place at least two nodes.
    pub fn validate(&self) -> DeepwildResult<()> {
        if self.grid_width < 3 || self.grid_height < 3 {
            return Err(DeepwildError::InvalidParameters(format!(
                "Overworld grid must be at least 3x3, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if !self.min_node_distance.is_finite() || self.min_node_distance <= 0.0 {
            return Err(DeepwildError::InvalidParameters(format!(
                "min_node_distance must be positive, got {}",
                self.min_node_distance
            )));
        }
        let span_x = (self.grid_width - 3) as f64;
        let span_y = (self.grid_height - 3) as f64;
        let widest = (span_x * span_x + span_y * span_y).sqrt();
        if self.min_node_distance > widest {
            return Err(DeepwildError::InvalidParameters(format!(
                "min_node_distance {} leaves room for a single node on a {}x{} grid",
                self.min_node_distance, self.grid_width, self.grid_height
            )));
        }
        if !self.base_prune_chance.is_finite() || !self.prune_length_bonus.is_finite() {
            return Err(DeepwildError::InvalidParameters(
                "Pruning parameters must be finite".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(DeepwildError::InvalidParameters(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decides how likely an edge is to survive pruning.
///
/// An edge becomes a prune candidate when its keep probability is below a
/// uniform roll in `[0, 1)`. `attempt` counts full regenerations from 1.
pub trait PrunePolicy {
    fn keep_probability(&self, edge: &OverworldEdge, params: &OverworldParams, attempt: u32) -> f64;
}

/// `base_prune_chance + prune_length_bonus × min_node_distance / weight`.
///
/// Longer edges get a smaller bonus and are pruned more often.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthBonusPolicy;

impl PrunePolicy for LengthBonusPolicy {
    fn keep_probability(&self, edge: &OverworldEdge, params: &OverworldParams, _attempt: u32) -> f64 {
        params.base_prune_chance + params.prune_length_bonus * params.min_node_distance / edge.weight
    }
}

impl<F> PrunePolicy for F
where
    F: Fn(&OverworldEdge, &OverworldParams, u32) -> f64,
{
    fn keep_probability(&self, edge: &OverworldEdge, params: &OverworldParams, attempt: u32) -> f64 {
        self(edge, params, attempt)
    }
}

/// Statistics from one successful overworld generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    /// Full generation attempts used, the successful one included
    pub attempts: u32,
    /// Prune candidates drawn in the successful attempt
    pub prune_candidates: usize,
    /// Edges actually removed in the successful attempt
    pub pruned: usize,
}

struct Candidate {
    graph: OverworldGraph,
    prune_candidates: usize,
    pruned: usize,
}

/// Overworld graph generator.
#[derive(Debug, Clone, Default)]
pub struct OverworldGraphGenerator<P = LengthBonusPolicy> {
    policy: P,
}

impl OverworldGraphGenerator<LengthBonusPolicy> {
    /// Creates a generator using the length-bonus pruning formula.
    pub fn new() -> Self {
        Self {
            policy: LengthBonusPolicy,
        }
    }
}

impl<P: PrunePolicy> OverworldGraphGenerator<P> {
    /// Creates a generator with a custom pruning policy.
    pub fn with_policy(policy: P) -> Self {
        Self { policy }
    }

    /// Generates a connected overworld.
    pub fn generate_graph(
        &self,
        params: &OverworldParams,
        rng: &mut StdRng,
    ) -> DeepwildResult<OverworldGraph> {
        self.generate_with_report(params, rng).map(|(graph, _)| graph)
    }

    /// Generates a connected overworld and reports how many attempts it took.
    ///
    /// The traveller starts on a uniformly chosen node, which is visited and
    /// discovered together with its neighbours.
    #[cfg_attr(feature = "dev-tools", tracing::instrument(skip(self, rng)))]
    pub fn generate_with_report(
        &self,
        params: &OverworldParams,
        rng: &mut StdRng,
    ) -> DeepwildResult<(OverworldGraph, GenerationReport)> {
        params.validate()?;

        for attempt in 1..=params.max_attempts {
            let candidate = self.build_candidate(params, rng, attempt)?;
            if !candidate.graph.is_connected() {
                warn!(
                    "Overworld attempt {} is disconnected ({} nodes, {} edges), regenerating",
                    attempt,
                    candidate.graph.node_count(),
                    candidate.graph.edge_count()
                );
                continue;
            }

            let mut graph = candidate.graph;
            let nodes: Vec<Position> = graph.nodes().collect();
            let start = *nodes
                .choose(rng)
                .ok_or_else(|| DeepwildError::InvalidState("Overworld has no nodes".to_string()))?;
            graph.start_at(start)?;

            info!(
                "Generated overworld after {} attempt(s): {} nodes, {} edges, start {}",
                attempt,
                graph.node_count(),
                graph.edge_count(),
                start
            );
            let report = GenerationReport {
                attempts: attempt,
                prune_candidates: candidate.prune_candidates,
                pruned: candidate.pruned,
            };
            return Ok((graph, report));
        }

        Err(DeepwildError::GenerationExhausted {
            attempts: params.max_attempts,
            reason: "every pruned overworld graph was disconnected".to_string(),
        })
    }

    /// Runs one full placement, wiring and pruning pass.
    fn build_candidate(
        &self,
        params: &OverworldParams,
        rng: &mut StdRng,
        attempt: u32,
    ) -> DeepwildResult<Candidate> {
        let nodes = place_nodes(params, rng);

        let mut adjacency: Vec<BTreeSet<usize>> = (0..nodes.len())
            .map(|i| (0..nodes.len()).filter(|&j| j != i).collect())
            .collect();

        let mut prune_targets: Vec<(usize, usize)> = Vec::new();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let edge = OverworldEdge::between(nodes[i], nodes[j]);
                if self.policy.keep_probability(&edge, params, attempt) < rng.gen::<f64>() {
                    prune_targets.push((i, j));
                }
            }
        }
        let prune_candidates = prune_targets.len();

        prune_targets.shuffle(rng);
        let mut pruned = 0_usize;
        for (i, j) in prune_targets {
            if adjacency[i].len() > params.min_degree && adjacency[j].len() > params.min_degree {
                adjacency[i].remove(&j);
                adjacency[j].remove(&i);
                pruned += 1;
            }
        }
        debug!(
            "Overworld attempt {}: {} nodes, {} prune candidates, {} pruned",
            attempt,
            nodes.len(),
            prune_candidates,
            pruned
        );

        let edges: Vec<(Position, Position)> = adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, set)| {
                set.iter()
                    .filter(move |&&j| i < j)
                    .map(move |&j| (i, j))
            })
            .map(|(i, j)| (nodes[i], nodes[j]))
            .collect();
        let attributed: Vec<(Position, NodeAttrs)> = nodes
            .iter()
            .enumerate()
            .map(|(index, pos)| (*pos, NodeAttrs::new(EnemyType::for_index(index))))
            .collect();

        Ok(Candidate {
            graph: OverworldGraph::from_parts(attributed, edges)?,
            prune_candidates,
            pruned,
        })
    }
}

/// Greedy spaced placement over the shuffled interior coordinates.
///
/// Returns nodes in acceptance order.
fn place_nodes(params: &OverworldParams, rng: &mut StdRng) -> Vec<Position> {
    let mut coords: Vec<Position> = (1..params.grid_width as i32 - 1)
        .flat_map(|x| (1..params.grid_height as i32 - 1).map(move |y| Position::new(x, y)))
        .collect();
    coords.shuffle(rng);

    let mut nodes: Vec<Position> = Vec::new();
    for location in coords {
        if nodes
            .iter()
            .all(|node| location.euclidean_distance(*node) >= params.min_node_distance)
        {
            nodes.push(location);
        }
    }
    nodes
}

impl<P: PrunePolicy> Generator<OverworldGraph> for OverworldGraphGenerator<P> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DeepwildResult<OverworldGraph> {
        self.generate_graph(&config.overworld, rng)
    }

    fn validate(&self, graph: &OverworldGraph, config: &GenerationConfig) -> DeepwildResult<()> {
        if !graph.is_connected() {
            return Err(DeepwildError::InvalidState(
                "Overworld graph is disconnected".to_string(),
            ));
        }
        let nodes: Vec<Position> = graph.nodes().collect();
        for (index, a) in nodes.iter().enumerate() {
            for b in &nodes[index + 1..] {
                if a.euclidean_distance(*b) < config.overworld.min_node_distance {
                    return Err(DeepwildError::InvalidState(format!(
                        "Nodes {} and {} are closer than {}",
                        a, b, config.overworld.min_node_distance
                    )));
                }
            }
        }
        if nodes.len() > 1 {
            if let Some(lonely) = nodes.iter().find(|node| graph.degree(**node) == 0) {
                return Err(DeepwildError::InvalidState(format!(
                    "Node {} has no edges",
                    lonely
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "OverworldGraphGenerator"
    }
}

/// Generates an overworld from a raw seed with default degree and retry limits.
///
/// # Examples
///
/// ```
/// use deepwild::generate_overworld;
///
/// let graph = generate_overworld(10, 8, 4.0, 0.1, 0.3, 7).unwrap();
/// assert!(graph.is_connected());
/// ```
pub fn generate_overworld(
    grid_width: u32,
    grid_height: u32,
    min_node_distance: f64,
    base_prune_chance: f64,
    prune_length_bonus: f64,
    seed: u64,
) -> DeepwildResult<OverworldGraph> {
    let params = OverworldParams {
        grid_width,
        grid_height,
        min_node_distance,
        base_prune_chance,
        prune_length_bonus,
        ..OverworldParams::default()
    };
    let mut rng = rng_from_seed(seed);
    OverworldGraphGenerator::new().generate_graph(&params, &mut rng)
}
