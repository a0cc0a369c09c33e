//! # Generation Module
//!
//! Procedural content generation for area caves, the overworld graph and
//! the enemy packs placed inside each area.
//!
//! Every generator draws from an explicit seeded [`StdRng`] and nothing
//! else, so a configuration plus a seed fully determines its output.

pub mod background;
pub mod caves;
pub mod encounters;
pub mod graph;

pub use caves::*;
pub use encounters::*;
pub use graph::*;

use crate::config::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, DEFAULT_MAX_MAP_ATTEMPTS};
use crate::{DeepwildError, DeepwildResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the world layer picks the goal node once the overworld exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GoalPolicy {
    /// No node is flagged as the goal
    #[default]
    None,
    /// The node with the most hops from the starting node
    FarthestFromStart,
}

/// Configuration for a whole generated world.
///
/// Aggregates the tuning of each generator together with the world seed and
/// the policies the world layer applies on top of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Area map width in cells
    pub map_width: u32,
    /// Area map height in cells
    pub map_height: u32,
    /// Cave generator tuning
    pub cave: CaveParams,
    /// Overworld generator tuning
    pub overworld: OverworldParams,
    /// Spawn and enemy pack placement
    pub spawn: SpawnParams,
    /// Goal node selection
    pub goal_policy: GoalPolicy,
    /// Build a fresh cave on every visit instead of caching one per node
    pub regenerate_on_visit: bool,
    /// Cave regenerations allowed when an area comes out without floor
    pub max_map_attempts: u32,
}

impl GenerationConfig {
    /// Creates the default configuration for a seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use deepwild::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
            cave: CaveParams::default(),
            overworld: OverworldParams::default(),
            spawn: SpawnParams::default(),
            goal_policy: GoalPolicy::None,
            regenerate_on_visit: false,
            max_map_attempts: DEFAULT_MAX_MAP_ATTEMPTS,
        }
    }

    /// Creates a configuration for testing with smaller, faster worlds.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            map_width: 30,
            map_height: 20,
            cave: CaveParams {
                iterations: 4000,
                ..CaveParams::default()
            },
            overworld: OverworldParams {
                grid_width: 10,
                grid_height: 8,
                ..OverworldParams::default()
            },
            spawn: SpawnParams {
                safe_spawn_dist: 6.0,
                cluster_dist: 8.0,
                pack_size: 2,
            },
            goal_policy: GoalPolicy::FarthestFromStart,
            regenerate_on_visit: false,
            max_map_attempts: DEFAULT_MAX_MAP_ATTEMPTS,
        }
    }

    /// Parses a configuration from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> DeepwildResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> DeepwildResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialises the configuration as pretty JSON.
    pub fn to_json(&self) -> DeepwildResult<String> {
        serde_json::to_string_pretty(self).map_err(DeepwildError::from)
    }

    /// Checks every section for parameters that can never generate.
    pub fn validate(&self) -> DeepwildResult<()> {
        self.cave.validate(self.map_width, self.map_height)?;
        self.overworld.validate()?;
        self.spawn.validate()?;
        if self.max_map_attempts == 0 {
            return Err(DeepwildError::InvalidParameters(
                "max_map_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
///
/// All generators in Deepwild implement this trait, giving the world layer
/// one consistent interface for building and checking content.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DeepwildResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DeepwildResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Creates a seeded random number generator from a raw seed.
    pub fn rng_from_seed(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Checks that a probability lies in `[0, 1]`.
    pub fn check_probability(name: &str, value: f64) -> DeepwildResult<()> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(DeepwildError::InvalidParameters(format!(
                "{} must be within [0, 1], got {}",
                name, value
            )))
        }
    }
}
