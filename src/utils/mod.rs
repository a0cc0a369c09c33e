//! # Utilities Module
//!
//! Seed mixing and search helpers shared by the generators and the world layer.

pub mod math;
pub mod pathfinding;

pub use self::math::*;
pub use self::pathfinding::*;
