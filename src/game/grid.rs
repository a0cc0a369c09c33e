//! # Tile Grids
//!
//! Wall/floor grids produced by the cave generator, and the floor regions
//! discovered while building them.

use crate::{DeepwildError, DeepwildResult, Position};
use std::collections::BTreeSet;
use std::fmt;

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Wall,
    Floor,
}

impl Cell {
    /// Character used by the ASCII rendering.
    pub fn glyph(self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Floor => '.',
        }
    }
}

/// A maximal 4-connected set of floor cells.
///
/// Cells are kept ordered, so the representative point (the smallest
/// position in column-major order) is stable for a given region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    cells: BTreeSet<Position>,
    anchor: Position,
}

impl Region {
    /// Builds a region from its cells. Returns `None` for an empty set.
    pub fn new(cells: BTreeSet<Position>) -> Option<Self> {
        let anchor = *cells.iter().next()?;
        Some(Self { cells, anchor })
    }

    /// The point used when measuring distances between regions.
    pub fn representative(&self) -> Position {
        self.anchor
    }

    /// Number of cells in the region.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Regions built through [`Region::new`] are never empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }
}

/// A `width × height` grid of walls and floors.
///
/// Coordinates outside the grid read as walls. The border ring of a
/// generated grid is always wall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    cells: Vec<Cell>,
    regions: Vec<Region>,
}

impl TileGrid {
    /// Creates a grid filled entirely with walls.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Wall; width as usize * height as usize],
            regions: Vec::new(),
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Checks whether a position lies on the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Checks whether a position lies strictly inside the border ring.
    pub fn is_interior(&self, pos: Position) -> bool {
        pos.x >= 1
            && pos.y >= 1
            && (pos.x as i64) < self.width as i64 - 1
            && (pos.y as i64) < self.height as i64 - 1
    }

    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.index(pos).map(|idx| self.cells[idx])
    }

    /// Sets a cell, failing for positions off the grid.
    pub fn set(&mut self, pos: Position, cell: Cell) -> DeepwildResult<()> {
        let idx = self.index(pos).ok_or_else(|| {
            DeepwildError::InvalidState(format!(
                "Position {} is outside a {}x{} grid",
                pos, self.width, self.height
            ))
        })?;
        self.cells[idx] = cell;
        Ok(())
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.get(Position::new(x, y)) != Some(Cell::Floor)
    }

    pub fn is_floor(&self, x: i32, y: i32) -> bool {
        !self.is_wall(x, y)
    }

    /// Counts walls among the 8 surrounding cells.
    pub fn wall_neighbors(&self, pos: Position) -> usize {
        pos.adjacent_positions()
            .into_iter()
            .filter(|p| self.is_wall(p.x, p.y))
            .count()
    }

    /// Counts walls among the 4 cardinal neighbours.
    pub fn cardinal_wall_neighbors(&self, pos: Position) -> usize {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|p| self.is_wall(p.x, p.y))
            .count()
    }

    /// All positions in column-major scan order (x outer, y inner).
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..width).flat_map(move |x| (0..height).map(move |y| Position::new(x, y)))
    }

    /// Interior positions in column-major scan order.
    pub fn interior_positions(&self) -> impl Iterator<Item = Position> {
        let (width, height) = (self.width as i32, self.height as i32);
        (1..width - 1).flat_map(move |x| (1..height - 1).map(move |y| Position::new(x, y)))
    }

    /// Floor cells in column-major scan order.
    pub fn floor_positions(&self) -> Vec<Position> {
        self.positions()
            .filter(|p| self.is_floor(p.x, p.y))
            .collect()
    }

    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell == Cell::Floor).count()
    }

    /// The first floor cell met in column-major scan order.
    ///
    /// This is where the world layer places the player.
    pub fn first_floor(&self) -> DeepwildResult<Position> {
        self.positions()
            .find(|p| self.is_floor(p.x, p.y))
            .ok_or(DeepwildError::NoFloorFound)
    }

    /// Checks that every cell of the border ring is a wall.
    pub fn border_is_solid(&self) -> bool {
        self.positions()
            .filter(|p| !self.is_interior(*p))
            .all(|p| self.is_wall(p.x, p.y))
    }

    /// The regions retained during generation.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub(crate) fn set_regions(&mut self, regions: Vec<Region>) {
        self.regions = regions;
    }
}

impl fmt::Display for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height as i32 {
            let row: String = (0..self.width as i32)
                .map(|x| self.get(Position::new(x, y)).unwrap_or(Cell::Wall).glyph())
                .collect();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
