//! Maze Generation
//!
//! Occupancy grid plus the recursive-backtracking generator that carves it.
//!
//! The generator works on a step-2 lattice: odd coordinates are rooms, even
//! coordinates between two rooms are the walls that get knocked out. A
//! post-pass opens a few extra walls to add loops.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;

/// Default maze edge length (cells).
pub const DEFAULT_MAZE_SIZE: usize = 23;

/// Chance that an interior wall is considered for opening in the post-pass.
pub const OPENING_CHANCE: f64 = 0.1;

/// Step-2 lattice directions, in the order they are shuffled from.
const CARVE_DIRECTIONS: [(i64, i64); 4] = [(0, -2), (2, 0), (0, 2), (-2, 0)];

/// Maze construction / decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MazeError {
    #[error("maze dimensions must be odd and at least 5, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("map has no rows")]
    Empty,

    #[error("map row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },

    #[error("map cell ({x}, {y}) has unknown value {value}")]
    InvalidCell { x: usize, y: usize, value: u8 },

    #[error("map has no interior floor cell")]
    NoFloor,
}

// =============================================================================
// GRID
// =============================================================================

/// State of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Walkable
    Floor,
    /// Solid
    Wall,
}

impl Cell {
    /// Wire value (`0` floor, `1` wall).
    pub fn to_u8(self) -> u8 {
        match self {
            Cell::Floor => 0,
            Cell::Wall => 1,
        }
    }

    /// Decode a wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Cell::Floor),
            1 => Some(Cell::Wall),
            _ => None,
        }
    }
}

/// Row-major occupancy grid.
///
/// On the wire a grid is an array of rows of `0`/`1` integers (`map[y][x]`).
/// Any decoded grid is rectangular and has at least one interior floor cell,
/// so spawn sampling always terminates.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Grid of the given size filled with one cell state.
    pub fn filled(width: usize, height: usize, cell: Cell) -> Self {
        Self {
            width,
            height,
            cells: vec![cell; width * height],
        }
    }

    /// Build from rows of wire values, validating shape and content.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self, MazeError> {
        let height = rows.len();
        if height == 0 {
            return Err(MazeError::Empty);
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(MazeError::Empty);
        }

        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(MazeError::Ragged {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            for (x, &value) in row.iter().enumerate() {
                let cell = Cell::from_u8(value).ok_or(MazeError::InvalidCell { x, y, value })?;
                cells.push(cell);
            }
        }

        let grid = Self { width, height, cells };
        if !grid.has_interior_floor() {
            return Err(MazeError::NoFloor);
        }
        Ok(grid)
    }

    /// Rows of wire values.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(|c| c.to_u8()).collect())
            .collect()
    }

    /// Width in cells.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at signed coordinates, `None` outside the grid.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x])
    }

    /// Overwrite a cell. Out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    /// True if the cell is inside the grid and walkable.
    #[inline]
    pub fn is_floor(&self, x: i64, y: i64) -> bool {
        self.get(x, y) == Some(Cell::Floor)
    }

    /// True if any non-border cell is floor.
    pub fn has_interior_floor(&self) -> bool {
        if self.width < 3 || self.height < 3 {
            return false;
        }
        (1..self.height - 1)
            .any(|y| (1..self.width - 1).any(|x| self.cells[y * self.width + x] == Cell::Floor))
    }

    /// Count of walkable cells.
    pub fn floor_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Floor).count()
    }

    fn floor_neighbours(&self, x: usize, y: usize) -> usize {
        let (x, y) = (x as i64, y as i64);
        [(0, -1), (1, 0), (0, 1), (-1, 0)]
            .iter()
            .filter(|(dx, dy)| self.is_floor(x + dx, y + dy))
            .count()
    }
}

impl TryFrom<Vec<Vec<u8>>> for Grid {
    type Error = MazeError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<u8>> {
    fn from(grid: Grid) -> Self {
        grid.to_rows()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {}x{}", self.width, self.height)?;
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width) {
            for cell in row {
                f.write_str(match cell {
                    Cell::Wall => "#",
                    Cell::Floor => ".",
                })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// =============================================================================
// GENERATION
// =============================================================================

struct CarveFrame {
    x: i64,
    y: i64,
    directions: [(i64, i64); 4],
    next: usize,
}

impl CarveFrame {
    fn new(x: i64, y: i64, rng: &mut DeterministicRng) -> Self {
        let mut directions = CARVE_DIRECTIONS;
        rng.shuffle(&mut directions);
        Self { x, y, directions, next: 0 }
    }
}

/// Generate a maze of the given odd dimensions.
///
/// Carving starts at (1, 1). The border is always wall and every odd-odd
/// lattice cell is reachable from the start.
pub fn generate(width: usize, height: usize, rng: &mut DeterministicRng) -> Result<Grid, MazeError> {
    if width < 5 || height < 5 || width % 2 == 0 || height % 2 == 0 {
        return Err(MazeError::InvalidDimensions { width, height });
    }

    let mut grid = Grid::filled(width, height, Cell::Wall);
    let (w, h) = (width as i64, height as i64);

    // Depth-first carve with an explicit stack; each cell shuffles its
    // directions once, on first visit.
    grid.set(1, 1, Cell::Floor);
    let mut stack = vec![CarveFrame::new(1, 1, rng)];

    while let Some(frame) = stack.last_mut() {
        if frame.next >= frame.directions.len() {
            stack.pop();
            continue;
        }
        let (dx, dy) = frame.directions[frame.next];
        frame.next += 1;

        let (x, y) = (frame.x, frame.y);
        let (nx, ny) = (x + dx, y + dy);
        if nx > 0 && nx < w - 1 && ny > 0 && ny < h - 1 && grid.get(nx, ny) == Some(Cell::Wall) {
            grid.set((x + dx / 2) as usize, (y + dy / 2) as usize, Cell::Floor);
            grid.set(nx as usize, ny as usize, Cell::Floor);
            stack.push(CarveFrame::new(nx, ny, rng));
        }
    }

    add_openings(&mut grid, rng);

    tracing::debug!(width, height, floor = grid.floor_count(), "maze generated");
    Ok(grid)
}

/// Open random interior walls that already touch two or more floor cells.
///
/// Neighbour counts see openings made earlier in the same pass.
fn add_openings(grid: &mut Grid, rng: &mut DeterministicRng) {
    for y in 1..grid.height - 1 {
        for x in 1..grid.width - 1 {
            if grid.cells[y * grid.width + x] != Cell::Wall {
                continue;
            }
            if rng.chance(OPENING_CHANCE) && grid.floor_neighbours(x, y) >= 2 {
                grid.set(x, y, Cell::Floor);
            }
        }
    }
}

/// Sample a random interior floor cell.
///
/// Rejection sampling over `[1, size - 2]` on both axes. Returns the cell's
/// integer corner as a position.
pub fn find_empty_spot(grid: &Grid, rng: &mut DeterministicRng) -> Vec2 {
    debug_assert!(grid.has_interior_floor(), "grid without interior floor");

    let max_x = grid.width.saturating_sub(2).max(1) as i32;
    let max_y = grid.height.saturating_sub(2).max(1) as i32;
    loop {
        let x = rng.next_int_range(1, max_x);
        let y = rng.next_int_range(1, max_y);
        if grid.is_floor(x as i64, y as i64) {
            return Vec2::new(x as f64, y as f64);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
