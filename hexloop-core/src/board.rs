//! Hex board geometry with offset (row, column) coordinates
//!
//! Rows are stacked with every odd row shifted half a cell to the right, so
//! the two diagonal neighbors of a cell depend on the parity of its row.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Board coordinate. Serializes as a `[row, col]` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Step one cell in a direction, ignoring board bounds
    pub fn step(self, direction: Direction) -> Coord {
        let parity = self.row.rem_euclid(2);
        // Column offsets of the left/right diagonal pair for this row
        let vert_left = parity - 1;
        let vert_right = parity;
        let (dr, dc) = match direction {
            Direction::Right => (0, 1),
            Direction::BottomRight => (-1, vert_right),
            Direction::BottomLeft => (-1, vert_left),
            Direction::Left => (0, -1),
            Direction::TopLeft => (1, vert_left),
            Direction::TopRight => (1, vert_right),
        };
        Coord::new(self.row + dr, self.col + dc)
    }
}

impl From<[i32; 2]> for Coord {
    fn from([row, col]: [i32; 2]) -> Self {
        Coord::new(row, col)
    }
}

impl From<Coord> for [i32; 2] {
    fn from(coord: Coord) -> Self {
        [coord.row, coord.col]
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the six neighbor directions, in clockwise order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Right = 0,
    BottomRight = 1,
    BottomLeft = 2,
    Left = 3,
    TopLeft = 4,
    TopRight = 5,
}

/// All directions by index
pub const DIRECTIONS: [Direction; 6] = [
    Direction::Right,
    Direction::BottomRight,
    Direction::BottomLeft,
    Direction::Left,
    Direction::TopLeft,
    Direction::TopRight,
];

impl Direction {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction for an index, wrapping modulo 6
    pub fn from_index(index: i32) -> Direction {
        DIRECTIONS[index.rem_euclid(6) as usize]
    }

    /// Rotate clockwise by `steps` (negative rotates counterclockwise)
    pub fn cycle(self, steps: i32) -> Direction {
        Direction::from_index(self as i32 + steps)
    }

    pub fn opposite(self) -> Direction {
        self.cycle(3)
    }

    pub fn is_top(self) -> bool {
        matches!(self, Direction::TopLeft | Direction::TopRight)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Direction::BottomLeft | Direction::BottomRight)
    }

    pub fn is_left(self) -> bool {
        matches!(self, Direction::Left | Direction::TopLeft | Direction::BottomLeft)
    }
}

/// Rectangular hex grid; cells live in a flat arena indexed by `row * columns + col`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexGrid {
    rows: i32,
    columns: i32,
}

impl HexGrid {
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows: rows as i32,
            columns: columns as i32,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows as u32
    }

    pub fn columns(&self) -> u32 {
        self.columns as u32
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        (self.rows * self.columns) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row >= 0 && coord.row < self.rows && coord.col >= 0 && coord.col < self.columns
    }

    /// Arena index of an in-bounds coordinate
    pub fn index(&self, coord: Coord) -> Option<usize> {
        self.contains(coord)
            .then(|| (coord.row * self.columns + coord.col) as usize)
    }

    /// Coordinate of an arena index
    pub fn coord(&self, index: usize) -> Coord {
        let index = index as i32;
        Coord::new(index / self.columns, index % self.columns)
    }

    /// Iterate every cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.len()).map(move |i| self.coord(i))
    }

    /// Neighbor in a direction, `None` past the board edge
    pub fn neighbor(&self, coord: Coord, direction: Direction) -> Option<Coord> {
        let next = coord.step(direction);
        self.contains(next).then_some(next)
    }

    /// All six neighbor slots, indexed by direction
    pub fn neighbors(&self, coord: Coord) -> [Option<Coord>; 6] {
        DIRECTIONS.map(|d| self.neighbor(coord, d))
    }

    /// Direction leading from `from` to the adjacent cell `to`
    pub fn direction_between(&self, from: Coord, to: Coord) -> Option<Direction> {
        DIRECTIONS.into_iter().find(|&d| from.step(d) == to)
    }
}
