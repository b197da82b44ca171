//! Board contents: piece stacks, objective hexes and spatial queries

use crate::board::{Coord, Direction, HexGrid, DIRECTIONS};
use crate::error::BoardError;
use crate::pieces::{Color, PieceId, PieceStack};

/// How a moving piece may treat a cell.
///
/// Ordered from worst to best, so the worst status of a group is its minimum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PositionStatus {
    /// Friendly piece or enemy stack
    Blocked,
    /// Enemy single piece
    Capturable,
    /// Empty
    Free,
}

/// Same-color runs outward from a cell, one per direction.
///
/// Every run starts with the source cell itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lines {
    runs: [Vec<Coord>; 6],
}

impl Lines {
    pub fn get(&self, direction: Direction) -> &[Coord] {
        &self.runs[direction.index()]
    }

    /// Run length in a direction, counting the source cell
    pub fn len(&self, direction: Direction) -> usize {
        self.runs[direction.index()].len()
    }

    /// Directions in which the source sits at the terminal end of a run:
    /// nothing beyond it that way, a run of at least two the opposite way.
    pub fn free_ends(&self) -> Vec<Direction> {
        DIRECTIONS
            .into_iter()
            .filter(|&d| self.len(d) == 1 && self.len(d.opposite()) > 1)
            .collect()
    }

    /// Directions holding a run longer than the source alone
    pub fn line_directions(&self) -> Vec<Direction> {
        DIRECTIONS
            .into_iter()
            .filter(|&d| self.len(d) > 1)
            .collect()
    }
}

/// Mutable board: the only state that changes during play besides turn counters
#[derive(Clone, Debug)]
pub struct BoardState {
    grid: HexGrid,
    cells: Vec<Option<PieceStack>>,
    objectives: Vec<Option<Color>>,
    next_piece: u32,
}

impl BoardState {
    pub fn new(grid: HexGrid) -> Self {
        Self {
            grid,
            cells: vec![None; grid.len()],
            objectives: vec![None; grid.len()],
            next_piece: 0,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn stack_at(&self, coord: Coord) -> Option<&PieceStack> {
        self.grid
            .index(coord)
            .and_then(|i| self.cells[i].as_ref())
    }

    pub fn color_at(&self, coord: Coord) -> Option<Color> {
        self.stack_at(coord).map(PieceStack::color)
    }

    pub fn height_at(&self, coord: Coord) -> usize {
        self.stack_at(coord).map_or(0, PieceStack::height)
    }

    pub fn is_occupied(&self, coord: Coord) -> bool {
        self.stack_at(coord).is_some()
    }

    /// Color whose win condition counts this cell
    pub fn objective_at(&self, coord: Coord) -> Option<Color> {
        self.grid.index(coord).and_then(|i| self.objectives[i])
    }

    /// Iterate occupied cells with their stacks
    pub fn stacks(&self) -> impl Iterator<Item = (Coord, &PieceStack)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, cell)| cell.as_ref().map(|s| (self.grid.coord(i), s)))
    }

    pub fn empty_cells(&self) -> Vec<Coord> {
        self.grid
            .cells()
            .filter(|&c| !self.is_occupied(c))
            .collect()
    }

    /// Number of pieces (not stacks) a color has on the board
    pub fn piece_count(&self, color: Color) -> usize {
        self.stacks()
            .filter(|(_, s)| s.color() == color)
            .map(|(_, s)| s.height())
            .sum()
    }

    pub fn objective_count(&self, color: Color) -> usize {
        self.objectives.iter().filter(|&&o| o == Some(color)).count()
    }

    /// Objective hexes of `color` currently occupied by `color`
    pub fn occupied_objectives(&self, color: Color) -> usize {
        self.grid
            .cells()
            .filter(|&c| self.objective_at(c) == Some(color) && self.color_at(c) == Some(color))
            .count()
    }

    // ========================================================================
    // SPATIAL QUERIES
    // ========================================================================

    /// How the piece standing on `mover` may treat `target`.
    ///
    /// A piece never blocks itself: the mover's own cell reports `Free`.
    pub fn position_status(&self, target: Coord, mover: Coord) -> PositionStatus {
        if target == mover {
            return PositionStatus::Free;
        }
        match self.color_at(mover) {
            Some(color) => self.status_for(target, color),
            None if self.is_occupied(target) => PositionStatus::Blocked,
            None => PositionStatus::Free,
        }
    }

    /// How a piece of `color` may treat `target`
    pub fn status_for(&self, target: Coord, color: Color) -> PositionStatus {
        match self.stack_at(target) {
            None => PositionStatus::Free,
            Some(occupant) if occupant.color() != color && !occupant.is_stacked() => {
                PositionStatus::Capturable
            }
            Some(_) => PositionStatus::Blocked,
        }
    }

    /// Same-color runs outward from `coord` in all six directions
    pub fn find_lines(&self, coord: Coord) -> Lines {
        let color = self.color_at(coord);
        let runs = DIRECTIONS.map(|d| {
            let mut run = vec![coord];
            let mut current = coord;
            if color.is_some() {
                while let Some(next) = self.grid.neighbor(current, d) {
                    if self.color_at(next) != color {
                        break;
                    }
                    run.push(next);
                    current = next;
                }
            }
            run
        });
        Lines { runs }
    }

    /// Occupied neighbor cells, in direction order
    pub fn adjacent_pieces(&self, coord: Coord) -> Vec<Coord> {
        self.grid
            .neighbors(coord)
            .into_iter()
            .flatten()
            .filter(|&c| self.is_occupied(c))
            .collect()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub fn set_objective(&mut self, coord: Coord, color: Color) -> Result<(), BoardError> {
        let i = self.index(coord)?;
        self.objectives[i] = Some(color);
        Ok(())
    }

    /// Create a new piece on an empty cell or on top of a same-color stack
    pub fn place_piece(&mut self, coord: Coord, color: Color) -> Result<PieceId, BoardError> {
        let i = self.index(coord)?;
        if matches!(&self.cells[i], Some(s) if s.color() != color) {
            return Err(BoardError::MixedStack(coord));
        }
        let id = PieceId(self.next_piece);
        self.next_piece += 1;
        match &mut self.cells[i] {
            Some(stack) => stack.push(id),
            slot => *slot = Some(PieceStack::new(color, id)),
        }
        Ok(id)
    }

    /// Remove the top piece of a cell's stack, clearing the cell if it was the last
    pub fn remove_piece(&mut self, coord: Coord) -> Result<PieceId, BoardError> {
        let i = self.index(coord)?;
        let stack = self.cells[i].as_mut().ok_or(BoardError::EmptyCell(coord))?;
        let piece = stack.pop_top().ok_or(BoardError::EmptyCell(coord))?;
        if stack.height() == 0 {
            self.cells[i] = None;
        }
        Ok(piece)
    }

    /// Lift a whole stack off the board
    pub fn take_stack(&mut self, coord: Coord) -> Result<PieceStack, BoardError> {
        let i = self.index(coord)?;
        self.cells[i].take().ok_or(BoardError::EmptyCell(coord))
    }

    /// Set a stack down, merging it on top of a same-color stack already there
    pub fn put_stack(&mut self, coord: Coord, stack: PieceStack) -> Result<(), BoardError> {
        let i = self.index(coord)?;
        match &mut self.cells[i] {
            Some(existing) if existing.color() != stack.color() => Err(BoardError::MixedStack(coord)),
            Some(existing) => {
                existing.push_stack(stack);
                Ok(())
            }
            slot => {
                *slot = Some(stack);
                Ok(())
            }
        }
    }

    /// Move a whole stack, merging with a friendly stack at the destination
    pub fn move_stack(&mut self, from: Coord, to: Coord) -> Result<(), BoardError> {
        if from == to {
            return Ok(());
        }
        let color = self.color_at(from).ok_or(BoardError::EmptyCell(from))?;
        self.index(to)?;
        if self.color_at(to).is_some_and(|c| c != color) {
            return Err(BoardError::MixedStack(to));
        }
        let stack = self.take_stack(from)?;
        self.put_stack(to, stack)
    }

    fn index(&self, coord: Coord) -> Result<usize, BoardError> {
        self.grid.index(coord).ok_or(BoardError::OutOfBounds(coord))
    }
}
