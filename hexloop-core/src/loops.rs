//! Loop detection
//!
//! A loop of a color is a region of empty or enemy-held cells that the color's
//! pieces wall off completely. Regions are found by flood fill over the six
//! neighbor links; any region whose fill touches the board edge is open.

use serde::Serialize;

use crate::board::Coord;
use crate::pieces::Color;
use crate::state::BoardState;

/// Loop count per color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoopCounts {
    pub white: usize,
    pub black: usize,
}

impl LoopCounts {
    pub fn get(&self, color: Color) -> usize {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// Count the enclosed regions walled off by `color`
pub fn count_loops(board: &BoardState, color: Color) -> usize {
    let grid = board.grid();
    let open = |cell: Coord| board.color_at(cell) != Some(color);
    let mut visited = vec![false; grid.len()];
    let mut stack: Vec<Coord> = Vec::new();
    let mut loops = 0;

    for (seed_index, seed) in grid.cells().enumerate() {
        if visited[seed_index] || !open(seed) {
            continue;
        }
        visited[seed_index] = true;
        stack.push(seed);
        let mut enclosed = true;

        while let Some(cell) = stack.pop() {
            for slot in grid.neighbors(cell) {
                let Some(next) = slot else {
                    enclosed = false;
                    continue;
                };
                let Some(i) = grid.index(next) else {
                    continue;
                };
                if !visited[i] && open(next) {
                    visited[i] = true;
                    stack.push(next);
                }
            }
        }

        if enclosed {
            loops += 1;
        }
    }
    loops
}

/// Loop counts of both colors
pub fn scan(board: &BoardState) -> LoopCounts {
    LoopCounts {
        white: count_loops(board, Color::White),
        black: count_loops(board, Color::Black),
    }
}

/// Remembers the last scan so that only newly closed loops pay out
#[derive(Clone, Debug, Default)]
pub struct LoopDetector {
    previous: LoopCounts,
}

impl LoopDetector {
    /// Start from the loops already present on `board`.
    ///
    /// The baseline is the starting position, not zero: enclosures a layout
    /// begins with never pay out, only loops closed during play do.
    pub fn new(board: &BoardState) -> Self {
        Self {
            previous: scan(board),
        }
    }

    pub fn previous(&self) -> LoopCounts {
        self.previous
    }

    /// Rescan after a move and return the extra moves `active` earned,
    /// clamped to `[0, cap]`. Both colors' counts are remembered.
    pub fn bonus_moves(&mut self, board: &BoardState, active: Color, cap: u32) -> u32 {
        let current = scan(board);
        let gained = current.get(active).saturating_sub(self.previous.get(active));
        tracing::debug!(
            "loops: white {} -> {}, black {} -> {}",
            self.previous.white,
            current.white,
            self.previous.black,
            current.black
        );
        self.previous = current;
        (gained as u32).min(cap)
    }
}
