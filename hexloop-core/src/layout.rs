//! BoardLayout - board size, objective hexes and starting pieces
//!
//! A layout may be fully specified, or leave the seed and placement lists out
//! and have them generated: everything is drawn on White's half and mirrored
//! onto Black's half, so both sides start from the same shape.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Coord, HexGrid};
use crate::error::{BoardError, LayoutError};
use crate::pieces::Color;
use crate::state::BoardState;

/// One starting stack
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiecePlacement {
    pub position: Coord,
    /// Pieces stacked above the first one
    #[serde(default)]
    pub stacked: u32,
    pub white: bool,
}

impl PiecePlacement {
    pub fn new(position: Coord, color: Color, stacked: u32) -> Self {
        Self {
            position,
            stacked,
            white: color == Color::White,
        }
    }

    pub fn color(&self) -> Color {
        if self.white {
            Color::White
        } else {
            Color::Black
        }
    }
}

/// Layout descriptor consumed at match start
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardLayout {
    pub rows: u32,
    pub columns: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_hex_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_hexes: Option<Vec<Coord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pieces: Option<Vec<PiecePlacement>>,
}

/// Objective hexes per side when a layout does not say
pub const STANDARD_OBJECTIVE_HEX_NUM: u32 = 3;
/// Pieces per side when a layout does not say
pub const STANDARD_PIECE_NUM: u32 = 6;
/// Largest accepted row or column count
pub const MAX_BOARD_SIDE: u32 = 1024;
/// Largest accepted `stacked` value of a placement
pub const MAX_STACKED: u32 = 64;

impl BoardLayout {
    /// Generated layout of the given size
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows,
            columns,
            seed: None,
            objective_hex_num: None,
            objective_hexes: None,
            piece_num: None,
            pieces: None,
        }
    }

    /// Standard 10x6 board
    pub fn standard() -> Self {
        Self::new(10, 6)
    }

    /// Hand-built layout with no objectives or pieces yet
    pub fn empty(rows: u32, columns: u32) -> Self {
        Self {
            seed: Some(0),
            objective_hexes: Some(Vec::new()),
            pieces: Some(Vec::new()),
            ..Self::new(rows, columns)
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_piece(mut self, row: i32, col: i32, color: Color, stacked: u32) -> Self {
        self.pieces
            .get_or_insert_with(Vec::new)
            .push(PiecePlacement::new(Coord::new(row, col), color, stacked));
        self
    }

    pub fn with_objective(mut self, row: i32, col: i32) -> Self {
        self.objective_hexes
            .get_or_insert_with(Vec::new)
            .push(Coord::new(row, col));
        self
    }

    pub fn grid(&self) -> HexGrid {
        HexGrid::new(self.rows, self.columns)
    }

    /// Rows making up one side, not counting a neutral middle row
    pub fn half_board(&self) -> u32 {
        self.rows / 2
    }

    /// The color that wins by occupying an objective hex in this row.
    ///
    /// Objective hexes on White's home half belong to Black and vice versa.
    pub fn objective_owner(&self, row: i32) -> Color {
        if row < self.half_board() as i32 {
            Color::Black
        } else {
            Color::White
        }
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path).map_err(|e| LayoutError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> Result<(), LayoutError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Fill in everything left unspecified and validate the result.
    ///
    /// A missing seed is drawn from entropy; the returned layout always has a
    /// seed, so saving it reproduces the same match.
    pub fn resolve(&self) -> Result<BoardLayout, LayoutError> {
        self.check_size()?;

        let seed = self.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let half_cells = self.half_board() * self.columns;

        let objective_hexes = match &self.objective_hexes {
            Some(hexes) => hexes.clone(),
            None => {
                let num = self.objective_hex_num.unwrap_or(STANDARD_OBJECTIVE_HEX_NUM);
                check_fits("objective hexes", num, half_cells)?;
                let white_half = self.draw_half_cells(&mut rng, num);
                let mirrored = white_half.iter().map(|&c| self.mirror(c)).collect::<Vec<_>>();
                white_half.into_iter().chain(mirrored).collect()
            }
        };

        let pieces = match &self.pieces {
            Some(pieces) => pieces.clone(),
            None => {
                let num = self.piece_num.unwrap_or(STANDARD_PIECE_NUM);
                check_fits("pieces", num, half_cells)?;
                let white_half = self.draw_half_cells(&mut rng, num);
                let mut pieces = Vec::with_capacity(white_half.len() * 2);
                for &pos in &white_half {
                    pieces.push(PiecePlacement::new(pos, Color::White, 0));
                    pieces.push(PiecePlacement::new(self.mirror(pos), Color::Black, 0));
                }
                pieces
            }
        };

        let resolved = BoardLayout {
            rows: self.rows,
            columns: self.columns,
            seed: Some(seed),
            objective_hex_num: Some(self.objective_hex_num.unwrap_or(objective_hexes.len() as u32 / 2)),
            objective_hexes: Some(objective_hexes),
            piece_num: Some(self.piece_num.unwrap_or(pieces.len() as u32 / 2)),
            pieces: Some(pieces),
        };
        resolved.validate()?;
        Ok(resolved)
    }

    /// Build the starting board. Unresolved layouts are resolved first.
    pub fn build_board(&self) -> Result<BoardState, LayoutError> {
        let layout = self.resolve()?;
        let mut board = BoardState::new(layout.grid());

        for &coord in layout.objective_hexes.iter().flatten() {
            board
                .set_objective(coord, layout.objective_owner(coord.row))
                .map_err(|e| layout.board_error("objective hex", e))?;
        }

        for placement in layout.pieces.iter().flatten() {
            for _ in 0..=placement.stacked {
                board
                    .place_piece(placement.position, placement.color())
                    .map_err(|e| layout.board_error("piece", e))?;
            }
        }

        Ok(board)
    }

    /// Board dimensions must fit the grid's `i32` arithmetic
    fn check_size(&self) -> Result<(), LayoutError> {
        let invalid = LayoutError::InvalidSize {
            rows: self.rows,
            columns: self.columns,
        };
        let side_ok = |side: u32| (1..=MAX_BOARD_SIDE).contains(&side);
        if !side_ok(self.rows) || !side_ok(self.columns) {
            return Err(invalid);
        }
        match (self.rows as i32).checked_mul(self.columns as i32) {
            Some(_) => Ok(()),
            None => Err(invalid),
        }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        self.check_size()?;
        let grid = self.grid();
        for &coord in self.objective_hexes.iter().flatten() {
            if !grid.contains(coord) {
                return Err(self.out_of_bounds("objective hex", coord));
            }
        }

        let mut seen = rustc_hash::FxHashSet::default();
        for placement in self.pieces.iter().flatten() {
            if !grid.contains(placement.position) {
                return Err(self.out_of_bounds("piece", placement.position));
            }
            if !seen.insert(placement.position) {
                return Err(LayoutError::DuplicatePiece(placement.position));
            }
            if placement.stacked > MAX_STACKED {
                return Err(LayoutError::StackTooTall {
                    coord: placement.position,
                    stacked: placement.stacked,
                });
            }
        }
        Ok(())
    }

    /// `num` distinct cells on White's half
    fn draw_half_cells(&self, rng: &mut ChaCha8Rng, num: u32) -> Vec<Coord> {
        let mut cells: Vec<Coord> = Vec::with_capacity(num as usize);
        while cells.len() < num as usize {
            let coord = Coord::new(
                rng.gen_range(0..self.half_board()) as i32,
                rng.gen_range(0..self.columns) as i32,
            );
            if !cells.contains(&coord) {
                cells.push(coord);
            }
        }
        cells
    }

    fn mirror(&self, coord: Coord) -> Coord {
        Coord::new(self.rows as i32 - 1 - coord.row, coord.col)
    }

    fn out_of_bounds(&self, what: &'static str, coord: Coord) -> LayoutError {
        LayoutError::OutOfBounds {
            what,
            coord,
            rows: self.rows,
            columns: self.columns,
        }
    }

    fn board_error(&self, what: &'static str, err: BoardError) -> LayoutError {
        match err {
            BoardError::OutOfBounds(coord) => self.out_of_bounds(what, coord),
            BoardError::EmptyCell(coord) | BoardError::MixedStack(coord) => {
                LayoutError::DuplicatePiece(coord)
            }
        }
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::standard()
    }
}

fn check_fits(what: &'static str, requested: u32, available: u32) -> Result<(), LayoutError> {
    if requested > available {
        return Err(LayoutError::TooMany {
            what,
            requested,
            available,
        });
    }
    Ok(())
}
