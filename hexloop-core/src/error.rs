//! Error types
//!
//! `MoveError` is the player-facing taxonomy: its `Display` text is the
//! advisory message shown when an action is refused. A refused action never
//! changes engine state.

use std::path::PathBuf;

use crate::board::Coord;

/// Structural board mutation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("cell {0} is off the board")]
    OutOfBounds(Coord),

    #[error("cell {0} holds no piece")]
    EmptyCell(Coord),

    #[error("cell {0} holds a stack of the other color")]
    MixedStack(Coord),
}

/// Refused player actions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// Nothing or the wrong number of pieces selected for the pattern
    #[error("{0}")]
    InvalidSelection(&'static str),

    /// The selection does not satisfy the pattern's shape rules
    #[error("{0}")]
    IllegalPattern(&'static str),

    #[error("There are not enough empty hexes")]
    NotEnoughEmpty,

    #[error("{0} is not a highlighted target")]
    NotATarget(Coord),

    #[error("No movement option chosen")]
    NoPattern,

    #[error("Wait for the current move to finish")]
    Busy,

    #[error("The match is over")]
    MatchOver,

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Layout descriptor failures
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(
        "board must have between 1 and {max} rows and columns (got {rows}x{columns})",
        max = crate::layout::MAX_BOARD_SIDE
    )]
    InvalidSize { rows: u32, columns: u32 },

    #[error(
        "stack at {coord} has {stacked} pieces above the first (at most {max})",
        max = crate::layout::MAX_STACKED
    )]
    StackTooTall { coord: Coord, stacked: u32 },

    #[error("{what} {coord} is off a {rows}x{columns} board")]
    OutOfBounds {
        what: &'static str,
        coord: Coord,
        rows: u32,
        columns: u32,
    },

    #[error("two pieces placed on {0}")]
    DuplicatePiece(Coord),

    #[error("cannot fit {requested} {what} per side into {available} cells")]
    TooMany {
        what: &'static str,
        requested: u32,
        available: u32,
    },

    #[error("failed to read layout {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rules configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Match construction failures
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("invalid rules: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid starting position: {0}")]
    Board(#[from] BoardError),
}
