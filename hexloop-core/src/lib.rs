//! HEXLOOP Core - Board model and movement rules
//!
//! This crate provides the rules engine for HEXLOOP:
//! - Board geometry (hex grid with row-parity offset coordinates)
//! - Pieces, stacks and board contents
//! - Layout descriptors with mirrored procedural generation
//! - Movement patterns: Single, Cannon, V, Wave, Contiguous, Unstack
//! - Loop detection and bonus moves
//! - Turn, move budget and win condition state machine

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod icons;
pub mod layout;
pub mod loops;
pub mod movement;
pub mod pieces;
pub mod state;

// Re-exports for convenient access
pub use board::{Coord, Direction, HexGrid, DIRECTIONS};
pub use config::RulesConfig;
pub use error::{BoardError, ConfigError, GameError, LayoutError, MoveError};
pub use game::{
    format_hms, ColorStats, EndMoveOutcome, Game, MatchResult, MoveBudget, PatternChoice, Phase,
    TurnState,
};
pub use icons::{IconKind, MovementIcons};
pub use layout::{BoardLayout, PiecePlacement};
pub use loops::{LoopCounts, LoopDetector};
pub use movement::{legal_targets, Entry, MovePlan, MoveReport, Pattern, Target, Targets};
pub use pieces::{Color, PieceId, PieceStack};
pub use state::{BoardState, Lines, PositionStatus};
