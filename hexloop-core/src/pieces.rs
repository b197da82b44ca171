//! Piece colors and stacks

use std::fmt;

use serde::{Deserialize, Serialize};

/// Player color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Board-unique piece identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u32);

/// Monochrome stack of pieces occupying one cell, stored bottom first.
///
/// The bottom piece is the stack's position of record; a stack is never empty
/// while it sits on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceStack {
    color: Color,
    pieces: Vec<PieceId>,
}

impl PieceStack {
    pub fn new(color: Color, bottom: PieceId) -> Self {
        Self {
            color,
            pieces: vec![bottom],
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn height(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_stacked(&self) -> bool {
        self.pieces.len() > 1
    }

    pub fn bottom(&self) -> Option<PieceId> {
        self.pieces.first().copied()
    }

    pub fn top(&self) -> Option<PieceId> {
        self.pieces.last().copied()
    }

    pub fn pieces(&self) -> &[PieceId] {
        &self.pieces
    }

    pub fn push(&mut self, piece: PieceId) {
        self.pieces.push(piece);
    }

    /// Put another stack of the same color on top of this one
    pub fn push_stack(&mut self, other: PieceStack) {
        debug_assert_eq!(self.color, other.color, "stacks must stay monochrome");
        self.pieces.extend(other.pieces);
    }

    /// Remove the top piece; the stack is spent once this returns its last piece
    pub fn pop_top(&mut self) -> Option<PieceId> {
        self.pieces.pop()
    }

    /// Detach every piece above the bottom one, nearest to the bottom first
    pub fn split_above_bottom(&mut self) -> Vec<PieceId> {
        if self.pieces.len() <= 1 {
            return Vec::new();
        }
        self.pieces.split_off(1)
    }
}
