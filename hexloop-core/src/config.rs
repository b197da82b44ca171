//! Rules configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pieces::Color;

/// Tunable rules of a match, loadable from JSON
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RulesConfig {
    /// Moves every turn starts with
    pub base_max_moves: u32,
    /// Cap on extra moves a single move can earn by closing loops
    pub max_extra_moves_per_move: u32,
    /// Pieces dropped by the random generation move
    pub random_piece_num: u32,
    /// Delay before a random generation move ends
    pub random_generation_wait_ms: u64,
    /// Share of a color's objective hexes it must occupy to win
    pub obj_hex_ratio: f32,
    /// Turn color before the match opens; play starts with its opponent
    pub starting_color: Color,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            base_max_moves: 2,
            max_extra_moves_per_move: 2,
            random_piece_num: 2,
            random_generation_wait_ms: 1500,
            obj_hex_ratio: 0.5,
            starting_color: Color::Black,
        }
    }
}

impl RulesConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: RulesConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_max_moves == 0 {
            return Err(ConfigError::Validation("baseMaxMoves must be >= 1".into()));
        }
        if !(self.obj_hex_ratio > 0.0 && self.obj_hex_ratio <= 1.0) {
            return Err(ConfigError::Validation(
                "objHexRatio must be in (0, 1]".into(),
            ));
        }
        if self.random_piece_num == 0 {
            return Err(ConfigError::Validation("randomPieceNum must be >= 1".into()));
        }
        Ok(())
    }

    pub fn random_generation_wait(&self) -> Duration {
        Duration::from_millis(self.random_generation_wait_ms)
    }

    /// Objective hexes a color must hold to win, never fewer than one
    pub fn hexes_needed(&self, objective_count: usize) -> usize {
        // f32 ratios like 0.3 widen to slightly above their decimal value
        let exact = self.obj_hex_ratio as f64 * objective_count as f64;
        let needed = (exact - 1e-6).ceil().max(0.0) as usize;
        needed.max(1)
    }
}
