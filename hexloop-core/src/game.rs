//! Match state: turns, move budget and the win condition
//!
//! `Game` is the single entry point for a render/input front end. Every action
//! either succeeds or returns a [`MoveError`] whose text is the advisory
//! message to show; a refused action leaves the match untouched.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Serializer};

use crate::board::Coord;
use crate::config::RulesConfig;
use crate::error::{GameError, MoveError};
use crate::icons::{self, MovementIcons};
use crate::layout::BoardLayout;
use crate::loops::{LoopCounts, LoopDetector};
use crate::movement::{self, MoveReport, Pattern, Targets};
use crate::pieces::Color;
use crate::state::BoardState;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Where the match is in the select / choose / commit cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SelectionPending,
    TargetsHighlighted(Pattern),
    /// Move applied, waiting for `end_move`
    Committed,
    /// Random pieces placed, waiting for the delay to run out
    Generating,
    MatchOver,
}

/// Moves used and allowed in the current turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBudget {
    pub moves_taken: u32,
    pub max_moves: u32,
}

impl MoveBudget {
    fn fresh(base: u32) -> Self {
        Self {
            moves_taken: 0,
            max_moves: base,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.max_moves.saturating_sub(self.moves_taken)
    }
}

/// Whose turn it is and since when the match runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnState {
    pub active: Color,
    pub turn_count: u32,
    pub started_at: Instant,
}

impl TurnState {
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }
}

/// Per-color line of the match result
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorStats {
    pub moves_taken: u32,
    pub objective_hexes_occupied: usize,
}

/// Record handed to the results display when a color wins
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub winner: Color,
    pub turns: u32,
    #[serde(rename = "elapsed", serialize_with = "serialize_hms")]
    pub duration: Duration,
    pub white: ColorStats,
    pub black: ColorStats,
}

impl MatchResult {
    pub fn stats(&self, color: Color) -> &ColorStats {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// Format a duration as `HH:MM:SS`
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

fn serialize_hms<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_hms(*duration))
}

/// Result of choosing a pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternChoice {
    /// Targets are highlighted (possibly none)
    Highlighted(usize),
    /// A pattern was already active; it and the selection were cleared
    Cancelled(Pattern),
}

/// What ending a move led to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndMoveOutcome {
    /// Same color moves again; `bonus` extra moves were earned by this move
    Continue { bonus: u32 },
    TurnPassed { next: Color },
    Won(MatchResult),
}

// ============================================================================
// GAME
// ============================================================================

/// One match between White and Black
#[derive(Clone, Debug)]
pub struct Game {
    layout: BoardLayout,
    config: RulesConfig,
    board: BoardState,
    turn: TurnState,
    budget: MoveBudget,
    phase: Phase,
    selection: Vec<Coord>,
    targets: Option<Targets>,
    loops: LoopDetector,
    moves_taken: [u32; 2],
    rng: ChaCha8Rng,
    generation_started: Option<Instant>,
    result: Option<MatchResult>,
}

impl Game {
    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Start a match. The layout is resolved first, so an unseeded layout
    /// gets a fresh seed that `layout()` reports.
    pub fn new(layout: &BoardLayout, config: RulesConfig) -> Result<Self, GameError> {
        config.validate()?;
        let layout = layout.resolve()?;
        let board = layout.build_board()?;
        let seed = layout.seed.unwrap_or_default();

        let mut game = Self {
            loops: LoopDetector::new(&board),
            turn: TurnState {
                active: config.starting_color,
                turn_count: 0,
                started_at: Instant::now(),
            },
            budget: MoveBudget::fresh(config.base_max_moves),
            config,
            phase: Phase::Idle,
            selection: Vec::new(),
            targets: None,
            moves_taken: [0; 2],
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
            generation_started: None,
            result: None,
            board,
            layout,
        };

        tracing::info!(
            "match started: {}x{} board, seed {}",
            game.layout.rows,
            game.layout.columns,
            seed
        );
        game.start_new_turn();
        Ok(game)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn current_turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn active(&self) -> Color {
        self.turn.active
    }

    pub fn move_budget(&self) -> MoveBudget {
        self.budget
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selection(&self) -> &[Coord] {
        &self.selection
    }

    /// Highlighted targets of the active pattern
    pub fn legal_targets(&self) -> Option<&Targets> {
        self.targets.as_ref()
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    pub fn loop_counts(&self) -> LoopCounts {
        self.loops.previous()
    }

    /// Objective hexes `color` must occupy to win
    pub fn hexes_needed(&self, color: Color) -> usize {
        self.config.hexes_needed(self.board.objective_count(color))
    }

    /// Icons for hovering a highlighted target
    pub fn preview(&self, cell: Coord) -> Option<MovementIcons> {
        let target = self.targets.as_ref()?.get(cell)?;
        Some(icons::preview(&self.board, target))
    }

    // ========================================================================
    // PLAYER ACTIONS
    // ========================================================================

    /// Toggle one of the active color's pieces in the selection.
    ///
    /// Changing the selection drops any highlighted pattern.
    pub fn select(&mut self, cell: Coord) -> Result<(), MoveError> {
        self.ensure_interactive()?;
        if self.board.color_at(cell) != Some(self.turn.active) {
            return Err(MoveError::InvalidSelection("Select one of your pieces"));
        }

        self.targets = None;
        match self.selection.iter().position(|&c| c == cell) {
            Some(i) => {
                self.selection.remove(i);
            }
            None => self.selection.push(cell),
        }
        self.phase = if self.selection.is_empty() {
            Phase::Idle
        } else {
            Phase::SelectionPending
        };
        Ok(())
    }

    pub fn deselect_all(&mut self) -> Result<(), MoveError> {
        self.ensure_interactive()?;
        self.clear_selection();
        Ok(())
    }

    /// Highlight the targets of `pattern`, or cancel the pattern already active
    pub fn choose_pattern(&mut self, pattern: Pattern) -> Result<PatternChoice, MoveError> {
        self.ensure_interactive()?;
        if let Phase::TargetsHighlighted(active) = self.phase {
            self.clear_selection();
            tracing::debug!("{} cancelled", active);
            return Ok(PatternChoice::Cancelled(active));
        }

        let targets = movement::legal_targets(&self.board, pattern, &self.selection)?;
        let count = targets.len();
        self.targets = Some(targets);
        self.phase = Phase::TargetsHighlighted(pattern);
        Ok(PatternChoice::Highlighted(count))
    }

    /// Commit onto a highlighted target, otherwise treat the click as a selection
    pub fn click(&mut self, cell: Coord) -> Result<Option<MoveReport>, MoveError> {
        if let Some(targets) = &self.targets {
            if !targets.contains(cell) {
                return Err(MoveError::NotATarget(cell));
            }
            return self.commit_move(cell).map(Some);
        }
        self.select(cell).map(|()| None)
    }

    /// Apply the highlighted move ending on `cell`
    pub fn commit_move(&mut self, cell: Coord) -> Result<MoveReport, MoveError> {
        self.ensure_interactive()?;
        let targets = self.targets.as_ref().ok_or(MoveError::NoPattern)?;
        let target = targets.get(cell).ok_or(MoveError::NotATarget(cell))?;
        let pattern = targets.pattern();

        let report = movement::commit(&mut self.board, &target.plan)?;
        for (at, color) in &report.captured {
            tracing::debug!("{} captured a {} piece at {}", self.turn.active, color, at);
        }
        tracing::debug!("{} {} to {}", self.turn.active, pattern, cell);

        self.selection.clear();
        self.targets = None;
        self.phase = Phase::Committed;
        Ok(report)
    }

    /// Finish the move in flight: count it, check for a win, pay out loops,
    /// and pass the turn once the budget is spent.
    pub fn end_move(&mut self) -> Result<EndMoveOutcome, MoveError> {
        match self.phase {
            Phase::Committed | Phase::Generating => {}
            Phase::MatchOver => return Err(MoveError::MatchOver),
            _ => return Err(MoveError::NoPattern),
        }
        let active = self.turn.active;
        self.generation_started = None;
        self.budget.moves_taken += 1;
        self.moves_taken[active.index()] += 1;

        if self.board.occupied_objectives(active) >= self.hexes_needed(active) {
            return Ok(EndMoveOutcome::Won(self.finish(active)));
        }

        let bonus = self
            .loops
            .bonus_moves(&self.board, active, self.config.max_extra_moves_per_move);
        if bonus > 0 {
            self.budget.max_moves += bonus;
            tracing::info!("{} closed a loop: +{} moves", active, bonus);
        }

        if self.budget.moves_taken >= self.budget.max_moves {
            self.start_new_turn();
            return Ok(EndMoveOutcome::TurnPassed {
                next: self.turn.active,
            });
        }
        self.phase = Phase::Idle;
        Ok(EndMoveOutcome::Continue { bonus })
    }

    /// Hand the move to the other color with a fresh budget
    pub fn start_new_turn(&mut self) {
        self.turn.active = self.turn.active.opponent();
        self.turn.turn_count += 1;
        self.budget = MoveBudget::fresh(self.config.base_max_moves);
        self.clear_selection();
        tracing::info!("turn {}: {} to move", self.turn.turn_count, self.turn.active);
    }

    /// Drop `randomPieceNum` pieces of the active color on random empty cells.
    ///
    /// The move ends by itself once `tick` sees the configured wait pass.
    pub fn generate_random(&mut self, now: Instant) -> Result<Vec<Coord>, MoveError> {
        self.ensure_interactive()?;
        if self.targets.is_some() {
            return Err(MoveError::Busy);
        }

        let empty = self.board.empty_cells();
        let count = self.config.random_piece_num as usize;
        if empty.len() < count {
            return Err(MoveError::NotEnoughEmpty);
        }

        let cells: Vec<Coord> = rand::seq::index::sample(&mut self.rng, empty.len(), count)
            .into_iter()
            .map(|i| empty[i])
            .collect();
        for &cell in &cells {
            self.board.place_piece(cell, self.turn.active)?;
        }
        tracing::debug!("{} generated pieces at {:?}", self.turn.active, cells);

        self.selection.clear();
        self.phase = Phase::Generating;
        self.generation_started = Some(now);
        Ok(cells)
    }

    /// Advance timers. Ends a random generation move once its wait is over.
    pub fn tick(&mut self, now: Instant) -> Result<Option<EndMoveOutcome>, MoveError> {
        match (self.phase, self.generation_started) {
            (Phase::Generating, Some(started))
                if now.saturating_duration_since(started) >= self.config.random_generation_wait() =>
            {
                self.end_move().map(Some)
            }
            _ => Ok(None),
        }
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn ensure_interactive(&self) -> Result<(), MoveError> {
        match self.phase {
            Phase::MatchOver => Err(MoveError::MatchOver),
            Phase::Committed | Phase::Generating => Err(MoveError::Busy),
            _ => Ok(()),
        }
    }

    fn clear_selection(&mut self) {
        self.selection.clear();
        self.targets = None;
        self.phase = Phase::Idle;
    }

    fn finish(&mut self, winner: Color) -> MatchResult {
        let stats = |color: Color| ColorStats {
            moves_taken: self.moves_taken[color.index()],
            objective_hexes_occupied: self.board.occupied_objectives(color),
        };
        let result = MatchResult {
            winner,
            turns: self.turn.turn_count,
            duration: self.turn.elapsed(Instant::now()),
            white: stats(Color::White),
            black: stats(Color::Black),
        };
        tracing::info!(
            "{} wins after {} turns ({})",
            winner,
            result.turns,
            format_hms(result.duration)
        );

        self.selection.clear();
        self.targets = None;
        self.phase = Phase::MatchOver;
        self.result = Some(result.clone());
        result
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const W: Color = Color::White;
    const B: Color = Color::Black;

    fn c(row: i32, col: i32) -> Coord {
        Coord::new(row, col)
    }

    fn game(layout: BoardLayout) -> Game {
        Game::new(&layout, RulesConfig::default()).unwrap()
    }

    fn two_piece_game() -> Game {
        game(
            BoardLayout::empty(10, 6)
                .with_seed(42)
                .with_piece(2, 3, W, 0)
                .with_piece(7, 3, B, 0),
        )
    }

    /// Select, pick a pattern, commit and end the move
    fn play(game: &mut Game, from: Coord, pattern: Pattern, to: Coord) -> EndMoveOutcome {
        game.select(from).unwrap();
        game.choose_pattern(pattern).unwrap();
        game.commit_move(to).unwrap();
        game.end_move().unwrap()
    }

    #[test]
    fn test_white_opens() {
        let game = two_piece_game();
        assert_eq!(game.active(), W);
        assert_eq!(game.current_turn().turn_count, 1);
        assert_eq!(game.move_budget(), MoveBudget { moves_taken: 0, max_moves: 2 });
        assert_eq!(game.phase(), Phase::Idle);
    }

    #[test]
    fn test_select_own_pieces_only() {
        let mut game = two_piece_game();
        assert_eq!(
            game.select(c(7, 3)),
            Err(MoveError::InvalidSelection("Select one of your pieces"))
        );
        assert_eq!(
            game.select(c(5, 5)),
            Err(MoveError::InvalidSelection("Select one of your pieces"))
        );

        game.select(c(2, 3)).unwrap();
        assert_eq!(game.phase(), Phase::SelectionPending);
        game.select(c(2, 3)).unwrap();
        assert!(game.selection().is_empty());
        assert_eq!(game.phase(), Phase::Idle);
    }

    #[test]
    fn test_rejected_pattern_keeps_state() {
        let mut game = two_piece_game();
        assert_eq!(
            game.choose_pattern(Pattern::Single),
            Err(MoveError::InvalidSelection("No pieces selected"))
        );
        game.select(c(2, 3)).unwrap();
        assert_eq!(
            game.choose_pattern(Pattern::Unstack),
            Err(MoveError::IllegalPattern("Select a stack"))
        );
        assert_eq!(game.phase(), Phase::SelectionPending);
        assert_eq!(game.selection(), &[c(2, 3)]);
    }

    #[test]
    fn test_second_pattern_cancels_first() {
        let mut game = two_piece_game();
        game.select(c(2, 3)).unwrap();
        assert_eq!(game.choose_pattern(Pattern::Single), Ok(PatternChoice::Highlighted(6)));
        assert_eq!(game.phase(), Phase::TargetsHighlighted(Pattern::Single));

        assert_eq!(
            game.choose_pattern(Pattern::Cannon),
            Ok(PatternChoice::Cancelled(Pattern::Single))
        );
        assert_eq!(game.phase(), Phase::Idle);
        assert!(game.selection().is_empty());
        assert!(game.legal_targets().is_none());
    }

    #[test]
    fn test_click_commits_or_selects() {
        let mut game = two_piece_game();
        assert_eq!(game.click(c(2, 3)), Ok(None));
        game.choose_pattern(Pattern::Single).unwrap();
        assert!(game.preview(c(2, 4)).is_some());
        assert_eq!(game.click(c(5, 5)), Err(MoveError::NotATarget(c(5, 5))));

        let report = game.click(c(2, 4)).unwrap().unwrap();
        assert_eq!(report.moved, vec![(c(2, 3), c(2, 4))]);
        assert_eq!(game.phase(), Phase::Committed);
    }

    #[test]
    fn test_busy_until_move_ends() {
        let mut game = two_piece_game();
        game.select(c(2, 3)).unwrap();
        game.choose_pattern(Pattern::Single).unwrap();
        game.commit_move(c(2, 4)).unwrap();

        assert_eq!(game.select(c(2, 4)), Err(MoveError::Busy));
        assert_eq!(game.generate_random(Instant::now()), Err(MoveError::Busy));
        assert_eq!(game.end_move(), Ok(EndMoveOutcome::Continue { bonus: 0 }));
        assert_eq!(game.end_move(), Err(MoveError::NoPattern));
        assert_eq!(game.move_budget().moves_taken, 1);
    }

    #[test]
    fn test_budget_passes_turn() {
        let mut game = two_piece_game();
        play(&mut game, c(2, 3), Pattern::Single, c(2, 4));
        let outcome = play(&mut game, c(2, 4), Pattern::Single, c(2, 5));
        assert_eq!(outcome, EndMoveOutcome::TurnPassed { next: B });

        assert_eq!(game.active(), B);
        assert_eq!(game.current_turn().turn_count, 2);
        assert_eq!(game.move_budget(), MoveBudget { moves_taken: 0, max_moves: 2 });
    }

    fn objective_layout() -> BoardLayout {
        BoardLayout::empty(8, 8)
            .with_objective(5, 0)
            .with_objective(5, 1)
            .with_objective(5, 2)
            .with_objective(5, 3)
            .with_piece(5, 0, W, 0)
            .with_piece(4, 2, W, 0)
    }

    #[test]
    fn test_half_the_objectives_wins() {
        let mut game = game(objective_layout());
        assert_eq!(game.hexes_needed(W), 2);

        let outcome = play(&mut game, c(4, 2), Pattern::Single, c(5, 2));
        let result = match outcome {
            EndMoveOutcome::Won(result) => result,
            other => panic!("expected a win, got {:?}", other),
        };
        assert_eq!(result.winner, W);
        assert_eq!(result.turns, 1);
        assert_eq!(result.white, ColorStats { moves_taken: 1, objective_hexes_occupied: 2 });
        assert_eq!(result.black, ColorStats::default());

        assert_eq!(game.phase(), Phase::MatchOver);
        assert_eq!(game.result(), Some(&result));
        assert_eq!(game.select(c(5, 2)), Err(MoveError::MatchOver));
        assert_eq!(game.end_move(), Err(MoveError::MatchOver));
    }

    #[test]
    fn test_one_objective_is_not_enough() {
        let mut game = game(objective_layout());
        let outcome = play(&mut game, c(4, 2), Pattern::Single, c(4, 3));
        assert_eq!(outcome, EndMoveOutcome::Continue { bonus: 0 });
        assert!(game.result().is_none());
    }

    fn loop_layout() -> BoardLayout {
        let center = c(4, 3);
        let gap = c(4, 4);
        let mut layout = BoardLayout::empty(8, 8).with_piece(4, 5, W, 0);
        for cell in layout.grid().neighbors(center).into_iter().flatten() {
            if cell != gap {
                layout = layout.with_piece(cell.row, cell.col, W, 0);
            }
        }
        layout
    }

    #[test]
    fn test_closing_a_loop_grants_moves() {
        let config = RulesConfig {
            base_max_moves: 1,
            max_extra_moves_per_move: 1,
            ..Default::default()
        };
        let mut game = Game::new(&loop_layout(), config).unwrap();

        let outcome = play(&mut game, c(4, 5), Pattern::Single, c(4, 4));
        assert_eq!(outcome, EndMoveOutcome::Continue { bonus: 1 });
        assert_eq!(game.active(), W);
        assert_eq!(game.move_budget(), MoveBudget { moves_taken: 1, max_moves: 2 });
        assert_eq!(game.loop_counts().white, 1);
    }

    #[test]
    fn test_bonus_cap_of_zero() {
        let config = RulesConfig {
            base_max_moves: 1,
            max_extra_moves_per_move: 0,
            ..Default::default()
        };
        let mut game = Game::new(&loop_layout(), config).unwrap();
        let outcome = play(&mut game, c(4, 5), Pattern::Single, c(4, 4));
        assert_eq!(outcome, EndMoveOutcome::TurnPassed { next: B });
    }

    #[test]
    fn test_random_generation_waits_then_ends() {
        let mut game = game(BoardLayout::empty(4, 4));
        let start = Instant::now();

        let cells = game.generate_random(start).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(game.board().piece_count(W), 2);
        assert_eq!(game.phase(), Phase::Generating);
        assert_eq!(game.generate_random(start), Err(MoveError::Busy));

        assert_eq!(game.tick(start + Duration::from_millis(1000)), Ok(None));
        let outcome = game.tick(start + Duration::from_millis(1500)).unwrap();
        assert_eq!(outcome, Some(EndMoveOutcome::Continue { bonus: 0 }));
        assert_eq!(game.move_budget().moves_taken, 1);
        assert_eq!(game.phase(), Phase::Idle);
    }

    #[test]
    fn test_random_generation_needs_room() {
        let config = RulesConfig {
            random_piece_num: 20,
            ..Default::default()
        };
        let mut game = Game::new(&BoardLayout::empty(4, 4), config).unwrap();
        assert_eq!(game.generate_random(Instant::now()), Err(MoveError::NotEnoughEmpty));
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(game.board().piece_count(W), 0);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let layout = BoardLayout::empty(6, 6).with_seed(9);
        let mut a = game(layout.clone());
        let mut b = game(layout);
        let now = Instant::now();
        assert_eq!(a.generate_random(now).unwrap(), b.generate_random(now).unwrap());
    }

    #[test]
    fn test_result_json() {
        assert_eq!(format_hms(Duration::from_secs(3725)), "01:02:05");

        let result = MatchResult {
            winner: B,
            turns: 7,
            duration: Duration::from_secs(65),
            white: ColorStats { moves_taken: 6, objective_hexes_occupied: 1 },
            black: ColorStats { moves_taken: 7, objective_hexes_occupied: 2 },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["winner"], "Black");
        assert_eq!(json["elapsed"], "00:01:05");
        assert_eq!(json["black"]["objectiveHexesOccupied"], 2);
    }
}
