//! Movement patterns: legal target generation and move execution
//!
//! Each pattern turns a selection into a set of [`Target`]s. A target knows
//! the full [`MovePlan`] that reaching it requires, so committing a move never
//! re-derives anything from the selection.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::board::{Coord, Direction, DIRECTIONS};
use crate::error::{BoardError, MoveError};
use crate::pieces::{Color, PieceStack};
use crate::state::{BoardState, PositionStatus};

// ============================================================================
// TYPES
// ============================================================================

/// Movement pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    Single,
    Cannon,
    V,
    Wave,
    Contiguous,
    Unstack,
}

impl Pattern {
    pub const ALL: [Pattern; 6] = [
        Pattern::Single,
        Pattern::Cannon,
        Pattern::V,
        Pattern::Wave,
        Pattern::Contiguous,
        Pattern::Unstack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pattern::Single => "single",
            Pattern::Cannon => "cannon",
            Pattern::V => "v",
            Pattern::Wave => "wave",
            Pattern::Contiguous => "contiguous",
            Pattern::Unstack => "unstack",
        }
    }

    pub fn from_name(name: &str) -> Option<Pattern> {
        Pattern::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the moving piece enters a target cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    Move,
    Capture,
    /// Merge onto a friendly stack
    Stack,
}

/// Board changes a committed move performs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MovePlan {
    /// Carry the stack on `path[0]` along the path to its last cell
    Path { path: Vec<Coord> },
    /// Shift every wave piece one step, or capture in place when bouncing
    Wave {
        cells: Vec<Coord>,
        direction: Direction,
        bounce: bool,
    },
    /// Deal the stack on `line[0]` out along the line, one piece per cell
    Unstack { line: Vec<Coord> },
    /// Knock the top piece off the enemy stack on `target`; the mover stays put
    Strike { source: Coord, target: Coord },
}

/// A highlighted destination
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub cell: Coord,
    pub status: PositionStatus,
    pub entry: Entry,
    pub plan: MovePlan,
}

/// Legal targets of one pattern, in discovery order
#[derive(Clone, Debug)]
pub struct Targets {
    pattern: Pattern,
    targets: Vec<Target>,
    index: FxHashMap<Coord, usize>,
}

impl Targets {
    fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            targets: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn get(&self, cell: Coord) -> Option<&Target> {
        self.index.get(&cell).map(|&i| &self.targets[i])
    }

    pub fn contains(&self, cell: Coord) -> bool {
        self.index.contains_key(&cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> + '_ {
        self.targets.iter()
    }

    pub fn cells(&self) -> Vec<Coord> {
        self.targets.iter().map(|t| t.cell).collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// First route to a cell wins
    fn push(&mut self, target: Target) {
        if self.index.contains_key(&target.cell) {
            return;
        }
        self.index.insert(target.cell, self.targets.len());
        self.targets.push(target);
    }
}

/// What a committed move did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveReport {
    /// Cells that lost their top piece, with that piece's color
    pub captured: Vec<(Coord, Color)>,
    /// Stacks or pieces that changed cell
    pub moved: Vec<(Coord, Coord)>,
}

// ============================================================================
// TARGET GENERATION
// ============================================================================

/// Legal targets of `pattern` for the selected cells
pub fn legal_targets(
    board: &BoardState,
    pattern: Pattern,
    selection: &[Coord],
) -> Result<Targets, MoveError> {
    if selection.is_empty() {
        return Err(MoveError::InvalidSelection("No pieces selected"));
    }
    if selection.iter().any(|&c| !board.is_occupied(c)) {
        return Err(MoveError::InvalidSelection("Select only hexes with pieces"));
    }

    let targets = match pattern {
        Pattern::Single => single_targets(board, lone_piece(selection)?),
        Pattern::Cannon => cannon_targets(board, lone_piece(selection)?)?,
        Pattern::V => v_targets(board, lone_piece(selection)?)?,
        Pattern::Wave => wave_targets(board, selection)?,
        Pattern::Contiguous => contiguous_targets(board, lone_piece(selection)?)?,
        Pattern::Unstack => unstack_targets(board, lone_piece(selection)?)?,
    };

    tracing::debug!("{} from {:?}: {} targets", pattern, selection, targets.len());
    Ok(targets)
}

fn lone_piece(selection: &[Coord]) -> Result<Coord, MoveError> {
    match selection {
        [source] => Ok(*source),
        _ => Err(MoveError::InvalidSelection("Select only one piece")),
    }
}

fn entry_for(status: PositionStatus) -> Entry {
    match status {
        PositionStatus::Capturable => Entry::Capture,
        _ => Entry::Move,
    }
}

fn path_target(cell: Coord, status: PositionStatus, path: &[Coord]) -> Target {
    Target {
        cell,
        status,
        entry: entry_for(status),
        plan: MovePlan::Path {
            path: path.to_vec(),
        },
    }
}

/// Every neighbor: free cells, lone enemies, and friendly stacks to merge with
fn single_targets(board: &BoardState, source: Coord) -> Targets {
    let mut targets = Targets::new(Pattern::Single);
    let mover = board.color_at(source);

    for next in board.grid().neighbors(source).into_iter().flatten() {
        let status = board.position_status(next, source);
        let entry = match status {
            PositionStatus::Free => Entry::Move,
            PositionStatus::Capturable => Entry::Capture,
            PositionStatus::Blocked if board.color_at(next) == mover => Entry::Stack,
            PositionStatus::Blocked => continue,
        };
        targets.push(Target {
            cell: next,
            status,
            entry,
            plan: MovePlan::Path {
                path: vec![source, next],
            },
        });
    }
    targets
}

/// Fire away from the end of a line, as far as the line is long
fn cannon_targets(board: &BoardState, source: Coord) -> Result<Targets, MoveError> {
    let lines = board.find_lines(source);
    let ends = lines.free_ends();
    if ends.is_empty() {
        return Err(MoveError::IllegalPattern("Piece must be at the end of a line"));
    }

    let mut targets = Targets::new(Pattern::Cannon);
    for direction in ends {
        let range = lines.len(direction.opposite());
        let mut path = vec![source];
        let mut current = source;

        for _ in 0..range {
            let Some(next) = board.grid().neighbor(current, direction) else {
                break;
            };
            let status = board.position_status(next, source);
            if status == PositionStatus::Blocked {
                break;
            }
            path.push(next);
            targets.push(path_target(next, status, &path));
            if status == PositionStatus::Capturable {
                break;
            }
            current = next;
        }
    }
    Ok(targets)
}

/// Fire two lines meeting at the piece toward the vertex between them
fn v_targets(board: &BoardState, source: Coord) -> Result<Targets, MoveError> {
    let lines = board.find_lines(source);
    let directions = lines.line_directions();
    if directions.len() < 2 {
        return Err(MoveError::IllegalPattern("Select a piece at the end of a V"));
    }

    let arms: Vec<(Direction, Direction)> = directions
        .iter()
        .filter(|d| directions.contains(&d.cycle(1)))
        .map(|&d| (d, d.cycle(1)))
        .collect();
    if arms.is_empty() {
        return Err(MoveError::IllegalPattern("Directions of a V must be consecutive"));
    }

    let grid = board.grid();
    let mut targets = Targets::new(Pattern::V);
    for (left_arm, right_arm) in arms {
        let steps = lines.len(left_arm).min(lines.len(right_arm));
        // Firing direction: both arms reversed, combined into one step
        let (a, b) = (left_arm.opposite(), right_arm.opposite());
        let mut path = vec![source];
        let mut current = source;

        for _ in 0..steps {
            let next = current.step(a).step(b);
            if !grid.contains(next) {
                break;
            }
            let status = board.position_status(next, source);
            if status == PositionStatus::Blocked {
                break;
            }
            path.push(next);
            targets.push(path_target(next, status, &path));
            if status == PositionStatus::Capturable {
                break;
            }
            current = next;
        }
    }
    Ok(targets)
}

/// Straight run of selected cells along a vertex axis, end first.
///
/// Such a run alternates between two cyclically adjacent directions, and the
/// two hex directions perpendicular to its axis are returned with it.
fn trace_wave(board: &BoardState, selection: &[Coord]) -> Result<(Vec<Coord>, [Direction; 2]), MoveError> {
    let grid = board.grid();
    let selected = |c: Coord| selection.contains(&c);

    let end = selection.iter().find_map(|&cell| {
        let linked: Vec<Direction> = DIRECTIONS
            .into_iter()
            .filter(|&d| grid.neighbor(cell, d).is_some_and(selected))
            .collect();
        match linked.as_slice() {
            [d] => Some((cell, *d)),
            _ => None,
        }
    });
    let Some((end, first)) = end else {
        return Err(MoveError::IllegalPattern("Select a wave"));
    };
    let Some(second) = grid.neighbor(end, first) else {
        return Err(MoveError::IllegalPattern("Select a wave"));
    };

    let turn = if grid.neighbor(second, first.cycle(1)).is_some_and(selected) {
        1
    } else if grid.neighbor(second, first.cycle(-1)).is_some_and(selected) {
        -1
    } else {
        return Err(MoveError::IllegalPattern("Select a wave"));
    };
    let perpendicular = [first.cycle(-turn), first.cycle(2 * turn)];

    let mut wave = vec![end];
    let mut cell = second;
    let mut direction = first;
    let mut turn = turn;
    while selected(cell) && !wave.contains(&cell) {
        wave.push(cell);
        let next_direction = direction.cycle(turn);
        let Some(next) = grid.neighbor(cell, next_direction) else {
            break;
        };
        cell = next;
        direction = next_direction;
        turn = -turn;
    }

    if selection.iter().any(|c| !wave.contains(c)) {
        return Err(MoveError::IllegalPattern("Select only a wave"));
    }
    Ok((wave, perpendicular))
}

/// Move a run of pieces sideways together
fn wave_targets(board: &BoardState, selection: &[Coord]) -> Result<Targets, MoveError> {
    if selection.len() < 3 {
        return Err(MoveError::IllegalPattern("Select at least three pieces"));
    }
    let (wave, perpendicular) = trace_wave(board, selection)?;
    let grid = board.grid();

    let mut targets = Targets::new(Pattern::Wave);
    for direction in perpendicular {
        let worst = wave
            .iter()
            .map(|&c| match grid.neighbor(c, direction) {
                Some(next) => board.position_status(next, c),
                None => PositionStatus::Blocked,
            })
            .min()
            .unwrap_or(PositionStatus::Blocked);
        if worst == PositionStatus::Blocked {
            continue;
        }

        let bounce = worst == PositionStatus::Capturable;
        let plan = MovePlan::Wave {
            cells: wave.clone(),
            direction,
            bounce,
        };
        for &c in &wave {
            let Some(next) = grid.neighbor(c, direction) else {
                continue;
            };
            let status = board.position_status(next, c);
            if status == PositionStatus::Capturable || !bounce {
                targets.push(Target {
                    cell: next,
                    status,
                    entry: entry_for(status),
                    plan: plan.clone(),
                });
            }
        }
    }
    Ok(targets)
}

/// Routes over touching pieces, keyed by reachable destination.
///
/// Each route lists the directions taken from `source`. The search recurses
/// once per piece on the current route, so its depth never exceeds the number
/// of cells on the board.
pub fn contiguous_paths(board: &BoardState, source: Coord) -> FxHashMap<Coord, Vec<Vec<Direction>>> {
    let mut search = ContiguousSearch {
        board,
        source,
        on_route: Vec::new(),
        route: Vec::new(),
        best_depth: FxHashMap::default(),
        paths: FxHashMap::default(),
    };
    search.expand(source);
    search.paths
}

struct ContiguousSearch<'a> {
    board: &'a BoardState,
    source: Coord,
    on_route: Vec<Coord>,
    route: Vec<Direction>,
    best_depth: FxHashMap<Coord, usize>,
    paths: FxHashMap<Coord, Vec<Vec<Direction>>>,
}

impl ContiguousSearch<'_> {
    fn expand(&mut self, from: Coord) {
        let grid = self.board.grid();
        for piece in self.board.adjacent_pieces(from) {
            if piece == self.source || self.on_route.contains(&piece) {
                continue;
            }
            // A longer route into an expanded piece cannot shorten any path
            let depth = self.route.len() + 1;
            if self.best_depth.get(&piece).is_some_and(|&best| depth > best) {
                continue;
            }
            self.best_depth.insert(piece, depth);
            let Some(step) = grid.direction_between(from, piece) else {
                continue;
            };

            self.route.push(step);
            self.on_route.push(piece);

            for direction in DIRECTIONS {
                let Some(next) = grid.neighbor(piece, direction) else {
                    continue;
                };
                if next == self.source || self.is_friendly(next) {
                    continue;
                }
                let mut route = self.route.clone();
                route.push(direction);
                self.paths.entry(next).or_default().push(route);
            }

            self.expand(piece);

            self.on_route.pop();
            self.route.pop();
        }
    }

    fn is_friendly(&self, cell: Coord) -> bool {
        self.board.position_status(cell, self.source) == PositionStatus::Blocked
            && self.board.color_at(cell) == self.board.color_at(self.source)
    }
}

/// Travel across any chain of touching pieces to a cell beside it.
///
/// An enemy stack beside the chain is struck instead of entered.
fn contiguous_targets(board: &BoardState, source: Coord) -> Result<Targets, MoveError> {
    let paths = contiguous_paths(board, source);
    if paths.is_empty() {
        return Err(MoveError::IllegalPattern("Piece has no contiguous pieces"));
    }

    let grid = board.grid();
    let mut targets = Targets::new(Pattern::Contiguous);
    for cell in grid.cells() {
        let Some(routes) = paths.get(&cell) else {
            continue;
        };
        let Some(shortest) = routes.iter().min_by_key(|r| r.len()) else {
            continue;
        };
        let status = board.position_status(cell, source);
        if status == PositionStatus::Blocked {
            targets.push(Target {
                cell,
                status,
                entry: Entry::Capture,
                plan: MovePlan::Strike {
                    source,
                    target: cell,
                },
            });
            continue;
        }

        let mut path = vec![source];
        let mut current = source;
        for &direction in shortest {
            current = current.step(direction);
            path.push(current);
        }
        debug_assert_eq!(current, cell);
        targets.push(path_target(cell, status, &path));
    }
    Ok(targets)
}

/// Spread a stack out along a line, one piece per cell
fn unstack_targets(board: &BoardState, source: Coord) -> Result<Targets, MoveError> {
    let height = board.height_at(source);
    if height <= 1 {
        return Err(MoveError::IllegalPattern("Select a stack"));
    }

    let grid = board.grid();
    let mut targets = Targets::new(Pattern::Unstack);
    'directions: for direction in DIRECTIONS {
        let mut line = vec![source];
        let mut current = source;
        for _ in 1..height {
            match grid.neighbor(current, direction) {
                Some(next) if board.position_status(next, source) != PositionStatus::Blocked => {
                    line.push(next);
                    current = next;
                }
                _ => continue 'directions,
            }
        }

        let plan = MovePlan::Unstack { line: line.clone() };
        for &cell in &line[1..] {
            let status = board.position_status(cell, source);
            targets.push(Target {
                cell,
                status,
                entry: entry_for(status),
                plan: plan.clone(),
            });
        }
    }
    Ok(targets)
}

// ============================================================================
// EXECUTION
// ============================================================================

/// Apply a move plan. The board is left untouched when the plan no longer fits it.
pub fn commit(board: &mut BoardState, plan: &MovePlan) -> Result<MoveReport, BoardError> {
    let report = match plan {
        MovePlan::Path { path } => commit_path(board, path)?,
        MovePlan::Wave {
            cells,
            direction,
            bounce,
        } => commit_wave(board, cells, *direction, *bounce)?,
        MovePlan::Unstack { line } => commit_unstack(board, line)?,
        MovePlan::Strike { source, target } => commit_strike(board, *source, *target)?,
    };
    tracing::debug!(
        "move committed: {} moved, {} captured",
        report.moved.len(),
        report.captured.len()
    );
    Ok(report)
}

fn mover_color(board: &BoardState, source: Coord) -> Result<Color, BoardError> {
    board.color_at(source).ok_or(BoardError::EmptyCell(source))
}

fn capture(board: &mut BoardState, cell: Coord, report: &mut MoveReport) -> Result<(), BoardError> {
    let color = mover_color(board, cell)?;
    board.remove_piece(cell)?;
    report.captured.push((cell, color));
    Ok(())
}

fn commit_path(board: &mut BoardState, path: &[Coord]) -> Result<MoveReport, BoardError> {
    let (Some(&source), Some(&dest)) = (path.first(), path.last()) else {
        return Ok(MoveReport::default());
    };
    let mover = mover_color(board, source)?;
    if board.color_at(dest).is_some_and(|c| c != mover)
        && board.status_for(dest, mover) == PositionStatus::Blocked
    {
        return Err(BoardError::MixedStack(dest));
    }

    let stack = board.take_stack(source)?;
    let mut report = MoveReport::default();
    // Lone enemies along the way, the destination included, lose their piece
    for &cell in &path[1..] {
        if board.status_for(cell, mover) == PositionStatus::Capturable {
            capture(board, cell, &mut report)?;
        }
    }
    board.put_stack(dest, stack)?;
    report.moved.push((source, dest));
    Ok(report)
}

fn commit_strike(
    board: &mut BoardState,
    source: Coord,
    target: Coord,
) -> Result<MoveReport, BoardError> {
    let mover = mover_color(board, source)?;
    if mover_color(board, target)? == mover {
        return Err(BoardError::MixedStack(target));
    }
    let mut report = MoveReport::default();
    capture(board, target, &mut report)?;
    Ok(report)
}

fn commit_wave(
    board: &mut BoardState,
    cells: &[Coord],
    direction: Direction,
    bounce: bool,
) -> Result<MoveReport, BoardError> {
    let Some(&first) = cells.first() else {
        return Ok(MoveReport::default());
    };
    let mover = mover_color(board, first)?;
    let grid = *board.grid();
    let mut report = MoveReport::default();

    let mut steps = Vec::with_capacity(cells.len());
    for &cell in cells {
        let next = grid.neighbor(cell, direction).ok_or(BoardError::OutOfBounds(cell.step(direction)))?;
        steps.push((cell, next));
    }

    if bounce {
        for &(_, next) in &steps {
            if board.status_for(next, mover) == PositionStatus::Capturable {
                capture(board, next, &mut report)?;
            }
        }
        return Ok(report);
    }

    if let Some(&(_, next)) = steps.iter().find(|(_, next)| board.is_occupied(*next)) {
        return Err(BoardError::MixedStack(next));
    }
    let mut lifted: Vec<(Coord, PieceStack)> = Vec::with_capacity(steps.len());
    for &(cell, next) in &steps {
        lifted.push((next, board.take_stack(cell)?));
        report.moved.push((cell, next));
    }
    for (next, stack) in lifted {
        board.put_stack(next, stack)?;
    }
    Ok(report)
}

fn commit_unstack(board: &mut BoardState, line: &[Coord]) -> Result<MoveReport, BoardError> {
    let Some(&source) = line.first() else {
        return Ok(MoveReport::default());
    };
    let mover = mover_color(board, source)?;
    if let Some(&blocked) = line[1..]
        .iter()
        .find(|&&c| board.status_for(c, mover) == PositionStatus::Blocked)
    {
        return Err(BoardError::MixedStack(blocked));
    }

    let mut report = MoveReport::default();
    let mut stack = board.take_stack(source)?;
    let above = stack.split_above_bottom();
    board.put_stack(source, stack)?;

    for (&cell, piece) in line[1..].iter().zip(above) {
        if board.status_for(cell, mover) == PositionStatus::Capturable {
            capture(board, cell, &mut report)?;
        }
        board.put_stack(cell, PieceStack::new(mover, piece))?;
        report.moved.push((source, cell));
    }
    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoardLayout;

    const W: Color = Color::White;
    const B: Color = Color::Black;

    fn c(row: i32, col: i32) -> Coord {
        Coord::new(row, col)
    }

    fn board_with(pieces: &[(i32, i32, Color, u32)]) -> BoardState {
        let mut layout = BoardLayout::empty(8, 8);
        for &(row, col, color, stacked) in pieces {
            layout = layout.with_piece(row, col, color, stacked);
        }
        layout.build_board().unwrap()
    }

    fn sorted(mut cells: Vec<Coord>) -> Vec<Coord> {
        cells.sort();
        cells
    }

    #[test]
    fn test_single_lists_every_neighbor() {
        let board = BoardLayout::empty(10, 6)
            .with_seed(42)
            .with_piece(2, 3, W, 0)
            .with_piece(7, 3, B, 0)
            .build_board()
            .unwrap();

        let targets = legal_targets(&board, Pattern::Single, &[c(2, 3)]).unwrap();
        let neighbors: Vec<Coord> = board.grid().neighbors(c(2, 3)).into_iter().flatten().collect();
        assert_eq!(neighbors.len(), 6);
        assert_eq!(sorted(targets.cells()), sorted(neighbors));
        assert!(targets.iter().all(|t| t.status == PositionStatus::Free && t.entry == Entry::Move));
    }

    #[test]
    fn test_single_statuses() {
        let board = board_with(&[
            (2, 2, W, 0),
            (2, 3, B, 0),
            (3, 2, B, 1),
            (1, 2, W, 0),
        ]);
        let targets = legal_targets(&board, Pattern::Single, &[c(2, 2)]).unwrap();

        assert_eq!(targets.len(), 5);
        assert_eq!(targets.get(c(2, 3)).unwrap().entry, Entry::Capture);
        assert_eq!(targets.get(c(1, 2)).unwrap().entry, Entry::Stack);
        assert_eq!(targets.get(c(2, 1)).unwrap().status, PositionStatus::Free);
        assert!(targets.get(c(3, 2)).is_none(), "enemy stack is excluded");
    }

    #[test]
    fn test_selection_count_errors() {
        let board = board_with(&[(2, 2, W, 0), (2, 3, W, 0)]);
        assert_eq!(
            legal_targets(&board, Pattern::Single, &[]).unwrap_err(),
            MoveError::InvalidSelection("No pieces selected")
        );
        assert_eq!(
            legal_targets(&board, Pattern::Cannon, &[c(2, 2), c(2, 3)]).unwrap_err(),
            MoveError::InvalidSelection("Select only one piece")
        );
    }

    #[test]
    fn test_cannon_fires_from_line_end() {
        let board = board_with(&[(2, 1, W, 0), (2, 2, W, 0), (2, 3, W, 0), (2, 6, B, 0)]);
        let targets = legal_targets(&board, Pattern::Cannon, &[c(2, 3)]).unwrap();

        assert_eq!(targets.cells(), vec![c(2, 4), c(2, 5), c(2, 6)]);
        let last = targets.get(c(2, 6)).unwrap();
        assert_eq!(last.entry, Entry::Capture);
        assert_eq!(
            last.plan,
            MovePlan::Path {
                path: vec![c(2, 3), c(2, 4), c(2, 5), c(2, 6)]
            }
        );
    }

    #[test]
    fn test_cannon_stops_at_capture_and_range() {
        let board = board_with(&[(2, 1, W, 0), (2, 2, W, 0), (2, 3, W, 0), (2, 5, B, 0)]);
        let targets = legal_targets(&board, Pattern::Cannon, &[c(2, 3)]).unwrap();
        assert_eq!(targets.cells(), vec![c(2, 4), c(2, 5)]);

        // Range is the length of the line behind the piece
        let board = board_with(&[(2, 1, W, 0), (2, 2, W, 0)]);
        let targets = legal_targets(&board, Pattern::Cannon, &[c(2, 2)]).unwrap();
        assert!(targets.contains(c(2, 4)));
        assert!(!targets.contains(c(2, 5)));

        // An enemy stack blocks the shot entirely
        let board = board_with(&[(2, 1, W, 0), (2, 2, W, 0), (2, 3, B, 1)]);
        let targets = legal_targets(&board, Pattern::Cannon, &[c(2, 2)]).unwrap();
        assert!(!targets.contains(c(2, 3)));
    }

    #[test]
    fn test_cannon_needs_line_end() {
        let board = board_with(&[(2, 1, W, 0), (2, 2, W, 0), (2, 3, W, 0)]);
        assert_eq!(
            legal_targets(&board, Pattern::Cannon, &[c(2, 2)]).unwrap_err(),
            MoveError::IllegalPattern("Piece must be at the end of a line")
        );
    }

    #[test]
    fn test_v_fires_straight_up() {
        let board = board_with(&[(2, 3, W, 0), (1, 3, W, 0), (1, 2, W, 0)]);
        let targets = legal_targets(&board, Pattern::V, &[c(2, 3)]).unwrap();

        assert_eq!(targets.cells(), vec![c(4, 3), c(6, 3)]);
        assert_eq!(
            targets.get(c(6, 3)).unwrap().plan,
            MovePlan::Path {
                path: vec![c(2, 3), c(4, 3), c(6, 3)]
            }
        );
    }

    #[test]
    fn test_v_fires_sideways() {
        let board = board_with(&[(4, 4, W, 0), (5, 4, W, 0), (4, 5, W, 0)]);
        let targets = legal_targets(&board, Pattern::V, &[c(4, 4)]).unwrap();
        assert_eq!(targets.cells(), vec![c(3, 2), c(2, 1)]);
    }

    #[test]
    fn test_v_errors() {
        let board = board_with(&[(2, 1, W, 0), (2, 2, W, 0), (2, 3, W, 0)]);
        assert_eq!(
            legal_targets(&board, Pattern::V, &[c(2, 1)]).unwrap_err(),
            MoveError::IllegalPattern("Select a piece at the end of a V")
        );
        assert_eq!(
            legal_targets(&board, Pattern::V, &[c(2, 2)]).unwrap_err(),
            MoveError::IllegalPattern("Directions of a V must be consecutive")
        );
    }

    fn wave_selection() -> Vec<Coord> {
        vec![c(2, 1), c(3, 1), c(3, 2)]
    }

    #[test]
    fn test_wave_advances_on_both_sides() {
        let mut board = board_with(&[(2, 1, W, 0), (3, 1, W, 0), (3, 2, W, 0)]);
        let targets = legal_targets(&board, Pattern::Wave, &wave_selection()).unwrap();

        assert_eq!(
            sorted(targets.cells()),
            sorted(vec![c(3, 0), c(4, 1), c(4, 2), c(1, 1), c(2, 2), c(2, 3)])
        );

        let plan = targets.get(c(4, 1)).unwrap().plan.clone();
        assert!(matches!(
            plan,
            MovePlan::Wave { direction: Direction::TopLeft, bounce: false, .. }
        ));
        commit(&mut board, &plan).unwrap();
        for cell in [c(3, 0), c(4, 1), c(4, 2)] {
            assert_eq!(board.color_at(cell), Some(W));
        }
        for cell in wave_selection() {
            assert!(!board.is_occupied(cell));
        }
    }

    #[test]
    fn test_wave_bounces_off_lone_enemy() {
        let mut board = board_with(&[(2, 1, W, 0), (3, 1, W, 0), (3, 2, W, 0), (2, 2, B, 0)]);
        let targets = legal_targets(&board, Pattern::Wave, &wave_selection()).unwrap();

        // Bouncing side only offers the enemy; the other side still advances
        assert_eq!(targets.len(), 4);
        let hit = targets.get(c(2, 2)).unwrap();
        assert_eq!(hit.entry, Entry::Capture);
        assert!(!targets.contains(c(1, 1)));

        let report = commit(&mut board, &hit.plan.clone()).unwrap();
        assert_eq!(report.captured, vec![(c(2, 2), B)]);
        assert!(report.moved.is_empty());
        assert!(!board.is_occupied(c(2, 2)));
        for cell in wave_selection() {
            assert_eq!(board.color_at(cell), Some(W));
        }
    }

    #[test]
    fn test_wave_blocked_side() {
        let board = board_with(&[(2, 1, W, 0), (3, 1, W, 0), (3, 2, W, 0), (1, 1, B, 1)]);
        let targets = legal_targets(&board, Pattern::Wave, &wave_selection()).unwrap();
        assert_eq!(sorted(targets.cells()), sorted(vec![c(3, 0), c(4, 1), c(4, 2)]));
    }

    #[test]
    fn test_wave_shape_errors() {
        let board = board_with(&[
            (2, 1, W, 0),
            (2, 2, W, 0),
            (2, 3, W, 0),
            (3, 1, W, 0),
            (3, 2, W, 0),
            (5, 5, W, 0),
        ]);
        assert_eq!(
            legal_targets(&board, Pattern::Wave, &[c(2, 1), c(2, 2)]).unwrap_err(),
            MoveError::IllegalPattern("Select at least three pieces")
        );
        // A line along a hex direction has no perpendicular side
        assert_eq!(
            legal_targets(&board, Pattern::Wave, &[c(2, 1), c(2, 2), c(2, 3)]).unwrap_err(),
            MoveError::IllegalPattern("Select a wave")
        );
        assert_eq!(
            legal_targets(&board, Pattern::Wave, &[c(2, 1), c(3, 1), c(3, 2), c(5, 5)]).unwrap_err(),
            MoveError::IllegalPattern("Select only a wave")
        );
    }

    #[test]
    fn test_contiguous_paths_and_commit() {
        let mut board = board_with(&[(2, 1, W, 0), (2, 2, W, 0), (2, 3, B, 0)]);

        let paths = contiguous_paths(&board, c(2, 1));
        assert!(!paths.contains_key(&c(2, 1)));
        assert!(!paths.contains_key(&c(2, 2)));
        let routes = &paths[&c(1, 2)];
        assert!(routes.contains(&vec![Direction::Right, Direction::BottomRight]));
        assert!(routes.contains(&vec![Direction::Right, Direction::Right, Direction::BottomLeft]));

        let targets = legal_targets(&board, Pattern::Contiguous, &[c(2, 1)]).unwrap();
        assert_eq!(
            targets.get(c(1, 2)).unwrap().plan,
            MovePlan::Path {
                path: vec![c(2, 1), c(2, 2), c(1, 2)]
            }
        );
        assert_eq!(targets.get(c(2, 3)).unwrap().entry, Entry::Capture);

        let plan = targets.get(c(2, 4)).unwrap().plan.clone();
        let report = commit(&mut board, &plan).unwrap();
        assert_eq!(report.captured, vec![(c(2, 3), B)]);
        assert_eq!(board.color_at(c(2, 4)), Some(W));
        assert_eq!(board.color_at(c(2, 2)), Some(W));
        assert!(!board.is_occupied(c(2, 1)));
        assert!(!board.is_occupied(c(2, 3)));
    }

    #[test]
    fn test_contiguous_strikes_enemy_stack() {
        // Black stack beside the chain's far end, and a white stack the chain must skip
        let mut board = board_with(&[(2, 1, W, 0), (2, 2, W, 0), (2, 3, B, 1), (3, 2, W, 1)]);

        let targets = legal_targets(&board, Pattern::Contiguous, &[c(2, 1)]).unwrap();
        let hit = targets.get(c(2, 3)).unwrap();
        assert_eq!(hit.status, PositionStatus::Blocked);
        assert_eq!(hit.entry, Entry::Capture);
        assert_eq!(
            hit.plan,
            MovePlan::Strike {
                source: c(2, 1),
                target: c(2, 3)
            }
        );
        assert!(!targets.contains(c(3, 2)));
        assert!(!targets.contains(c(2, 2)));

        let report = commit(&mut board, &hit.plan.clone()).unwrap();
        assert_eq!(report.captured, vec![(c(2, 3), B)]);
        assert!(report.moved.is_empty());
        assert_eq!(board.height_at(c(2, 3)), 1);
        assert_eq!(board.color_at(c(2, 3)), Some(B));
        assert_eq!(board.color_at(c(2, 1)), Some(W));
    }

    #[test]
    fn test_contiguous_needs_neighbors() {
        let board = board_with(&[(2, 1, W, 0), (5, 5, B, 0)]);
        assert_eq!(
            legal_targets(&board, Pattern::Contiguous, &[c(2, 1)]).unwrap_err(),
            MoveError::IllegalPattern("Piece has no contiguous pieces")
        );
    }

    #[test]
    fn test_unstack_lines() {
        let board = board_with(&[(2, 1, W, 2)]);
        let targets = legal_targets(&board, Pattern::Unstack, &[c(2, 1)]).unwrap();
        // Left runs off the board after one cell; the other five lines fit
        assert_eq!(targets.len(), 10);
        assert!(targets.contains(c(2, 2)) && targets.contains(c(2, 3)));
        assert!(!targets.contains(c(2, 0)));

        let board = board_with(&[(2, 1, W, 2), (2, 3, B, 1)]);
        let targets = legal_targets(&board, Pattern::Unstack, &[c(2, 1)]).unwrap();
        assert_eq!(targets.len(), 8);
        assert!(!targets.contains(c(2, 2)));

        let board = board_with(&[(2, 1, W, 0)]);
        assert_eq!(
            legal_targets(&board, Pattern::Unstack, &[c(2, 1)]).unwrap_err(),
            MoveError::IllegalPattern("Select a stack")
        );
    }

    #[test]
    fn test_unstack_commit_deals_pieces() {
        let mut board = board_with(&[(2, 1, W, 2), (2, 2, B, 0)]);
        let targets = legal_targets(&board, Pattern::Unstack, &[c(2, 1)]).unwrap();
        let target = targets.get(c(2, 3)).unwrap();
        assert_eq!(targets.get(c(2, 2)).unwrap().entry, Entry::Capture);

        let report = commit(&mut board, &target.plan.clone()).unwrap();
        assert_eq!(report.captured, vec![(c(2, 2), B)]);
        for cell in [c(2, 1), c(2, 2), c(2, 3)] {
            assert_eq!(board.color_at(cell), Some(W));
            assert_eq!(board.height_at(cell), 1);
        }
    }

    #[test]
    fn test_unstack_onto_free_and_lone_enemy() {
        // Right: free then a lone enemy. TopRight: ends on a friendly piece.
        let mut board = board_with(&[(2, 1, W, 2), (2, 3, B, 0), (4, 2, W, 0)]);
        let targets = legal_targets(&board, Pattern::Unstack, &[c(2, 1)]).unwrap();
        assert_eq!(targets.get(c(2, 2)).unwrap().status, PositionStatus::Free);
        assert_eq!(targets.get(c(2, 3)).unwrap().status, PositionStatus::Capturable);
        assert!(!targets.contains(c(3, 1)));

        let plan = targets.get(c(2, 2)).unwrap().plan.clone();
        let report = commit(&mut board, &plan).unwrap();
        assert_eq!(report.captured, vec![(c(2, 3), B)]);
        assert_eq!(report.moved, vec![(c(2, 1), c(2, 2)), (c(2, 1), c(2, 3))]);
        assert_eq!(board.piece_count(B), 0);
    }

    #[test]
    fn test_single_commit_stacks_and_captures() {
        let mut board = board_with(&[(2, 2, W, 0), (1, 2, W, 0), (2, 3, B, 0), (5, 5, W, 0)]);
        let targets = legal_targets(&board, Pattern::Single, &[c(2, 2)]).unwrap();
        commit(&mut board, &targets.get(c(1, 2)).unwrap().plan.clone()).unwrap();
        assert_eq!(board.height_at(c(1, 2)), 2);
        assert!(!board.is_occupied(c(2, 2)));

        // The merged stack carries both pieces onto the lone enemy
        let targets = legal_targets(&board, Pattern::Single, &[c(1, 2)]).unwrap();
        let hit = targets.get(c(2, 3)).unwrap();
        assert_eq!(hit.entry, Entry::Capture);
        let report = commit(&mut board, &hit.plan.clone()).unwrap();
        assert_eq!(report.captured, vec![(c(2, 3), B)]);
        assert_eq!(report.moved, vec![(c(1, 2), c(2, 3))]);
        assert_eq!(board.height_at(c(2, 3)), 2);
        assert_eq!(board.piece_count(B), 0);
    }

    #[test]
    fn test_commit_rejects_stale_plan() {
        let mut board = board_with(&[(2, 2, W, 0), (2, 3, B, 1)]);
        let plan = MovePlan::Path {
            path: vec![c(2, 2), c(2, 3)],
        };
        assert_eq!(commit(&mut board, &plan), Err(BoardError::MixedStack(c(2, 3))));
        assert_eq!(board.color_at(c(2, 2)), Some(W));
        assert_eq!(board.height_at(c(2, 3)), 2);
    }
}
