//! Play and replay commands - drive a match from text commands
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_play(), run_replay() - orchestration
//! - Level 2: start_game(), run_session(), report_results()
//! - Level 3: parse_command(), execute()
//! - Level 4: formatting utilities

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;

use hexloop_core::{
    format_hms, BoardLayout, Color, Coord, EndMoveOutcome, Game, MatchResult, MoveError, Pattern,
    PatternChoice, Phase, RulesConfig,
};

use crate::render::{legend, render_board, Overlay};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

/// Match setup shared by `play` and `replay`
#[derive(Args, Clone, Debug, Default)]
pub struct MatchSetup {
    /// Layout descriptor JSON file (default: generated standard board)
    #[arg(long, value_name = "FILE")]
    pub layout: Option<PathBuf>,

    /// Rules configuration JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub setup: MatchSetup,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Command script, one command per line
    #[arg(long, value_name = "FILE")]
    pub script: PathBuf,

    #[command(flatten)]
    pub setup: MatchSetup,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One line of player input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Select(Coord),
    Deselect,
    Pattern(Pattern),
    Go(Coord),
    Hover(Coord),
    Random,
    Board,
    Status,
    Quit,
}

/// How random generation waits out its delay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Clock {
    /// Sleep for the configured wait
    Realtime,
    /// Jump straight past the wait
    Simulated,
}

/// What a session did
#[derive(Debug, Default)]
struct SessionReport {
    commands: usize,
    rejected: usize,
    result: Option<MatchResult>,
}

enum Flow {
    Continue,
    Stop,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run an interactive match on stdin
pub fn run_play(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let mut game = start_game(&args.setup, seed)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", legend())?;
    writeln!(out, "{}", render_board(game.board(), &Overlay::default()))?;
    print_status(&game, &mut out)?;

    let stdin = std::io::stdin();
    let report = run_session(&mut game, stdin.lock(), &mut out, Clock::Realtime, false)?;
    print_text_results(&game, &report, &mut out)?;
    Ok(())
}

/// Replay a command script and report the outcome
///
/// 1. Set up the match
/// 2. Feed every script line through the session
/// 3. Report results
pub fn run_replay(args: ReplayArgs, seed: Option<u64>) -> Result<()> {
    let mut game = start_game(&args.setup, seed)?;
    let script = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script: {}", args.script.display()))?;

    tracing::info!("Replaying {}", args.script.display());

    // JSON mode keeps stdout for the final record only
    let mut sink: Box<dyn Write> = if args.json {
        Box::new(std::io::sink())
    } else {
        Box::new(std::io::stdout())
    };
    let report = run_session(&mut game, script.as_bytes(), &mut sink, Clock::Simulated, true)?;

    report_results(&game, &report, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load layout and rules, then start the match
fn start_game(setup: &MatchSetup, seed: Option<u64>) -> Result<Game> {
    let mut layout = match &setup.layout {
        Some(path) => BoardLayout::load(path)
            .with_context(|| format!("Failed to load layout: {}", path.display()))?,
        None => BoardLayout::standard(),
    };
    if let Some(seed) = seed {
        layout.seed = Some(seed);
    }

    let config = match &setup.config {
        Some(path) => RulesConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => RulesConfig::default(),
    };

    let game = Game::new(&layout, config).context("Failed to start match")?;
    tracing::info!(
        "Seed {} ({} to move)",
        game.layout().seed.unwrap_or_default(),
        game.active()
    );
    Ok(game)
}

/// Execute commands until the input ends, `quit`, or the match is decided.
///
/// With `strict`, an unparseable line aborts the session; otherwise it is
/// reported and skipped.
fn run_session<R: BufRead, W: Write>(
    game: &mut Game,
    input: R,
    out: &mut W,
    clock: Clock,
    strict: bool,
) -> Result<SessionReport> {
    let mut report = SessionReport::default();

    for (number, line) in input.lines().enumerate() {
        let line = line.context("Failed to read command")?;
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) if strict => return Err(e.context(format!("line {}", number + 1))),
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };

        report.commands += 1;
        match execute(game, command, out, clock) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Stop) => break,
            Err(e) => {
                report.rejected += 1;
                tracing::debug!("rejected {:?}: {}", command, e);
                writeln!(out, "{}", e)?;
            }
        }

        if game.phase() == Phase::MatchOver {
            break;
        }
    }

    report.result = game.result().cloned();
    Ok(report)
}

/// Report session results
fn report_results(game: &Game, report: &SessionReport, json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        print_json_results(game, report, &mut out)
    } else {
        print_text_results(game, report, &mut out)
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Parse one input line. Blank lines and `#` comments yield `None`.
fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.split('#').next().unwrap_or_default();
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match word.to_ascii_lowercase().as_str() {
        "select" | "s" => Command::Select(parse_coord(&args)?),
        "deselect" => Command::Deselect,
        "go" | "g" => Command::Go(parse_coord(&args)?),
        "hover" | "h" => Command::Hover(parse_coord(&args)?),
        "random" => Command::Random,
        "board" | "b" => Command::Board,
        "status" => Command::Status,
        "quit" | "q" => Command::Quit,
        other => match Pattern::from_name(other) {
            Some(pattern) => Command::Pattern(pattern),
            None => bail!("unknown command: {}", other),
        },
    };
    Ok(Some(command))
}

/// Apply one command. A refused action comes back as the error to show.
fn execute<W: Write>(game: &mut Game, command: Command, out: &mut W, clock: Clock) -> Result<Flow> {
    match command {
        Command::Select(cell) => {
            game.select(cell)?;
            writeln!(out, "selected: {}", format_cells(game.selection()))?;
        }
        Command::Deselect => {
            game.deselect_all()?;
            writeln!(out, "selection cleared")?;
        }
        Command::Pattern(pattern) => match game.choose_pattern(pattern)? {
            PatternChoice::Highlighted(count) => {
                writeln!(out, "{}: {} targets", pattern, count)?;
                let overlay = Overlay {
                    selection: game.selection(),
                    targets: game.legal_targets(),
                    icons: None,
                };
                writeln!(out, "{}", render_board(game.board(), &overlay))?;
            }
            PatternChoice::Cancelled(active) => writeln!(out, "{} cancelled", active)?,
        },
        Command::Go(cell) => {
            let mover = game.active();
            let report = game.commit_move(cell)?;
            for (at, color) in &report.captured {
                writeln!(out, "{} captured a {} piece at {}", mover, color, at)?;
            }
            let outcome = game.end_move()?;
            print_outcome(&outcome, out)?;
        }
        Command::Hover(cell) => {
            let icons = game.preview(cell).ok_or(MoveError::NotATarget(cell))?;
            let overlay = Overlay {
                selection: game.selection(),
                targets: game.legal_targets(),
                icons: Some(&icons),
            };
            writeln!(out, "{}", render_board(game.board(), &overlay))?;
        }
        Command::Random => {
            let started = Instant::now();
            let cells = game.generate_random(started)?;
            writeln!(out, "{} placed pieces at {}", game.active(), format_cells(&cells))?;
            let wait = game.config().random_generation_wait();
            let now = match clock {
                Clock::Realtime => {
                    thread::sleep(wait);
                    Instant::now()
                }
                Clock::Simulated => started + wait,
            };
            if let Some(outcome) = game.tick(now)? {
                print_outcome(&outcome, out)?;
            }
        }
        Command::Board => {
            let overlay = Overlay {
                selection: game.selection(),
                targets: game.legal_targets(),
                icons: None,
            };
            writeln!(out, "{}", render_board(game.board(), &overlay))?;
        }
        Command::Status => print_status(game, out)?,
        Command::Quit => return Ok(Flow::Stop),
    }
    Ok(Flow::Continue)
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn parse_coord(args: &[&str]) -> Result<Coord> {
    let [row, col] = args else {
        bail!("expected a row and a column");
    };
    let row = row.parse().with_context(|| format!("invalid row: {}", row))?;
    let col = col.parse().with_context(|| format!("invalid column: {}", col))?;
    Ok(Coord::new(row, col))
}

fn format_cells(cells: &[Coord]) -> String {
    if cells.is_empty() {
        return "none".to_string();
    }
    cells.iter().map(Coord::to_string).collect::<Vec<_>>().join(" ")
}

fn print_outcome<W: Write>(outcome: &EndMoveOutcome, out: &mut W) -> Result<()> {
    match outcome {
        EndMoveOutcome::Continue { bonus: 0 } => {}
        EndMoveOutcome::Continue { bonus } => writeln!(out, "loop closed: +{} moves", bonus)?,
        EndMoveOutcome::TurnPassed { next } => writeln!(out, "turn passes to {}", next)?,
        EndMoveOutcome::Won(result) => writeln!(out, "{} wins!", result.winner)?,
    }
    Ok(())
}

fn print_status<W: Write>(game: &Game, out: &mut W) -> Result<()> {
    let turn = game.current_turn();
    let budget = game.move_budget();
    writeln!(
        out,
        "Turn {}: {} to move ({} of {} moves used)",
        turn.turn_count, turn.active, budget.moves_taken, budget.max_moves
    )?;
    for color in Color::ALL {
        writeln!(
            out,
            "  {}: {} pieces, objectives {}/{}",
            color,
            game.board().piece_count(color),
            game.board().occupied_objectives(color),
            game.hexes_needed(color)
        )?;
    }
    Ok(())
}

/// Print results as JSON
fn print_json_results<W: Write>(game: &Game, report: &SessionReport, out: &mut W) -> Result<()> {
    #[derive(serde::Serialize)]
    #[serde(rename_all = "camelCase")]
    struct JsonOutput<'a> {
        finished: bool,
        seed: Option<u64>,
        turn: u32,
        active: Color,
        commands: usize,
        rejected: usize,
        result: Option<&'a MatchResult>,
    }

    let output = JsonOutput {
        finished: report.result.is_some(),
        seed: game.layout().seed,
        turn: game.current_turn().turn_count,
        active: game.active(),
        commands: report.commands,
        rejected: report.rejected,
        result: report.result.as_ref(),
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

/// Print results as text
fn print_text_results<W: Write>(game: &Game, report: &SessionReport, out: &mut W) -> Result<()> {
    writeln!(out, "\n=== Match Results ===")?;
    writeln!(out, "Commands:  {} ({} rejected)", report.commands, report.rejected)?;

    let Some(result) = &report.result else {
        writeln!(out, "Unfinished after {} turns", game.current_turn().turn_count)?;
        return Ok(());
    };
    writeln!(out, "Winner:    {}", result.winner)?;
    writeln!(out, "Turns:     {}", result.turns)?;
    writeln!(out, "Elapsed:   {}", format_hms(result.duration))?;
    for color in Color::ALL {
        let stats = result.stats(color);
        writeln!(
            out,
            "{:<10} {} moves, {} objective hexes",
            format!("{}:", color),
            stats.moves_taken,
            stats.objective_hexes_occupied
        )?;
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
