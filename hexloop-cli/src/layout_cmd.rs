//! Layout command - write a resolved layout descriptor

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hexloop_core::{BoardLayout, Color};

use crate::render::{render_board, Overlay};

#[derive(Args)]
pub struct LayoutArgs {
    /// Board rows
    #[arg(long, default_value = "10")]
    pub rows: u32,

    /// Board columns
    #[arg(long, default_value = "6")]
    pub columns: u32,

    /// Objective hexes per side
    #[arg(long)]
    pub objectives: Option<u32>,

    /// Pieces per side
    #[arg(long)]
    pub pieces: Option<u32>,

    /// Output JSON file
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,
}

/// Generate, validate and save a layout, then show it
pub fn run(args: LayoutArgs, seed: Option<u64>) -> Result<()> {
    let layout = build_layout(&args, seed)?;

    layout
        .save(&args.output)
        .with_context(|| format!("Failed to write layout: {}", args.output.display()))?;
    tracing::info!(
        "Wrote {}x{} layout (seed {}) to {}",
        layout.rows,
        layout.columns,
        layout.seed.unwrap_or_default(),
        args.output.display()
    );

    let board = layout.build_board().context("Layout does not build")?;
    println!("{}", render_board(&board, &Overlay::default()));
    for color in Color::ALL {
        println!(
            "{}: {} pieces, {} objective hexes",
            color,
            board.piece_count(color),
            board.objective_count(color)
        );
    }
    Ok(())
}

fn build_layout(args: &LayoutArgs, seed: Option<u64>) -> Result<BoardLayout> {
    let mut layout = BoardLayout::new(args.rows, args.columns);
    layout.seed = seed;
    layout.objective_hex_num = args.objectives;
    layout.piece_num = args.pieces;
    layout.resolve().context("Invalid layout settings")
}
