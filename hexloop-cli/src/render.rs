//! ASCII board rendering
//!
//! The highest row prints first. Odd rows are shifted half a cell to the
//! right, matching the board geometry.

use hexloop_core::{
    BoardState, Color, Coord, Entry, IconKind, MovementIcons, Targets,
};

const CELL_WIDTH: usize = 4;

/// Extra marks drawn over the board
#[derive(Default)]
pub struct Overlay<'a> {
    pub selection: &'a [Coord],
    pub targets: Option<&'a Targets>,
    pub icons: Option<&'a MovementIcons>,
}

/// Draw the board with its overlay
pub fn render_board(board: &BoardState, overlay: &Overlay) -> String {
    let grid = board.grid();
    let mut out = String::new();

    for row in (0..grid.rows() as i32).rev() {
        out.push_str(&format!("{:>3} ", row));
        if row % 2 == 1 {
            out.push_str(&" ".repeat(CELL_WIDTH / 2));
        }
        for col in 0..grid.columns() as i32 {
            let glyph = cell_glyph(board, overlay, Coord::new(row, col));
            out.push_str(&format!("{:<width$}", glyph, width = CELL_WIDTH));
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
    }

    out.push_str("    ");
    for col in 0..grid.columns() {
        out.push_str(&format!("{:<width$}", col, width = CELL_WIDTH));
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

/// One-line key to the glyphs
pub fn legend() -> &'static str {
    "W/B piece (digit = stack height), [ ] selected, * objective, \
     ? move target, x capture target, + stack target, > arrow, X attack, S stack"
}

fn cell_glyph(board: &BoardState, overlay: &Overlay, cell: Coord) -> String {
    if let Some(kind) = overlay.icons.and_then(|icons| icons.icon_at(cell)) {
        return match kind {
            IconKind::Arrow => ">",
            IconKind::AttackMark => "X",
            IconKind::StackMark => "S",
        }
        .to_string();
    }

    if let Some(target) = overlay.targets.and_then(|t| t.get(cell)) {
        return match target.entry {
            Entry::Move => "?",
            Entry::Capture => "x",
            Entry::Stack => "+",
        }
        .to_string();
    }

    match board.stack_at(cell) {
        Some(stack) => {
            let mut glyph = match stack.color() {
                Color::White => "W".to_string(),
                Color::Black => "B".to_string(),
            };
            if stack.height() > 1 {
                glyph.push_str(&stack.height().to_string());
            }
            if overlay.selection.contains(&cell) {
                glyph = format!("[{}]", glyph);
            }
            glyph
        }
        None if board.objective_at(cell).is_some() => "*".to_string(),
        None => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexloop_core::{legal_targets, BoardLayout, Pattern};

    #[test]
    fn test_rows_print_top_down_with_offset() {
        let board = BoardLayout::empty(2, 3)
            .with_piece(0, 0, Color::White, 2)
            .with_piece(1, 2, Color::Black, 0)
            .with_objective(1, 0)
            .build_board()
            .unwrap();
        let text = render_board(&board, &Overlay::default());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "  1   *   .   B");
        assert_eq!(lines[1], "  0 W3  .   .");
        assert_eq!(lines[2], "    0   1   2");
    }

    #[test]
    fn test_overlay_marks() {
        let board = BoardLayout::empty(2, 3)
            .with_piece(0, 0, Color::White, 0)
            .with_piece(0, 1, Color::Black, 0)
            .build_board()
            .unwrap();
        let selection = [Coord::new(0, 0)];
        let targets = legal_targets(&board, Pattern::Single, &selection).unwrap();
        let overlay = Overlay {
            selection: &selection,
            targets: Some(&targets),
            icons: None,
        };
        let text = render_board(&board, &overlay);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "  0 [W] x   .");
        assert_eq!(lines[0], "  1   ?   .   .");
    }
}
