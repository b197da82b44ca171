//! Movement icons shown while hovering a highlighted target

use crate::board::Coord;
use crate::movement::{MovePlan, Target};
use crate::state::BoardState;

/// Icon variants a preview can show
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IconKind {
    Arrow,
    AttackMark,
    StackMark,
}

/// Icons for one hovered target, one list per variant
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementIcons {
    /// (from, to) cell pairs
    pub arrows: Vec<(Coord, Coord)>,
    pub attack_marks: Vec<Coord>,
    pub stack_marks: Vec<Coord>,
}

impl MovementIcons {
    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty() && self.attack_marks.is_empty() && self.stack_marks.is_empty()
    }

    pub fn count(&self, kind: IconKind) -> usize {
        match kind {
            IconKind::Arrow => self.arrows.len(),
            IconKind::AttackMark => self.attack_marks.len(),
            IconKind::StackMark => self.stack_marks.len(),
        }
    }

    /// Icon drawn on a cell. Marks win over the arrow ending there.
    pub fn icon_at(&self, cell: Coord) -> Option<IconKind> {
        if self.attack_marks.contains(&cell) {
            Some(IconKind::AttackMark)
        } else if self.stack_marks.contains(&cell) {
            Some(IconKind::StackMark)
        } else if self.arrows.iter().any(|&(_, to)| to == cell) {
            Some(IconKind::Arrow)
        } else {
            None
        }
    }
}

/// Icons describing what committing `target` would do
pub fn preview(board: &BoardState, target: &Target) -> MovementIcons {
    let mut icons = MovementIcons::default();

    match &target.plan {
        MovePlan::Path { path } | MovePlan::Unstack { line: path } => {
            let Some(&source) = path.first() else {
                return icons;
            };
            let mover = board.color_at(source);
            icons.arrows = path.windows(2).map(|w| (w[0], w[1])).collect();
            for &cell in &path[1..] {
                match board.color_at(cell) {
                    Some(color) if Some(color) != mover => icons.attack_marks.push(cell),
                    Some(_) if cell == target.cell => icons.stack_marks.push(cell),
                    _ => {}
                }
            }
        }
        MovePlan::Strike { target, .. } => icons.attack_marks.push(*target),
        MovePlan::Wave {
            cells,
            direction,
            bounce,
        } => {
            for &cell in cells {
                let Some(next) = board.grid().neighbor(cell, *direction) else {
                    continue;
                };
                if board.is_occupied(next) {
                    icons.attack_marks.push(next);
                } else if !bounce {
                    icons.arrows.push((cell, next));
                }
            }
        }
    }
    icons
}
