use minesweeper_common::models::Pos;

use crate::grid::{Grid, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChange {
    Placed,
    Removed,
    Unchanged,
}

/// Toggles the flag on a hidden cell, spending or refunding one unit of
/// `budget`. Revealed cells, unknown positions and an exhausted budget leave
/// everything as it was.
pub fn toggle(grid: &mut Grid, pos: Pos, budget: &mut usize) -> FlagChange {
    let Some(cell) = grid.get_mut(pos) else {
        return FlagChange::Unchanged;
    };

    match cell.visibility {
        Visibility::Revealed => FlagChange::Unchanged,
        Visibility::Hidden if *budget == 0 => FlagChange::Unchanged,
        Visibility::Hidden => {
            cell.visibility = Visibility::Flagged;
            *budget -= 1;
            FlagChange::Placed
        }
        Visibility::Flagged => {
            cell.visibility = Visibility::Hidden;
            *budget += 1;
            FlagChange::Removed
        }
    }
}
