use std::collections::VecDeque;

use minesweeper_common::models::Pos;

use crate::grid::{Content, Grid, Visibility};

/// Result of one reveal request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RevealReport {
    /// Safe cells that went from hidden to revealed, in reveal order.
    pub revealed: Vec<Pos>,
    /// Set when the requested cell was a bomb.
    pub detonated: Option<Pos>,
}

impl RevealReport {
    pub fn is_noop(&self) -> bool {
        self.revealed.is_empty() && self.detonated.is_none()
    }
}

/// Reveals `origin` and cascades through connected zero-count cells.
///
/// The worklist may hold a position more than once; a cell is claimed only
/// when it is dequeued while still hidden, so each one is reported once.
/// Flagged cells stop the cascade and bombs are never revealed by it.
pub fn reveal(grid: &mut Grid, origin: Pos) -> RevealReport {
    let mut report = RevealReport::default();

    let Some(cell) = grid.get_mut(origin) else {
        return report;
    };
    if !cell.is_hidden() {
        return report;
    }
    if cell.is_bomb() {
        cell.visibility = Visibility::Revealed;
        report.detonated = Some(origin);
        return report;
    }

    let mut queue = VecDeque::from([origin]);
    while let Some(pos) = queue.pop_front() {
        let Some(cell) = grid.get_mut(pos) else {
            continue;
        };
        if !cell.is_hidden() || cell.is_bomb() {
            continue;
        }

        cell.visibility = Visibility::Revealed;
        let cascades = cell.content == Content::Safe(0);
        report.revealed.push(pos);

        if cascades {
            queue.extend(grid.neighbors(pos).filter(|&neighbor| {
                grid.get(neighbor)
                    .is_some_and(|cell| cell.is_hidden() && !cell.is_bomb())
            }));
        }
    }

    report
}
