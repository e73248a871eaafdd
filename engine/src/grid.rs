use std::collections::BTreeMap;

use minesweeper_common::models::{CellView, Pos};

use crate::error::{EngineError, Result};

/// What lies under a cell. Fixed once the level has been labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content {
    Bomb,
    Safe(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub content: Content,
    pub visibility: Visibility,
}

impl Cell {
    pub(crate) const HIDDEN_SAFE: Cell = Cell {
        content: Content::Safe(0),
        visibility: Visibility::Hidden,
    };

    pub fn is_bomb(&self) -> bool {
        self.content == Content::Bomb
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility == Visibility::Hidden
    }

    /// How the cell looks to a player while the game is running.
    pub fn view(&self) -> CellView {
        match (self.visibility, self.content) {
            (Visibility::Hidden, _) => CellView::Hidden,
            (Visibility::Flagged, _) => CellView::Flagged,
            (Visibility::Revealed, Content::Bomb) => CellView::Bomb,
            (Visibility::Revealed, Content::Safe(adjacent)) => CellView::Revealed { adjacent },
        }
    }
}

/// Cells that are no longer plain hidden, keyed by position.
pub type TouchedFields = BTreeMap<Pos, CellView>;

/// Fixed-size, row-major board of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    pub(crate) cells: Vec<Cell>,
}

impl Grid {
    /// Largest number of cells a board may have.
    pub const MAX_CELLS: usize = 1 << 24;

    /// Creates a board of hidden, unlabeled safe cells.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let cells = rows
            .checked_mul(cols)
            .filter(|&cells| (1..=Self::MAX_CELLS).contains(&cells))
            .ok_or(EngineError::InvalidDimension { rows, cols })?;

        Ok(Self {
            rows,
            cols,
            cells: vec![Cell::HIDDEN_SAFE; cells],
        })
    }

    /// Creates a board with bombs at exactly the given positions.
    ///
    /// Positions outside the board are skipped. The result is unlabeled.
    pub fn with_bombs(rows: usize, cols: usize, bombs: &[Pos]) -> Result<Self> {
        let mut grid = Self::new(rows, cols)?;
        for &pos in bombs {
            if let Some(cell) = grid.get_mut(pos) {
                cell.content = Content::Bomb;
            }
        }

        let placed = grid.bomb_count();
        if placed >= grid.len() {
            return Err(EngineError::InvalidBombCount {
                bombs: placed,
                cells: grid.len(),
            });
        }
        Ok(grid)
    }

    pub(crate) fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(rows * cols, cells.len());
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.cols && pos.y < self.rows
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos).then_some(pos.x + pos.y * self.cols)
    }

    pub(crate) fn pos_of(&self, index: usize) -> Pos {
        Pos {
            x: index % self.cols,
            y: index / self.cols,
        }
    }

    pub fn get(&self, pos: Pos) -> Option<&Cell> {
        self.index(pos).map(|index| &self.cells[index])
    }

    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut Cell> {
        self.index(pos).map(move |index| &mut self.cells[index])
    }

    /// Row-major iterator over every position on the board.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let (rows, cols) = (self.rows, self.cols);
        (0..rows).flat_map(move |y| (0..cols).map(move |x| Pos { x, y }))
    }

    /// The up to eight positions surrounding `pos`, clipped at the edges.
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + use<> {
        let (rows, cols) = (self.rows, self.cols);
        (-1isize..=1)
            .flat_map(|dy| (-1isize..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .filter_map(move |(dx, dy)| {
                let x = pos.x.checked_add_signed(dx)?;
                let y = pos.y.checked_add_signed(dy)?;
                (x < cols && y < rows).then_some(Pos { x, y })
            })
    }

    pub fn bomb_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_bomb()).count()
    }

    pub fn safe_count(&self) -> usize {
        self.len() - self.bomb_count()
    }

    pub fn revealed_safe_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| !cell.is_bomb() && cell.visibility == Visibility::Revealed)
            .count()
    }

    pub fn flagged_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.visibility == Visibility::Flagged)
            .count()
    }

    /// Every cell that is flagged or revealed, as the player would see it.
    pub fn touched(&self) -> TouchedFields {
        self.positions()
            .zip(&self.cells)
            .filter(|(_, cell)| !cell.is_hidden())
            .map(|(pos, cell)| (pos, cell.view()))
            .collect()
    }

    /// Rows of player-facing cells. With `expose_bombs` every bomb is shown
    /// regardless of visibility, as at the end of a game.
    pub fn view(&self, expose_bombs: bool) -> Vec<Vec<CellView>> {
        self.cells
            .chunks(self.cols)
            .map(|row| {
                row.iter()
                    .map(|cell| match cell.content {
                        Content::Bomb if expose_bombs => CellView::Bomb,
                        _ => cell.view(),
                    })
                    .collect()
            })
            .collect()
    }
}
