//! Line-oriented text format for persisting a board.
//!
//! One line per row and one character per cell:
//!
//! | char      | meaning                          |
//! |-----------|----------------------------------|
//! | `@`       | hidden bomb                      |
//! | `O`       | hidden safe cell                 |
//! | `0`..`8`  | revealed safe cell and its count |
//! | `P`       | flagged safe cell                |
//! | `#`       | flagged bomb                     |
//!
//! Counts of hidden cells are not stored; a decoded board must be labeled
//! again before play.

use std::path::Path;

use tracing::{debug, warn};

use crate::{
    error::{EngineError, Result},
    grid::{Cell, Content, Grid, Visibility},
};

pub const BOMB: char = '@';
pub const UNTOUCHED: char = 'O';
pub const FLAGGED: char = 'P';
pub const FLAGGED_BOMB: char = '#';

/// Encodes a single cell. A revealed bomb has no symbol of its own and is
/// written as a hidden one.
pub fn encode_cell(cell: &Cell) -> char {
    match (cell.content, cell.visibility) {
        (Content::Bomb, Visibility::Flagged) => FLAGGED_BOMB,
        (Content::Bomb, _) => BOMB,
        (Content::Safe(_), Visibility::Hidden) => UNTOUCHED,
        (Content::Safe(_), Visibility::Flagged) => FLAGGED,
        (Content::Safe(adjacent), Visibility::Revealed) => char::from(b'0' + adjacent.min(8)),
    }
}

pub fn decode_cell(symbol: char) -> Option<Cell> {
    let (content, visibility) = match symbol {
        BOMB => (Content::Bomb, Visibility::Hidden),
        FLAGGED_BOMB => (Content::Bomb, Visibility::Flagged),
        UNTOUCHED => (Content::Safe(0), Visibility::Hidden),
        FLAGGED => (Content::Safe(0), Visibility::Flagged),
        '0'..='8' => (Content::Safe(symbol as u8 - b'0'), Visibility::Revealed),
        _ => return None,
    };
    Some(Cell {
        content,
        visibility,
    })
}

pub fn encode(grid: &Grid) -> String {
    let mut text = String::with_capacity(grid.len() + grid.rows());
    for (index, cell) in grid.cells.iter().enumerate() {
        text.push(encode_cell(cell));
        if (index + 1) % grid.cols() == 0 {
            text.push('\n');
        }
    }
    text
}

/// Parses a saved board. Line numbers in errors are 1-based.
pub fn decode(text: &str) -> Result<Grid> {
    let mut cells = Vec::new();
    let mut rows = 0;
    let mut cols = None;

    for (number, line) in text.lines().enumerate().map(|(i, line)| (i + 1, line)) {
        let width = line.chars().count();
        match cols {
            None if width == 0 => return Err(EngineError::malformed(number, "empty row")),
            None => cols = Some(width),
            Some(expected) if expected != width => {
                return Err(EngineError::malformed(
                    number,
                    format!("row has {width} cells, expected {expected}"),
                ));
            }
            Some(_) => {}
        }

        for (column, symbol) in line.chars().enumerate() {
            let cell = decode_cell(symbol).ok_or_else(|| {
                EngineError::malformed(
                    number,
                    format!("unexpected character {symbol:?} in column {}", column + 1),
                )
            })?;
            cells.push(cell);
        }
        rows += 1;
    }

    let Some(cols) = cols else {
        return Err(EngineError::malformed(0, "file contains no rows"));
    };

    if cells.len() > Grid::MAX_CELLS {
        return Err(EngineError::malformed(0, "board has too many cells"));
    }

    let grid = Grid::from_cells(rows, cols, cells);
    check_playable(&grid)?;
    Ok(grid)
}

/// A board can be played only if some safe cell is still hidden and there
/// are no more flags than bombs.
pub fn check_playable(grid: &Grid) -> Result<()> {
    if grid.safe_count() == 0 {
        return Err(EngineError::malformed(0, "board has no safe cells"));
    }
    if grid.revealed_safe_count() == grid.safe_count() {
        return Err(EngineError::malformed(0, "every safe cell is already revealed"));
    }
    let (flags, bombs) = (grid.flagged_count(), grid.bomb_count());
    if flags > bombs {
        return Err(EngineError::malformed(
            0,
            format!("{flags} flags placed but only {bombs} bombs"),
        ));
    }
    Ok(())
}

pub async fn save(path: &Path, grid: &Grid) -> Result<()> {
    tokio::fs::write(path, encode(grid)).await.map_err(|e| {
        warn!("Failed to write save file {}: {}", path.display(), e);
        EngineError::io(path, e)
    })?;
    debug!(
        "Saved {}x{} board to {}",
        grid.rows(),
        grid.cols(),
        path.display()
    );
    Ok(())
}

pub async fn load(path: &Path) -> Result<Grid> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        warn!("Failed to read save file {}: {}", path.display(), e);
        EngineError::io(path, e)
    })?;
    let grid = decode(&text)?;
    debug!(
        "Loaded {}x{} board from {}",
        grid.rows(),
        grid.cols(),
        path.display()
    );
    Ok(grid)
}
