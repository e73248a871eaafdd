use rand::Rng;
use tracing::debug;

use crate::{
    error::{EngineError, Result},
    grid::{Content, Grid},
};

/// Places exactly `bombs` bombs on a fresh `rows x cols` board using the
/// thread-local generator. The board comes back unlabeled.
pub fn generate(rows: usize, cols: usize, bombs: usize) -> Result<Grid> {
    generate_with(&mut rand::rng(), rows, cols, bombs)
}

/// Selection sampling over the flat index space: a single pass in which each
/// cell becomes a bomb with probability `bombs_left / cells_left`. Every
/// subset of the requested size is equally likely and the pass always ends
/// with exactly `bombs` placed.
pub fn generate_with<R: Rng + ?Sized>(
    rng: &mut R,
    rows: usize,
    cols: usize,
    bombs: usize,
) -> Result<Grid> {
    let mut grid = Grid::new(rows, cols)?;
    let cells = grid.len();
    if bombs >= cells {
        return Err(EngineError::InvalidBombCount { bombs, cells });
    }

    let mut bombs_left = bombs;
    for (index, cells_left) in (1..=cells).rev().enumerate() {
        if bombs_left == 0 {
            break;
        }
        if rng.random_range(0..cells_left) < bombs_left {
            grid.cells[index].content = Content::Bomb;
            bombs_left -= 1;
        }
    }

    debug!("Placed {} bombs on a {}x{} board", bombs, rows, cols);
    Ok(grid)
}
