use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid board dimension {rows}x{cols}: both sides must be at least 1 and the board at most {} cells", crate::grid::Grid::MAX_CELLS)]
    InvalidDimension { rows: usize, cols: usize },

    #[error("invalid bomb count {bombs}: a board of {cells} cells needs at least one safe cell")]
    InvalidBombCount { bombs: usize, cells: usize },

    #[error("malformed save file (line {line}): {reason}")]
    MalformedSaveFile { line: usize, reason: String },

    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no game has been started")]
    NoActiveGame,

    #[error("the game is already over")]
    GameFinished,

    #[error("level startup task failed: {0}")]
    Startup(#[from] tokio::task::JoinError),
}

impl EngineError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        EngineError::MalformedSaveFile {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EngineError::IoFailure {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
