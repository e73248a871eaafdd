//! Game-state engine for a grid-based mine-clearing puzzle.
//!
//! A [`GameSession`] owns the level being played. New levels come from
//! [`generator`] or from a save file read by [`codec`]; before a level is
//! playable its safe cells are labeled by [`adjacency`] on the session's
//! worker pool while the presenter prepares its board, and both meet at a
//! [`Rendezvous`]. Afterwards every [`reveal`](GameSession::reveal) and
//! [`mark`](GameSession::mark) runs under one lock, so cascades started by
//! concurrent callers never count a cell twice.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use minesweeper_engine::{GameSession, NullPresenter};
//! use minesweeper_common::models::{Difficulty, Pos};
//!
//! #[tokio::main]
//! async fn main() -> minesweeper_engine::Result<()> {
//!     let session = GameSession::new(Arc::new(NullPresenter));
//!     session.new_game(Difficulty::Easy.params()).await?;
//!     session.reveal(Pos { x: 3, y: 4 }).await;
//!     session.mark(Pos { x: 0, y: 0 }).await;
//!     println!("running: {}", session.is_running().await);
//!     Ok(())
//! }
//! ```

pub mod adjacency;
pub mod codec;
pub mod config;
pub mod error;
pub mod flag;
pub mod generator;
pub mod grid;
pub mod presenter;
pub mod reveal;
pub mod scheduler;
pub mod session;

pub use config::SessionConfig;
pub use error::{EngineError, Result};
pub use grid::{Cell, Content, Grid, TouchedFields, Visibility};
pub use presenter::{FileMode, NullPresenter, Presenter, Prompter};
pub use scheduler::{Rendezvous, Scheduler};
pub use session::{GameSession, SessionSnapshot};
