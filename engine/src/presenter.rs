use std::path::PathBuf;

use minesweeper_common::models::{CellView, GameParams, Pos};

/// Callbacks through which a session reports state to whatever displays it.
///
/// Calls may arrive from any task. Every method defaults to doing nothing so
/// an implementation only overrides what it shows.
pub trait Presenter: Send + Sync + 'static {
    /// A new level is about to become playable; build an empty board.
    fn prepare_board(&self, _rows: usize, _cols: usize) {}

    fn update_cell(&self, _pos: Pos, _view: CellView) {}

    fn refresh_board(&self, _board: &[Vec<CellView>]) {}

    fn update_status(&self, _text: &str) {}

    fn update_timer(&self, _seconds: u64) {}

    fn update_flag_counter(&self, _remaining: usize) {}

    fn notify_outcome(&self, _victory: bool) {}
}

/// Presenter for headless sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Load,
    Save,
}

/// Questions a session may ask its collaborator. `None` means cancelled.
pub trait Prompter {
    fn request_new_game_settings(&self) -> Option<GameParams>;

    fn request_file_path(&self, mode: FileMode) -> Option<PathBuf>;
}
