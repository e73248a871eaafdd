#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use minesweeper_common::models::{CellView, GameParams, Pos};
use minesweeper_engine::{FileMode, GameSession, Presenter, Prompter, SessionConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Prepare { rows: usize, cols: usize },
    Cell(Pos, CellView),
    Refresh(Vec<Vec<CellView>>),
    Status(String),
    Timer(u64),
    Flags(usize),
    Outcome(bool),
}

/// Presenter that remembers every call it receives.
#[derive(Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<Event>>,
}

impl RecordingPresenter {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn cell_updates(&self, pos: Pos) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Cell(p, _) if *p == pos))
            .count()
    }

    pub fn outcomes(&self) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Outcome(victory) => Some(victory),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|event| match event {
            Event::Status(text) => Some(text),
            _ => None,
        })
    }

    pub fn timer_ticks(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Timer(seconds) => Some(seconds),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn prepare_board(&self, rows: usize, cols: usize) {
        self.push(Event::Prepare { rows, cols });
    }

    fn update_cell(&self, pos: Pos, view: CellView) {
        self.push(Event::Cell(pos, view));
    }

    fn refresh_board(&self, board: &[Vec<CellView>]) {
        self.push(Event::Refresh(board.to_vec()));
    }

    fn update_status(&self, text: &str) {
        self.push(Event::Status(text.to_string()));
    }

    fn update_timer(&self, seconds: u64) {
        self.push(Event::Timer(seconds));
    }

    fn update_flag_counter(&self, remaining: usize) {
        self.push(Event::Flags(remaining));
    }

    fn notify_outcome(&self, victory: bool) {
        self.push(Event::Outcome(victory));
    }
}

/// Prompter with canned answers.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub settings: Option<GameParams>,
    pub path: Option<PathBuf>,
    pub asked: Mutex<Vec<FileMode>>,
}

impl Prompter for ScriptedPrompter {
    fn request_new_game_settings(&self) -> Option<GameParams> {
        self.settings
    }

    fn request_file_path(&self, mode: FileMode) -> Option<PathBuf> {
        self.asked.lock().unwrap().push(mode);
        self.path.clone()
    }
}

/// Session whose timer is too slow to tick during a test, so snapshots
/// taken a moment apart compare equal.
pub fn recorded_session() -> (Arc<GameSession>, Arc<RecordingPresenter>) {
    ticking_session(Duration::from_secs(3600))
}

pub fn ticking_session(tick: Duration) -> (Arc<GameSession>, Arc<RecordingPresenter>) {
    // Another test may already have installed it.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let presenter = Arc::new(RecordingPresenter::default());
    let config = SessionConfig {
        tick,
        ..SessionConfig::default()
    };
    let session = Arc::new(GameSession::with_config(presenter.clone(), config));
    (session, presenter)
}

pub fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{label}-{}.txt", uuid::Uuid::new_v4()))
}
