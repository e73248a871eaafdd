use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use minesweeper_common::models::{CellView, GameParams, Pos};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, instrument, warn};

use crate::{
    adjacency, codec,
    config::SessionConfig,
    error::{EngineError, Result},
    flag::{self, FlagChange},
    generator,
    grid::Grid,
    presenter::{FileMode, Presenter, Prompter},
    reveal,
    scheduler::{Rendezvous, Scheduler},
};

const DEFEAT_MESSAGE: &str = "Dude, you had ONE job...";
const VICTORY_MESSAGE: &str = "You have WON this level !!!";

/// Read-only copy of a session's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub bombs: usize,
    pub flags_remaining: usize,
    pub safe_remaining: usize,
    pub running: bool,
    pub victory: bool,
    pub elapsed_seconds: u64,
    pub board: Vec<Vec<CellView>>,
}

/// The level currently being played. Only touched under the session lock.
struct Level {
    grid: Grid,
    bombs: usize,
    flags_remaining: usize,
    safe_remaining: usize,
    running: bool,
    victory: bool,
    elapsed: Arc<AtomicU64>,
    timer: Option<JoinHandle<()>>,
}

impl Level {
    fn survey(grid: Grid) -> Self {
        let bombs = grid.bomb_count();
        let flags_remaining = bombs.saturating_sub(grid.flagged_count());
        let safe_remaining = grid.safe_count() - grid.revealed_safe_count();
        Self {
            grid,
            bombs,
            flags_remaining,
            safe_remaining,
            running: safe_remaining > 0,
            victory: safe_remaining == 0,
            elapsed: Arc::new(AtomicU64::new(0)),
            timer: None,
        }
    }

    fn status_line(&self) -> String {
        format!(
            "Size: {}x{} (Safe: {} Bombs: {})",
            self.grid.rows(),
            self.grid.cols(),
            self.safe_remaining,
            self.bombs
        )
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            bombs: self.bombs,
            flags_remaining: self.flags_remaining,
            safe_remaining: self.safe_remaining,
            running: self.running,
            victory: self.victory,
            elapsed_seconds: self.elapsed.load(Ordering::Relaxed),
            board: self.grid.view(!self.running),
        }
    }
}

impl Drop for Level {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

/// One player's game: owns the active level and serializes every change to it.
///
/// All board mutations go through a single async mutex. A level only becomes
/// visible to `reveal`/`mark` after it has been labeled and the presenter has
/// prepared its board; until then the previous level stays playable.
pub struct GameSession {
    level: Mutex<Option<Level>>,
    starting: Mutex<()>,
    presenter: Arc<dyn Presenter>,
    scheduler: Scheduler,
    tick: Duration,
}

impl GameSession {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self::with_config(presenter, SessionConfig::default())
    }

    pub fn with_config(presenter: Arc<dyn Presenter>, config: SessionConfig) -> Self {
        Self {
            level: Mutex::new(None),
            starting: Mutex::new(()),
            presenter,
            scheduler: Scheduler::new(config.workers),
            tick: config.tick,
        }
    }

    /// Starts a freshly generated level. Invalid parameters leave the
    /// current level untouched.
    #[instrument(level = "trace", skip(self), fields(rows = params.rows, cols = params.cols, bombs = params.bombs))]
    pub async fn new_game(&self, params: GameParams) -> Result<()> {
        let grid = generator::generate(params.rows, params.cols, params.bombs).inspect_err(|e| {
            warn!("Rejected new game settings: {}", e);
        })?;
        self.start(grid).await
    }

    /// Starts a level from a prepared board, keeping any flags or revealed
    /// cells it already has. The board is labeled before play. Boards that
    /// are already cleared or carry more flags than bombs are rejected.
    pub async fn start_with_grid(&self, grid: Grid) -> Result<()> {
        codec::check_playable(&grid).inspect_err(|e| {
            warn!("Rejected prepared board: {}", e);
        })?;
        self.start(grid).await
    }

    /// Asks the collaborator for settings. Returns `false` if it cancelled.
    pub async fn new_game_interactive<P: Prompter + ?Sized>(&self, prompter: &P) -> Result<bool> {
        let Some(params) = prompter.request_new_game_settings() else {
            debug!("New game cancelled");
            return Ok(false);
        };
        self.new_game(params).await?;
        Ok(true)
    }

    #[instrument(level = "trace", skip(self, path), fields(path = %path.display()))]
    pub async fn load_from_file(&self, path: &Path) -> Result<()> {
        match codec::load(path).await {
            Ok(grid) => {
                info!("Loading saved level from {}", path.display());
                self.start(grid).await
            }
            Err(e) => {
                warn!("Keeping current level, load failed: {}", e);
                self.presenter.update_status(&format!("Load failed: {e}"));
                Err(e)
            }
        }
    }

    pub async fn load_interactive<P: Prompter + ?Sized>(&self, prompter: &P) -> Result<bool> {
        let Some(path) = prompter.request_file_path(FileMode::Load) else {
            debug!("Load cancelled");
            return Ok(false);
        };
        self.load_from_file(&path).await?;
        Ok(true)
    }

    /// Writes the running level to `path`. The lock is released before any
    /// file IO starts.
    #[instrument(level = "trace", skip(self, path), fields(path = %path.display()))]
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let grid = {
            let level = self.level.lock().await;
            let level = level.as_ref().ok_or(EngineError::NoActiveGame)?;
            if !level.running {
                return Err(EngineError::GameFinished);
            }
            level.grid.clone()
        };

        match codec::save(path, &grid).await {
            Ok(()) => {
                info!("Saved level to {}", path.display());
                self.presenter
                    .update_status(&format!("Saved to {}", path.display()));
                Ok(())
            }
            Err(e) => {
                self.presenter.update_status(&format!("Save failed: {e}"));
                Err(e)
            }
        }
    }

    pub async fn save_interactive<P: Prompter + ?Sized>(&self, prompter: &P) -> Result<bool> {
        let Some(path) = prompter.request_file_path(FileMode::Save) else {
            debug!("Save cancelled");
            return Ok(false);
        };
        self.save_to_file(&path).await?;
        Ok(true)
    }

    /// Labels `grid` and brings it into play.
    ///
    /// The labeling task and the presenter's board preparation run on the
    /// pool and meet this task at a three-party rendezvous; the level is
    /// installed only after all three have arrived.
    async fn start(&self, grid: Grid) -> Result<()> {
        let _starting = self.starting.lock().await;
        let (rows, cols) = (grid.rows(), grid.cols());
        let rendezvous = Rendezvous::new(3);

        let labeling = {
            let rendezvous = rendezvous.clone();
            let mut grid = grid;
            self.scheduler.submit(async move {
                rendezvous
                    .arrive_after(|| adjacency::label(&mut grid))
                    .await;
                debug!("Labeled {}x{} board", rows, cols);
                grid
            })
        };

        let preparing = {
            let rendezvous = rendezvous.clone();
            let presenter = self.presenter.clone();
            self.scheduler.submit(async move {
                rendezvous
                    .arrive_after(|| presenter.prepare_board(rows, cols))
                    .await;
            })
        };

        rendezvous.arrive().await;
        let grid = labeling.await.inspect_err(|e| {
            warn!("Labeling failed, keeping current level: {}", e);
        })?;
        preparing.await.inspect_err(|e| {
            warn!("Board preparation failed, keeping current level: {}", e);
        })?;

        let mut level = Level::survey(grid);
        let touched = level.grid.touched();
        debug!("Level layout:\n{}", codec::encode(&level.grid));

        let mut current = self.level.lock().await;
        for (&pos, &view) in &touched {
            self.presenter.update_cell(pos, view);
        }
        self.presenter.update_flag_counter(level.flags_remaining);
        self.presenter.update_timer(0);
        self.presenter.update_status(&level.status_line());
        if level.running {
            level.timer = Some(self.start_timer(level.elapsed.clone()));
        }

        info!(
            "Started {}x{} level with {} bombs ({} cells already touched)",
            rows,
            cols,
            level.bombs,
            touched.len()
        );
        // Replacing the previous level drops it, which stops its timer.
        *current = Some(level);
        Ok(())
    }

    fn start_timer(&self, elapsed: Arc<AtomicU64>) -> JoinHandle<()> {
        let presenter = self.presenter.clone();
        self.scheduler.every(self.tick, move || {
            let seconds = elapsed.fetch_add(1, Ordering::Relaxed) + 1;
            presenter.update_timer(seconds);
        })
    }

    /// Reveals the cell at `pos`, cascading through empty neighbors.
    /// Returns how many safe cells were uncovered.
    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub async fn reveal(&self, pos: Pos) -> usize {
        let mut current = self.level.lock().await;
        let Some(level) = current.as_mut() else {
            debug!("Ignoring reveal, no level in play");
            return 0;
        };
        if !level.running {
            debug!("Ignoring reveal on finished game at ({}, {})", pos.x, pos.y);
            return 0;
        }
        if !level.grid.contains(pos) {
            warn!("Invalid reveal position: ({}, {})", pos.x, pos.y);
            return 0;
        }

        let report = reveal::reveal(&mut level.grid, pos);
        for &cell in &report.revealed {
            if let Some(revealed) = level.grid.get(cell) {
                self.presenter.update_cell(cell, revealed.view());
            }
        }
        level.safe_remaining -= report.revealed.len();

        if let Some(bomb) = report.detonated {
            self.presenter.update_cell(bomb, CellView::Bomb);
            self.game_over(level, bomb);
        } else if level.safe_remaining == 0 {
            self.game_victory(level);
        } else if !report.is_noop() {
            debug!(
                "Revealed {} cells, {} safe cells left",
                report.revealed.len(),
                level.safe_remaining
            );
            self.presenter.update_status(&level.status_line());
        }

        report.revealed.len()
    }

    /// Flags or unflags the cell at `pos`. Returns whether anything changed.
    #[instrument(level = "trace", skip(self), fields(x = pos.x, y = pos.y))]
    pub async fn mark(&self, pos: Pos) -> bool {
        let mut current = self.level.lock().await;
        let Some(level) = current.as_mut() else {
            return false;
        };
        if !level.running {
            debug!("Ignoring flag on finished game at ({}, {})", pos.x, pos.y);
            return false;
        }

        let change = flag::toggle(&mut level.grid, pos, &mut level.flags_remaining);
        if change == FlagChange::Unchanged {
            debug!("Flag at ({}, {}) left unchanged", pos.x, pos.y);
            return false;
        }

        if let Some(cell) = level.grid.get(pos) {
            self.presenter.update_cell(pos, cell.view());
        }
        self.presenter.update_flag_counter(level.flags_remaining);
        debug!(
            "Cell ({}, {}) {:?}, {} flags left",
            pos.x, pos.y, change, level.flags_remaining
        );
        true
    }

    fn game_over(&self, level: &mut Level, bomb: Pos) {
        warn!("Player hit bomb at ({}, {}) - game over!", bomb.x, bomb.y);
        level.running = false;
        level.victory = false;
        level.stop_timer();

        self.presenter.refresh_board(&level.grid.view(true));
        self.presenter.update_status(DEFEAT_MESSAGE);
        self.presenter.notify_outcome(false);
    }

    fn game_victory(&self, level: &mut Level) {
        info!(
            "Game won after {}s! All safe cells revealed.",
            level.elapsed.load(Ordering::Relaxed)
        );
        level.running = false;
        level.victory = true;
        level.stop_timer();

        self.presenter.refresh_board(&level.grid.view(true));
        self.presenter.update_status(VICTORY_MESSAGE);
        self.presenter.notify_outcome(true);
    }

    pub async fn is_running(&self) -> bool {
        self.level
            .lock()
            .await
            .as_ref()
            .is_some_and(|level| level.running)
    }

    pub async fn is_victory(&self) -> bool {
        self.level
            .lock()
            .await
            .as_ref()
            .is_some_and(|level| level.victory)
    }

    pub async fn flags_remaining(&self) -> Option<usize> {
        self.level
            .lock()
            .await
            .as_ref()
            .map(|level| level.flags_remaining)
    }

    pub async fn safe_cells_remaining(&self) -> Option<usize> {
        self.level
            .lock()
            .await
            .as_ref()
            .map(|level| level.safe_remaining)
    }

    pub async fn elapsed_seconds(&self) -> u64 {
        self.level
            .lock()
            .await
            .as_ref()
            .map_or(0, |level| level.elapsed.load(Ordering::Relaxed))
    }

    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.level.lock().await.as_ref().map(Level::snapshot)
    }

    /// The current board in save-file notation.
    pub async fn level_text(&self) -> Option<String> {
        self.level
            .lock()
            .await
            .as_ref()
            .map(|level| codec::encode(&level.grid))
    }
}
