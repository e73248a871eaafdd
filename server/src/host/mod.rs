use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex as StdMutex},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use rocket::futures::{SinkExt, future::join_all, stream::SplitSink};
use rocket_ws::{Message, stream::DuplexStream};
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use minesweeper_common::{
    models::{CellView, GameParams, Pos},
    protocol::ServerMessage,
};
use minesweeper_engine::{GameSession, Presenter, Result, SessionConfig};

pub type Tables = Arc<DashMap<String, Arc<Table>>>;

type Sink = SplitSink<DuplexStream, Message>;
type Streams = Arc<Mutex<HashMap<Uuid, Sink>>>;

/// Turns presenter callbacks into protocol messages on a channel.
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ChannelPresenter {
    pub fn new(tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { tx }
    }

    fn push(&self, message: ServerMessage) {
        if self.tx.send(message).is_err() {
            debug!("Dropping update, table is gone");
        }
    }
}

impl Presenter for ChannelPresenter {
    fn prepare_board(&self, rows: usize, cols: usize) {
        self.push(ServerMessage::Board {
            rows,
            cols,
            field: vec![vec![CellView::Hidden; cols]; rows],
        });
    }

    fn update_cell(&self, pos: Pos, value: CellView) {
        self.push(ServerMessage::Cell { pos, value });
    }

    fn refresh_board(&self, board: &[Vec<CellView>]) {
        self.push(ServerMessage::Board {
            rows: board.len(),
            cols: board.first().map_or(0, Vec::len),
            field: board.to_vec(),
        });
    }

    fn update_status(&self, text: &str) {
        self.push(ServerMessage::Status {
            text: text.to_string(),
        });
    }

    fn update_timer(&self, seconds: u64) {
        self.push(ServerMessage::Timer { seconds });
    }

    fn update_flag_counter(&self, remaining: usize) {
        self.push(ServerMessage::Flags { remaining });
    }

    fn notify_outcome(&self, victory: bool) {
        self.push(ServerMessage::Outcome { victory });
    }
}

async fn send(stream: &mut Sink, message: &ServerMessage) {
    if let Ok(text) = serde_json::to_string(message) {
        let _ = stream.send(Message::Text(text)).await;
    }
}

async fn broadcast(streams: &mut HashMap<Uuid, Sink>, message: &ServerMessage) {
    let futures: Vec<_> = streams
        .iter_mut()
        .map(|(_, stream)| send(stream, message))
        .collect();

    join_all(futures).await;
}

/// One shared game: an engine session plus the sockets watching it.
pub struct Table {
    session: GameSession,
    streams: Streams,
    last_activity: StdMutex<Instant>,
    forwarder: JoinHandle<()>,
}

impl Table {
    /// Builds a table and starts its first level. Must run inside a runtime.
    #[instrument(level = "trace", skip(config), fields(rows = params.rows, cols = params.cols, bombs = params.bombs))]
    pub async fn create(params: GameParams, config: SessionConfig) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let streams: Streams = Arc::new(Mutex::new(HashMap::new()));

        let forwarder = {
            let streams = streams.clone();
            tokio::spawn(async move {
                while let Some(message) = rx.recv().await {
                    broadcast(&mut *streams.lock().await, &message).await;
                }
            })
        };

        let table = Self {
            session: GameSession::with_config(Arc::new(ChannelPresenter::new(tx)), config),
            streams,
            last_activity: StdMutex::new(Instant::now()),
            forwarder,
        };
        table.session.new_game(params).await?;
        info!(
            "Created table: {}x{} with {} bombs",
            params.rows, params.cols, params.bombs
        );
        Ok(table)
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    fn touch(&self) {
        if let Ok(mut last_activity) = self.last_activity.lock() {
            *last_activity = Instant::now();
        }
    }

    /// Current state of the level, as sent to a newly connected client.
    async fn init_messages(&self) -> Vec<ServerMessage> {
        let Some(snapshot) = self.session.snapshot().await else {
            return Vec::new();
        };
        let mut messages = vec![
            ServerMessage::Board {
                rows: snapshot.rows,
                cols: snapshot.cols,
                field: snapshot.board,
            },
            ServerMessage::Flags {
                remaining: snapshot.flags_remaining,
            },
            ServerMessage::Timer {
                seconds: snapshot.elapsed_seconds,
            },
        ];
        if !snapshot.running {
            messages.push(ServerMessage::Outcome {
                victory: snapshot.victory,
            });
        }
        messages
    }

    #[instrument(level = "trace", skip(self, stream))]
    pub async fn add_stream(&self, mut stream: Sink) -> Uuid {
        let id = Uuid::new_v4();
        // Holding the stream lock keeps the forwarder from interleaving
        // updates with the initial state.
        let mut streams = self.streams.lock().await;
        for message in self.init_messages().await {
            send(&mut stream, &message).await;
        }
        streams.insert(id, stream);
        self.touch();
        info!("Stream {} added, total connections: {}", id, streams.len());
        id
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn remove_stream(&self, id: &Uuid) {
        let mut streams = self.streams.lock().await;
        if streams.remove(id).is_some() {
            info!(
                "Stream {} removed, remaining connections: {}",
                id,
                streams.len()
            );
        } else {
            warn!("Attempted to remove non-existent stream: {}", id);
        }
        self.touch();
    }

    /// Sends a message to a single connection only.
    pub async fn send_to(&self, id: &Uuid, message: &ServerMessage) {
        if let Some(stream) = self.streams.lock().await.get_mut(id) {
            send(stream, message).await;
        }
    }

    pub async fn reveal(&self, pos: Pos) -> usize {
        self.touch();
        self.session.reveal(pos).await
    }

    pub async fn flag(&self, pos: Pos) -> bool {
        self.touch();
        self.session.mark(pos).await
    }

    pub async fn restart(&self, params: GameParams) -> Result<()> {
        self.touch();
        self.session.new_game(params).await
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.touch();
        self.session.save_to_file(path).await
    }

    pub async fn load(&self, path: &Path) -> Result<()> {
        self.touch();
        self.session.load_from_file(path).await
    }

    /// A table with no connections that has been idle for `timeout` can go.
    /// Returns `false` while the stream list is busy.
    pub fn should_cleanup(&self, timeout: Duration) -> bool {
        let Ok(streams) = self.streams.try_lock() else {
            return false;
        };
        if !streams.is_empty() {
            return false;
        }
        self.last_activity
            .lock()
            .map(|last_activity| last_activity.elapsed() > timeout)
            .unwrap_or(false)
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}
