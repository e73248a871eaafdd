use std::sync::Arc;

use dashmap::Entry;
use nanoid::nanoid;
use rocket::{State, futures::StreamExt, get, http::Status, post, serde::json::Json};
use rocket_ws::{Channel, Message, WebSocket};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use minesweeper_common::{
    models::{CreateResponse, GameParams},
    protocol::{ClientMessage, ServerMessage},
};

use crate::{
    config::ServerConfig,
    host::{Table, Tables},
};

#[instrument(level = "trace", skip(tables, table))]
fn add_table(tables: &Tables, table: Table) -> String {
    let table = Arc::new(table);
    let mut id_length = 5;
    let max_attempts_per_length = 10;

    loop {
        for _ in 0..max_attempts_per_length {
            let id = nanoid!(id_length);
            match tables.entry(id.clone()) {
                Entry::Occupied(_) => {
                    debug!("Table ID collision, trying another: {}", id);
                    continue;
                }
                Entry::Vacant(entry) => {
                    entry.insert(table);
                    info!("Created new table with ID: {}", id);
                    return id;
                }
            }
        }

        warn!(
            "Exhausted ID attempts at length {}, increasing to {}",
            id_length,
            id_length + 1
        );
        id_length += 1;
    }
}

#[post("/create", data = "<params>")]
#[instrument(level = "trace", skip(tables, config), fields(rows = params.rows, cols = params.cols, bombs = params.bombs))]
pub async fn create_game(
    params: Json<GameParams>,
    tables: &State<Tables>,
    config: &State<ServerConfig>,
) -> Result<Json<CreateResponse>, Status> {
    info!(
        "Game creation request: {}x{} with {} bombs",
        params.rows, params.cols, params.bombs
    );

    let table = Table::create(params.0, config.session.clone())
        .await
        .map_err(|e| {
            warn!("Rejected game creation: {}", e);
            Status::BadRequest
        })?;
    let id = add_table(tables, table);

    Ok(Json(CreateResponse { id }))
}

/// Handles one decoded client action. Failures go back to the sender only.
async fn dispatch(table: &Table, config: &ServerConfig, stream_id: &Uuid, message: ClientMessage) {
    let result = match message {
        ClientMessage::Reveal { pos } => {
            table.reveal(pos).await;
            Ok(())
        }
        ClientMessage::Flag { pos } => {
            table.flag(pos).await;
            Ok(())
        }
        ClientMessage::Restart { params } => {
            info!(
                "Restarting table: {}x{} with {} bombs",
                params.rows, params.cols, params.bombs
            );
            table.restart(params).await.map_err(|e| e.to_string())
        }
        ClientMessage::Save { slot } => match config.slot_path(&slot) {
            None => Err(format!("invalid save slot {slot:?}")),
            Some(path) => match tokio::fs::create_dir_all(config.save_dir()).await {
                Ok(()) => table.save(&path).await.map_err(|e| e.to_string()),
                Err(e) => {
                    error!(
                        "Cannot create save directory {}: {}",
                        config.save_dir().display(),
                        e
                    );
                    Err(format!("save directory unavailable: {e}"))
                }
            },
        },
        ClientMessage::Load { slot } => match config.slot_path(&slot) {
            None => Err(format!("invalid save slot {slot:?}")),
            Some(path) => table.load(&path).await.map_err(|e| e.to_string()),
        },
    };

    if let Err(message) = result {
        debug!("Action failed for stream {}: {}", stream_id, message);
        table
            .send_to(stream_id, &ServerMessage::Error { message })
            .await;
    }
}

#[get("/ws?<id>")]
#[instrument(level = "trace", skip(ws, tables, config), fields(table_id = %id))]
pub fn websocket_handler(
    ws: WebSocket,
    tables: &State<Tables>,
    config: &State<ServerConfig>,
    id: String,
) -> Result<Channel<'static>, Status> {
    let table = match tables.get(&id) {
        None => {
            warn!("WebSocket connection attempt for non-existent table: {}", id);
            return Err(Status::NotFound);
        }
        Some(value) => {
            info!("WebSocket connection established for table: {}", id);
            value.value().clone()
        }
    };
    let config = config.inner().clone();

    Ok(ws.channel(move |stream| {
        let table_id = id.clone();
        Box::pin(async move {
            let (write, mut read) = stream.split();
            let stream_id = table.add_stream(write).await;

            info!(
                "Client connected to table {} (stream: {})",
                table_id, stream_id
            );

            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            debug!("Received message from table {}: {:?}", table_id, message);
                            dispatch(&table, &config, &stream_id, message).await;
                        }
                        Err(e) => {
                            warn!(
                                "Invalid message format in table {}: {} - Error: {}",
                                table_id, text, e
                            );
                            table
                                .send_to(
                                    &stream_id,
                                    &ServerMessage::Error {
                                        message: format!("invalid message: {e}"),
                                    },
                                )
                                .await;
                        }
                    },
                    Ok(Message::Close(_)) => {
                        info!(
                            "WebSocket connection closed for table {} (stream: {})",
                            table_id, stream_id
                        );
                        break;
                    }
                    Err(e) => {
                        error!(
                            "WebSocket error in table {} (stream: {}): {}",
                            table_id, stream_id, e
                        );
                        break;
                    }
                    _ => {
                        debug!("Received non-text message in table {}, ignoring", table_id);
                    }
                }
            }

            table.remove_stream(&stream_id).await;

            info!(
                "Client disconnected from table {} (stream: {})",
                table_id, stream_id
            );
            Ok(())
        })
    }))
}
