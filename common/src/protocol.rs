use serde::{Deserialize, Serialize};

use crate::models::{CellView, GameParams, Pos};

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    #[serde(rename = "reveal")]
    Reveal { pos: Pos },
    #[serde(rename = "flag")]
    Flag { pos: Pos },
    #[serde(rename = "restart")]
    Restart { params: GameParams },
    #[serde(rename = "save")]
    Save { slot: String },
    #[serde(rename = "load")]
    Load { slot: String },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "board")]
    Board {
        rows: usize,
        cols: usize,
        field: Vec<Vec<CellView>>,
    },
    #[serde(rename = "cell")]
    Cell { pos: Pos, value: CellView },
    #[serde(rename = "status")]
    Status { text: String },
    #[serde(rename = "timer")]
    Timer { seconds: u64 },
    #[serde(rename = "flags")]
    Flags { remaining: usize },
    #[serde(rename = "outcome")]
    Outcome { victory: bool },
    #[serde(rename = "error")]
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_actions_are_tagged() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"action":"reveal","pos":{"x":2,"y":1}}"#).unwrap();
        match message {
            ClientMessage::Reveal { pos } => assert_eq!(pos, Pos { x: 2, y: 1 }),
            other => panic!("unexpected message: {other:?}"),
        }

        let message: ClientMessage =
            serde_json::from_str(r#"{"action":"save","slot":"monday"}"#).unwrap();
        assert!(matches!(message, ClientMessage::Save { slot } if slot == "monday"));
    }

    #[test]
    fn server_cell_update_shape() {
        let json = serde_json::to_value(ServerMessage::Cell {
            pos: Pos { x: 0, y: 4 },
            value: CellView::Revealed { adjacent: 2 },
        })
        .unwrap();
        assert_eq!(json["type"], "cell");
        assert_eq!(json["value"]["state"], "revealed");
        assert_eq!(json["value"]["adjacent"], 2);
    }
}
