use serde::{Deserialize, Serialize};

/// What a presentation layer is allowed to know about a cell.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "state")]
pub enum CellView {
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "flagged")]
    Flagged,
    #[serde(rename = "revealed")]
    Revealed { adjacent: u8 },
    #[serde(rename = "bomb")]
    Bomb,
}

impl CellView {
    /// Single-character rendering, using the same glyphs as the save format.
    pub fn symbol(&self) -> char {
        match self {
            CellView::Hidden => 'O',
            CellView::Flagged => 'P',
            CellView::Revealed { adjacent } => char::from(b'0' + (*adjacent).min(8)),
            CellView::Bomb => '@',
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameParams {
    pub rows: usize,
    pub cols: usize,
    pub bombs: usize,
}

impl Default for GameParams {
    fn default() -> Self {
        Difficulty::Easy.params()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn params(self) -> GameParams {
        let (rows, cols, bombs) = match self {
            Difficulty::Easy => (8, 8, 10),
            Difficulty::Medium => (16, 16, 40),
            Difficulty::Hard => (16, 30, 99),
        };
        GameParams { rows, cols, bombs }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,
}
