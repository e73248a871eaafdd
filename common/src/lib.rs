//! Types shared between the minesweeper engine and the hosts that present it.

pub mod models;
pub mod protocol;
