use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use minesweeper_engine::SessionConfig;
use tracing::debug;

const MAX_SLOT_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub save_dir: PathBuf,
    pub cleanup_interval: Duration,
    pub inactive_timeout: Duration,
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("./saves"),
            cleanup_interval: Duration::from_secs(60),
            inactive_timeout: Duration::from_secs(600),
            session: SessionConfig::default(),
        }
    }
}

fn seconds_from_env(name: &str, default: u64) -> Duration {
    let secs: u64 = env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default);
    Duration::from_secs(secs)
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let save_dir = env::var("SWEEPER_SAVE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./saves"));

        let config = Self {
            save_dir,
            cleanup_interval: seconds_from_env("CLEANUP_INTERVAL_SECONDS", 60),
            inactive_timeout: seconds_from_env("INACTIVE_GAME_TIMEOUT_SECONDS", 600),
            session: SessionConfig::from_env(),
        };
        debug!("Loaded server configuration: {:?}", config);
        config
    }

    /// File backing a save slot, or `None` if the slot name is not allowed.
    pub fn slot_path(&self, slot: &str) -> Option<PathBuf> {
        is_valid_slot(slot).then(|| self.save_dir.join(format!("{slot}.txt")))
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }
}

/// Slots are 1 to 32 ASCII letters, digits, `-` or `_`, so they can never
/// name a path outside the save directory.
pub fn is_valid_slot(slot: &str) -> bool {
    !slot.is_empty()
        && slot.len() <= MAX_SLOT_LEN
        && slot
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_slot_names() {
        assert!(is_valid_slot("monday"));
        assert!(is_valid_slot("run_2-b"));
        assert!(is_valid_slot(&"a".repeat(32)));
    }

    #[test]
    fn rejects_paths_and_oversized_names() {
        for slot in ["", "../etc/passwd", "a/b", "slot.txt", "with space", "ü"] {
            assert!(!is_valid_slot(slot), "{slot:?} should be rejected");
        }
        assert!(!is_valid_slot(&"a".repeat(33)));
    }

    #[test]
    fn slot_path_stays_in_save_dir() {
        let config = ServerConfig {
            save_dir: PathBuf::from("/tmp/sweeper"),
            ..ServerConfig::default()
        };
        assert_eq!(
            config.slot_path("monday"),
            Some(PathBuf::from("/tmp/sweeper/monday.txt"))
        );
        assert_eq!(config.slot_path(".."), None);
    }
}
