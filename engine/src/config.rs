use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Size of the session's worker pool.
    pub workers: usize,
    /// Period of the elapsed-time counter.
    pub tick: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            tick: Duration::from_secs(1),
        }
    }
}

impl SessionConfig {
    /// Reads `SWEEPER_WORKERS` and `SWEEPER_TICK_MILLIS`, falling back to the
    /// defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let workers: usize = env::var("SWEEPER_WORKERS")
            .unwrap_or_else(|_| defaults.workers.to_string())
            .parse()
            .unwrap_or(defaults.workers);

        let tick_millis: u64 = env::var("SWEEPER_TICK_MILLIS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .unwrap_or(1000);

        Self {
            workers,
            tick: Duration::from_millis(tick_millis.max(1)),
        }
    }
}
