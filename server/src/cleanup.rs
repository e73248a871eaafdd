use std::time::Duration;

use tokio::time;
use tracing::{debug, info};

use crate::host::Tables;

pub async fn start_cleanup_task(tables: Tables, every: Duration, inactive_timeout: Duration) {
    let mut interval = time::interval(every);

    info!(
        "Started table cleanup task: checking every {}s, inactive timeout: {}s",
        every.as_secs(),
        inactive_timeout.as_secs()
    );

    loop {
        interval.tick().await;
        cleanup_tables(&tables, inactive_timeout);
    }
}

/// Drops every table that has no connections and has been idle longer than
/// `inactive_timeout`. Returns how many were removed.
pub fn cleanup_tables(tables: &Tables, inactive_timeout: Duration) -> usize {
    let before = tables.len();
    tables.retain(|table_id, table| {
        let keep = !table.should_cleanup(inactive_timeout);
        if !keep {
            debug!("Cleaned up table: {}", table_id);
        }
        keep
    });

    let removed_count = before.saturating_sub(tables.len());
    if removed_count > 0 {
        info!("Cleaned up {} inactive tables", removed_count);
    }
    removed_count
}
