//! Periodic deletion of stale export files (spec.md §4.8). Never deletes the
//! export directory itself; tolerates concurrent writes by the renderer —
//! a file vanishing between listing and removal is not an error.

use std::time::{Duration, SystemTime};

use confab_core::error::Result;

pub struct ExportReaper;

impl ExportReaper {
    /// Deletes every file in `dir` whose modified time is older than `retention`.
    pub fn reap(dir: &str, retention: Duration) -> Result<usize> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(0),
        };
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Ok(metadata) = entry.metadata() else { continue };
            let Ok(modified) = metadata.modified() else { continue };
            let Ok(age) = now.duration_since(modified) else { continue };
            if age <= retention {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "export reaper failed to remove file"),
            }
        }
        Ok(removed)
    }

    /// Spawns the cron-like hourly (configurable) background sweep.
    pub fn spawn(dir: String, retention_hours: i64, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let retention = Duration::from_secs(retention_hours.max(0) as u64 * 3600);
            let mut tick = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            loop {
                tick.tick().await;
                match Self::reap(&dir, retention) {
                    Ok(n) if n > 0 => tracing::info!(removed = n, "export reaper swept stale files"),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "export reaper sweep failed"),
                }
            }
        })
    }
}
