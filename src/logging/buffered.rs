//! Buffered logger for groups processed in parallel.
use std::sync::{Arc, Mutex};

use super::logger::Logger;
use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, TaskStatus};

/// A single buffered log entry, replayed when flushed.
#[derive(Debug, Clone)]
enum LogEntry {
    Stage(String),
    Info(String),
    Debug(String),
    Warn(String),
    Error(String),
    DryRun(String),
}

impl LogEntry {
    /// Replay this entry to the console and log file via tracing.
    fn replay(&self) {
        match self {
            Self::Stage(msg) => tracing::info!(target: STAGE_TARGET, "{msg}"),
            Self::Info(msg) => tracing::info!("{msg}"),
            Self::Debug(msg) => tracing::debug!("{msg}"),
            Self::Warn(msg) => tracing::warn!("{msg}"),
            Self::Error(msg) => tracing::error!("{msg}"),
            Self::DryRun(msg) => tracing::info!(target: DRY_RUN_TARGET, "{msg}"),
        }
    }
}

/// Implement the display methods of [`Log`] by buffering each message into
/// `self.entries` as the corresponding [`LogEntry`] variant.
macro_rules! buffer_log_methods {
    ($($method:ident => $variant:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                if let Ok(mut guard) = self.entries.lock() {
                    guard.push(LogEntry::$variant(msg.to_string()));
                }
            }
        )+
    };
}

/// Buffered logger for one group of a parallel run.
///
/// Captures display output in memory so concurrent groups do not interleave
/// their console output. The captured entries are replayed in order when
/// [`flush_and_complete`](Self::flush_and_complete) is called.
///
/// [`record_task`](Log::record_task) is forwarded directly to the underlying
/// [`Logger`] because the summary collection is already thread-safe.
#[derive(Debug)]
pub struct BufferedLog {
    inner: Arc<Logger>,
    entries: Mutex<Vec<LogEntry>>,
}

impl BufferedLog {
    /// Create a new buffered logger backed by the given [`Logger`].
    #[must_use]
    pub const fn new(inner: Arc<Logger>) -> Self {
        Self {
            inner,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Replay all buffered entries to the backing [`Logger`].
    #[cfg(test)]
    pub fn flush(&self) {
        let entries = match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        for entry in &entries {
            entry.replay();
        }
    }

    /// Flush all buffered entries and remove the group from the active set.
    ///
    /// Holds the logger's flush lock so groups finishing together do not
    /// interleave, then redraws the progress line for what is still running.
    pub fn flush_and_complete(&self, task_name: &str) {
        let _guard = self
            .inner
            .flush_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.inner.clear_progress();
        let entries = match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        for entry in &entries {
            entry.replay();
        }
        let remaining = self.inner.active_tasks.lock().ok().and_then(|mut active| {
            active.retain(|n| n != task_name);
            (!active.is_empty()).then(|| active.join(", "))
        });
        if let Some(names) = remaining {
            self.inner.draw_progress(&names);
        }
    }
}

impl Log for BufferedLog {
    buffer_log_methods! {
        stage   => Stage,
        info    => Info,
        debug   => Debug,
        warn    => Warn,
        error   => Error,
        dry_run => DryRun,
    }

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.inner.record_task(name, status, message);
    }
}
