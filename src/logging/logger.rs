//! Structured logger with dry-run awareness and summary collection.
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, TaskEntry, TaskStatus};
use super::utils::{log_file_path, terminal_columns};

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `record_task` method is **not** included because its signature differs
/// from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Write raw text to stdout, bypassing tracing.
fn console(text: &str) {
    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes()).ok();
    out.flush().ok();
}

/// Structured logger with dry-run awareness and summary collection.
///
/// All messages are also written to `$XDG_CACHE_HOME/tuckr/<command>.log`
/// with timestamps and ANSI codes stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    tasks: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
    /// Serializes console output from parallel group flushes.
    pub(super) flush_lock: Mutex<()>,
    /// Names of groups currently being processed in parallel.
    pub(super) active_tasks: Mutex<Vec<String>>,
    /// Whether a progress line is currently displayed (`0` = no, `1` = yes).
    ///
    /// The progress line is always truncated to a single terminal row, so
    /// clearing it never needs cursor-up movement.
    pub(super) progress_rows: Mutex<u16>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary. The file
    /// itself is created by [`init_subscriber`](super::subscriber::init_subscriber).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
            flush_lock: Mutex::new(()),
            active_tasks: Mutex::new(Vec::new()),
            progress_rows: Mutex::new(0),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded entries (test-only).
    #[cfg(test)]
    pub(crate) fn task_entries(&self) -> Vec<TaskEntry> {
        self.tasks.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Return the current value of `progress_rows` (test-only).
    #[cfg(test)]
    pub(crate) fn progress_rows_count(&self) -> u16 {
        *self
            .progress_rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a group result for the summary.
    pub fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.tasks.lock() {
            guard.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count recorded entries with `status`.
    #[must_use]
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.lock().map_or(0, |guard| {
            guard.iter().filter(|t| t.status == status).count()
        })
    }

    /// Count the number of failed groups.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.count(TaskStatus::Failed)
    }

    /// Print the summary of all recorded groups.
    ///
    /// Nothing is printed for a run that touched a single group and
    /// succeeded; its own output already says everything.
    pub fn print_summary(&self) {
        let tasks = match self.tasks.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        let trivial = tasks.len() == 1 && tasks.iter().all(|t| t.status == TaskStatus::Ok);
        if tasks.is_empty() || trivial {
            return;
        }

        console("\n");
        self.stage("Summary");

        let mut ok = 0u32;
        let mut skipped = 0u32;
        let mut dry_run = 0u32;
        let mut conflicts = 0u32;
        let mut failed = 0u32;

        for task in &tasks {
            let (icon, color) = match task.status {
                TaskStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                TaskStatus::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[2m")
                }
                TaskStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                TaskStatus::Conflict => {
                    conflicts += 1;
                    ("!", "\x1b[33m")
                }
                TaskStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = task
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", task.name));
        }

        console("\n");
        let total = ok + skipped + dry_run + conflicts + failed;
        self.info(&format!(
            "{total} groups: \x1b[32m{ok} ok\x1b[0m, \x1b[2m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[33m{conflicts} with conflicts\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }

    /// Erase the in-progress status line from the console.
    ///
    /// No-op if no progress line is currently shown.
    /// Must be called while holding `flush_lock`.
    pub(super) fn clear_progress(&self) {
        let mut guard = self
            .progress_rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *guard > 0 {
            console("\r\x1b[K");
            *guard = 0;
        }
    }

    /// Print an in-progress status line and mark it as shown.
    ///
    /// Must be called while holding `flush_lock`.
    pub(super) fn draw_progress(&self, names: &str) {
        let cols = terminal_columns();
        let prefix_width = 4;
        let max_name_chars = cols.saturating_sub(prefix_width);
        let display_names = if names.chars().count() > max_name_chars {
            let truncated: String = names
                .chars()
                .take(max_name_chars.saturating_sub(1))
                .collect();
            format!("{truncated}…")
        } else {
            names.to_string()
        };
        console(&format!("  \x1b[2m▹ {display_names}\x1b[0m"));
        let mut guard = self
            .progress_rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = 1;
    }

    /// Record that a group has started processing in parallel.
    ///
    /// Acquires the flush lock, erases any previous progress line, adds the
    /// group to the active set, and redraws the status line.
    pub fn notify_task_start(&self, name: &str) {
        let _guard = self
            .flush_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.clear_progress();
        let names = self.active_tasks.lock().map_or_else(
            |_| name.to_string(),
            |mut active| {
                active.push(name.to_string());
                active.join(", ")
            },
        );
        self.draw_progress(&names);
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.record_task(name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    #[test]
    fn logger_new() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log.task_entries().is_empty(), "expected empty task list");
    }

    #[test]
    fn record_task_with_message() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_task("zsh", TaskStatus::Conflict, Some("2 conflicts"));
        let tasks = log.task_entries();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "zsh");
        assert_eq!(tasks[0].message, Some("2 conflicts".to_string()));
    }

    #[test]
    fn counts_by_status() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_task("a", TaskStatus::Ok, None);
        log.record_task("b", TaskStatus::Failed, Some("error 1"));
        log.record_task("c", TaskStatus::Failed, Some("error 2"));
        log.record_task("d", TaskStatus::Conflict, None);
        assert_eq!(log.failure_count(), 2);
        assert_eq!(log.count(TaskStatus::Conflict), 1);
        assert_eq!(log.count(TaskStatus::DryRun), 0);
    }

    #[test]
    fn log_file_is_created() {
        let (log, _tmp, _guard) = isolated_logger();
        let path = log.log_path().expect("log path should exist");
        assert!(path.exists());
    }

    #[test]
    fn debug_always_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("debug-marker-{}", std::process::id());
        log.debug(&marker);
        let contents = fs::read_to_string(log.log_path().unwrap()).unwrap();
        assert!(contents.contains(&marker));
        assert!(contents.contains("[debug]"));
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record_task("via-trait", TaskStatus::Ok, None);
        assert_eq!(log.task_entries().len(), 1);
    }

    #[test]
    fn levels_are_tagged_in_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.stage("stage-marker");
        log.warn("warn-marker");
        log.error("error-marker");
        log.dry_run("dryrun-marker");
        let contents = fs::read_to_string(log.log_path().unwrap()).unwrap();
        assert!(contents.contains("==> stage-marker"));
        assert!(contents.contains("[warn] warn-marker"));
        assert!(contents.contains("[error] error-marker"));
        assert!(contents.contains("[dry run] dryrun-marker"));
    }

    #[test]
    fn summary_lists_every_group() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_task("git", TaskStatus::Ok, None);
        log.record_task("zsh", TaskStatus::Conflict, Some("1 conflict"));
        log.print_summary();
        let contents = fs::read_to_string(log.log_path().unwrap()).unwrap();
        assert!(contents.contains("==> Summary"));
        assert!(contents.contains("! zsh (1 conflict)"));
        assert!(contents.contains("2 groups: 1 ok"));
    }

    #[test]
    fn summary_skipped_for_single_successful_group() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_task("git", TaskStatus::Ok, None);
        log.print_summary();
        let contents = fs::read_to_string(log.log_path().unwrap()).unwrap();
        assert!(!contents.contains("Summary"));
    }

    #[test]
    fn notify_task_start_sets_progress_rows() {
        let (log, _tmp, _guard) = isolated_logger();
        assert_eq!(log.progress_rows_count(), 0);
        log.notify_task_start("zsh");
        assert_eq!(log.progress_rows_count(), 1);
    }

    #[test]
    fn draw_progress_caps_rows_to_one() {
        let (log, _tmp, _guard) = isolated_logger();
        log.draw_progress(&"a".repeat(500));
        assert_eq!(log.progress_rows_count(), 1);
    }

    #[test]
    #[allow(clippy::significant_drop_tightening)]
    fn notify_task_start_adds_to_active_tasks() {
        let (log, _tmp, _guard) = isolated_logger();
        log.notify_task_start("my-group");
        let active = log.active_tasks.lock().unwrap();
        assert!(active.contains(&"my-group".to_string()));
    }
}
