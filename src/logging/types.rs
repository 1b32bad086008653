//! Core logging types: per-group entries, status, and the [`Log`] trait.

/// Outcome of one group for summary reporting.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Group (or pseudo-group, such as a hook phase) the entry is about.
    pub name: String,
    /// Final status.
    pub status: TaskStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a completed group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Every file ended up in the requested state.
    Ok,
    /// Nothing was attempted, e.g. after an interrupt.
    Skipped,
    /// Ran in dry-run mode; no changes were applied.
    DryRun,
    /// Some files were left alone because their deployment path is occupied.
    Conflict,
    /// An error stopped the group.
    Failed,
}

/// Abstraction over logging backends.
///
/// Both [`Logger`](super::logger::Logger) (direct output) and
/// [`BufferedLog`](super::buffered::BufferedLog) (deferred output for
/// groups processed in parallel) implement this trait, so task code can log
/// without knowing whether output is immediate or buffered.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a group result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}
