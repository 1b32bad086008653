//! Generic resource processing loop: check state, apply or remove, collect stats.
//!
//! - [`apply`]: single-resource processing (`process_single`, `apply_resource`, `remove_single`)
//! - [`context`]: shared execution context for tasks
//! - [`parallel`]: Rayon-based parallel processing helpers

mod apply;
pub mod context;
mod parallel;

pub use context::Context;

use anyhow::Result;

use crate::error::{ReturnCode, TuckrError};
use crate::resources::{Applicable, Resource};

/// Result of a single group task.
///
/// # Examples
///
/// ```
/// use tuckr_cli::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("nothing to do".into());
/// let conflicts = TaskResult::Conflicts(2);
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(conflicts, TaskResult::Conflicts(2)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Every file is in the requested state.
    Ok,
    /// Nothing was attempted.
    Skipped(String),
    /// Ran in dry-run mode.
    DryRun,
    /// Finished, but this many files were left alone because of conflicts.
    Conflicts(u32),
}

/// Counters for a group's files.
///
/// # Examples
///
/// ```
/// use tuckr_cli::tasks::TaskStats;
///
/// let mut stats = TaskStats::new();
/// stats.changed = 3;
/// stats.already_ok = 10;
///
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok");
/// assert_eq!(stats.summary(true), "3 would change, 10 already ok");
///
/// stats.conflicts = 1;
/// assert_eq!(stats.summary(false), "3 changed, 10 already ok, 1 conflicting");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskStats {
    /// Files changed (or that would change in a dry run).
    pub changed: u32,
    /// Files already in the requested state.
    pub already_ok: u32,
    /// Files deliberately left alone (e.g. foreign paths during unlinking).
    pub skipped: u32,
    /// Files whose deployment path is occupied by something else.
    pub conflicts: u32,
    /// Files that failed.
    pub failed: u32,
    /// Worst exit code among the failed files.
    pub code: ReturnCode,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one failed file with the exit code its error maps to.
    pub fn record_failure(&mut self, err: &anyhow::Error) {
        self.failed += 1;
        self.code = self
            .code
            .worst(crate::error::return_code(err))
            .worst(ReturnCode::Failure);
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 failed").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        let mut out = format!("{} {verb}, {} already ok", self.changed, self.already_ok);
        for (count, label) in [
            (self.skipped, "skipped"),
            (self.conflicts, "conflicting"),
            (self.failed, "failed"),
        ] {
            if count > 0 {
                out.push_str(&format!(", {count} {label}"));
            }
        }
        out
    }

    /// Log the summary and turn the counters into the group's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TuckrError::FilesFailed`] when any file failed.
    pub fn finish(self, ctx: &Context) -> Result<TaskResult> {
        ctx.log.info(&self.summary(ctx.dry_run()));
        if self.failed > 0 {
            return Err(TuckrError::FilesFailed {
                failed: self.failed as usize,
                code: self.code,
            }
            .into());
        }
        Ok(if self.conflicts > 0 {
            TaskResult::Conflicts(self.conflicts)
        } else if ctx.dry_run() {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        })
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
        self.conflicts += other.conflicts;
        self.failed += other.failed;
        self.code = self.code.worst(other.code);
    }
}

/// Configuration for the generic resource processing loop.
///
/// # Examples
///
/// ```
/// use tuckr_cli::tasks::ProcessOpts;
///
/// // Link, leaving conflicts alone:
/// let opts = ProcessOpts::apply_all("link").skip_incorrect();
/// assert!(!opts.fix_incorrect && opts.fix_missing && !opts.bail_on_error);
///
/// // Strict processing stops at the first error:
/// let opts = ProcessOpts::apply_all("decrypt").bail();
/// assert!(opts.bail_on_error);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProcessOpts<'a> {
    /// Verb for log messages (e.g., "link", "unlink", "decrypt").
    pub verb: &'a str,
    /// Treat `Incorrect` as fixable. If `false`, count it as a conflict.
    pub fix_incorrect: bool,
    /// Treat `Missing` as fixable. If `false`, skip it.
    pub fix_missing: bool,
    /// Propagate the first error. If `false`, log it, count the file as
    /// failed and carry on with the rest.
    pub bail_on_error: bool,
}

impl<'a> ProcessOpts<'a> {
    /// Fix both missing and incorrect resources, carrying on after errors.
    #[must_use]
    pub const fn apply_all(verb: &'a str) -> Self {
        Self {
            verb,
            fix_incorrect: true,
            fix_missing: true,
            bail_on_error: false,
        }
    }

    /// Leave incorrect resources alone and report them as conflicts.
    #[must_use]
    pub const fn skip_incorrect(mut self) -> Self {
        self.fix_incorrect = false;
        self
    }

    /// Stop at the first error.
    #[must_use]
    pub const fn bail(mut self) -> Self {
        self.bail_on_error = true;
        self
    }
}

/// Bring every resource to its desired state.
///
/// # Errors
///
/// Returns an error if a state cannot be determined, or the first apply
/// error when `opts.bail_on_error` is set.
pub fn process_resources<R: Resource + Send>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let resources: Vec<R> = resources.into_iter().collect();
    if ctx.parallel && resources.len() > 1 {
        ctx.log.debug(&format!(
            "processing {} files in parallel",
            resources.len()
        ));
        parallel::process_resources_parallel(ctx, resources, opts)
    } else {
        let mut stats = TaskStats::new();
        for resource in resources {
            let current = resource.current_state()?;
            stats += apply::process_single(ctx, &resource, current, opts)?;
        }
        Ok(stats)
    }
}

/// Apply resources that cannot report their state up front.
///
/// In a dry run each one is only described.
///
/// # Errors
///
/// Returns the first apply error when `opts.bail_on_error` is set.
pub fn process_applicable<R: Applicable + Send>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let resources: Vec<R> = resources.into_iter().collect();
    if ctx.parallel && resources.len() > 1 {
        parallel::process_applicable_parallel(ctx, resources, opts)
    } else {
        let mut stats = TaskStats::new();
        for resource in resources {
            stats += apply::apply_or_describe(ctx, &resource, opts)?;
        }
        Ok(stats)
    }
}

/// Remove every resource that is currently ours.
///
/// Only resources in [`ResourceState::Correct`](crate::resources::ResourceState::Correct)
/// are removed; anything else is left untouched.
///
/// # Errors
///
/// Returns an error if a state cannot be determined, or the first removal
/// error when `opts.bail_on_error` is set.
pub fn process_resources_remove<R: Resource + Send>(
    ctx: &Context,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let resources: Vec<R> = resources.into_iter().collect();
    if ctx.parallel && resources.len() > 1 {
        ctx.log.debug(&format!(
            "processing {} files in parallel",
            resources.len()
        ));
        parallel::process_remove_parallel(ctx, resources, opts)
    } else {
        let mut stats = TaskStats::new();
        for resource in resources {
            let current = resource.current_state()?;
            stats += apply::remove_single(ctx, &resource, &current, opts)?;
        }
        Ok(stats)
    }
}
