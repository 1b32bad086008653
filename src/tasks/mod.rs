//! Per-group units of work and the engines that drive them.
//!
//! Every selected group becomes one [`Task`]. Commands build the task list
//! with [`selection`] and hand it to the scheduler, which calls [`execute`]
//! for each task.
pub mod files;
pub mod hooks;
pub mod plan;
mod processing;
pub mod secrets;
pub mod selection;
pub mod symlinks;
pub mod unresolved;

pub use processing::Context;
#[allow(unused_imports)] // TaskStats is used by doc-tests via the lib crate
pub use processing::{
    ProcessOpts, TaskResult, TaskStats, process_applicable, process_resources,
    process_resources_remove,
};

use anyhow::Result;

use crate::error::{self, ReturnCode};
use crate::logging::TaskStatus;

/// A named, executable unit of work, usually one group.
pub trait Task: Send + Sync {
    /// Name shown in the output and the summary (the group name).
    fn name(&self) -> &str;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the group cannot be processed: a hook failed,
    /// some files could not be changed, or the group could not be resolved.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Execute a task, recording the result in the logger.
///
/// Returns the exit code the task's outcome maps to. Conflicts are reported
/// but do not fail the run.
pub fn execute(task: &dyn Task, ctx: &Context) -> ReturnCode {
    if ctx.interrupt.is_requested() {
        ctx.log
            .record_task(task.name(), TaskStatus::Skipped, Some("interrupted"));
        return ReturnCode::Success;
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
            ReturnCode::Success
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            ReturnCode::Success
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
            ReturnCode::Success
        }
        Ok(TaskResult::Conflicts(n)) => {
            let message = format!("{n} conflicting file(s) left alone");
            ctx.log
                .record_task(task.name(), TaskStatus::Conflict, Some(&message));
            ReturnCode::Success
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            error::return_code(&e)
        }
    }
}
