//! Linking and unlinking the files of one group.
use anyhow::Result;

use super::plan::GroupPlan;
use super::{Context, ProcessOpts, Task, TaskResult, TaskStats, process_resources};
use crate::config::selection::ConflictPolicy;

/// Link every planned file of `plan` under the context's conflict policy.
///
/// Conflicting files are left alone unless the policy is force or adopt.
///
/// # Errors
///
/// Returns [`TuckrError::FilesFailed`](crate::error::TuckrError::FilesFailed)
/// when some files could not be linked or resolved.
pub fn link_plan(ctx: &Context, plan: &GroupPlan) -> Result<TaskResult> {
    let mut stats = TaskStats::new();
    plan.report_errors(ctx, &mut stats);

    let opts = match ctx.policy() {
        ConflictPolicy::Skip => ProcessOpts::apply_all("link").skip_incorrect(),
        ConflictPolicy::Force => ProcessOpts::apply_all("force link"),
        ConflictPolicy::Adopt => ProcessOpts::apply_all("adopt and link"),
    };
    stats += process_resources(ctx, plan.links(ctx.policy()), &opts)?;
    stats.finish(ctx)
}

/// Remove every symlink of `plan` that points into the repository.
///
/// # Errors
///
/// Returns [`TuckrError::FilesFailed`](crate::error::TuckrError::FilesFailed)
/// when some files could not be unlinked or resolved.
pub fn unlink_plan(ctx: &Context, plan: &GroupPlan) -> Result<TaskResult> {
    let mut stats = TaskStats::new();
    plan.report_errors(ctx, &mut stats);
    stats += super::process_resources_remove(
        ctx,
        plan.links(ConflictPolicy::Skip),
        &ProcessOpts::apply_all("unlink"),
    )?;
    stats.finish(ctx)
}

/// `add`: symlink one group.
#[derive(Debug)]
pub struct LinkGroup {
    plan: GroupPlan,
}

impl LinkGroup {
    /// Create the task for a planned group.
    #[must_use]
    pub const fn new(plan: GroupPlan) -> Self {
        Self { plan }
    }
}

impl Task for LinkGroup {
    fn name(&self) -> &str {
        &self.plan.group
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if self.plan.is_empty() {
            return Ok(TaskResult::Skipped("no files to link".to_string()));
        }
        link_plan(ctx, &self.plan)
    }
}

/// `rm`: remove one group's symlinks.
#[derive(Debug)]
pub struct UnlinkGroup {
    plan: GroupPlan,
}

impl UnlinkGroup {
    /// Create the task for a planned group.
    #[must_use]
    pub const fn new(plan: GroupPlan) -> Self {
        Self { plan }
    }
}

impl Task for UnlinkGroup {
    fn name(&self) -> &str {
        &self.plan.group
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if self.plan.is_empty() {
            return Ok(TaskResult::Skipped("no files to unlink".to_string()));
        }
        unlink_plan(ctx, &self.plan)
    }
}
