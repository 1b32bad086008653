//! Commands: `add` and `rm`.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, confirm, run_tasks_to_completion, select_plans, unresolved_tasks};
use crate::cli::{GlobalOpts, LinkOpts, UnlinkOpts};
use crate::config::selection::ConflictPolicy;
use crate::logging::{Log, Logger};
use crate::tasks::plan::{GroupPlan, detect_overlaps};
use crate::tasks::selection::Purpose;
use crate::tasks::symlinks::{LinkGroup, UnlinkGroup};
use crate::tasks::{Context, Task};

/// Run `add`.
///
/// # Errors
///
/// Returns an error if setup fails, the selection is refused, or any group
/// fails.
pub fn run(
    global: &GlobalOpts,
    opts: &LinkOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let policy = ConflictPolicy::from_flags(opts.force, opts.adopt);
    let ctx = setup.context(global, policy, Arc::clone(log) as Arc<dyn Log>)?;
    link(&ctx, opts, log)
}

/// Run `rm`.
///
/// # Errors
///
/// Returns an error if setup fails or any group fails.
pub fn run_remove(
    global: &GlobalOpts,
    opts: &UnlinkOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
    unlink(&ctx, opts, log)
}

/// Symlink the selected groups.
///
/// # Errors
///
/// Returns an error if the selection is refused or any group fails.
pub fn link(ctx: &Context, opts: &LinkOpts, log: &Arc<Logger>) -> Result<()> {
    let (mut plans, missing) = select_plans(
        ctx,
        &ctx.config.configs,
        &opts.groups,
        &opts.exclude,
        Purpose::Add,
    )?;
    detect_overlaps(&mut plans);

    if !confirm_conflicts(ctx, &plans, opts.assume_yes)? {
        log.warn("aborted; nothing was changed");
        return Ok(());
    }

    let mut tasks: Vec<Box<dyn Task>> = plans
        .into_iter()
        .map(|plan| Box::new(LinkGroup::new(plan)) as Box<dyn Task>)
        .collect();
    tasks.extend(unresolved_tasks(&ctx.config.configs, missing));
    if tasks.is_empty() {
        log.info("nothing to link");
        return Ok(());
    }
    run_tasks_to_completion(&tasks, ctx, log, ctx.parallel)
}

/// Remove the symlinks of the selected groups.
///
/// # Errors
///
/// Returns an error if any group fails.
pub fn unlink(ctx: &Context, opts: &UnlinkOpts, log: &Arc<Logger>) -> Result<()> {
    let (plans, missing) = select_plans(
        ctx,
        &ctx.config.configs,
        &opts.groups,
        &opts.exclude,
        Purpose::Remove,
    )?;

    let mut tasks: Vec<Box<dyn Task>> = plans
        .into_iter()
        .map(|plan| Box::new(UnlinkGroup::new(plan)) as Box<dyn Task>)
        .collect();
    tasks.extend(unresolved_tasks(&ctx.config.configs, missing));
    if tasks.is_empty() {
        log.info("nothing to unlink");
        return Ok(());
    }
    run_tasks_to_completion(&tasks, ctx, log, ctx.parallel)
}

/// Ask before `--force` or `--adopt` touches conflicting files.
///
/// Returns `true` without asking when the policy leaves conflicts alone or
/// no selected file is conflicting.
pub(crate) fn confirm_conflicts(
    ctx: &Context,
    plans: &[GroupPlan],
    assume_yes: bool,
) -> Result<bool> {
    let action = match ctx.policy() {
        ConflictPolicy::Skip => return Ok(true),
        ConflictPolicy::Force => "replaced by symlinks",
        ConflictPolicy::Adopt => "copied into the repository and replaced by symlinks",
    };
    let conflicting = plans
        .iter()
        .map(|plan| Ok(plan.summary()?.conflicting))
        .sum::<Result<usize>>()?;
    if conflicting == 0 {
        return Ok(true);
    }
    confirm(
        &format!("{conflicting} conflicting file(s) will be {action}. Continue?"),
        assume_yes,
        ctx.dry_run(),
    )
}
