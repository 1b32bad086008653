//! Commands: `set` and `unset`.
//!
//! Both fall back to `add`/`rm` when the repository has no hooks at all.
//! Groups run one after the other because hooks share the terminal.
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;

use super::add::{self, confirm_conflicts};
use super::{CommandSetup, candidates, plan_table, run_tasks_to_completion, unresolved_tasks};
use crate::cli::{GlobalOpts, LinkOpts, UnlinkOpts};
use crate::config::selection::ConflictPolicy;
use crate::logging::{Log, Logger};
use crate::resources::hook::{Hook, discover};
use crate::tasks::hooks::{SetGroup, UnsetGroup};
use crate::tasks::plan::{GroupPlan, detect_overlaps};
use crate::tasks::selection::{Candidate, Purpose, Selection, select};
use crate::tasks::{Context, Task};

/// Run `set`.
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
    set(&ctx, opts, log)
}

/// Run `unset`.
///
/// # Errors
///
/// Returns an error if setup fails or any group fails.
pub fn run_unset(
    global: &GlobalOpts,
    opts: &UnlinkOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
    unset(&ctx, opts, log)
}

/// Run the set pipeline for the selected groups.
///
/// # Errors
///
/// Returns an error if the selection is refused or any group fails.
pub fn set(ctx: &Context, opts: &LinkOpts, log: &Arc<Logger>) -> Result<()> {
    if !ctx.config.has_hooks() {
        log.debug("no hooks found; linking only");
        return add::link(ctx, opts, log);
    }

    let (selection, selected) = select_with_hooks(ctx, &opts.groups, &opts.exclude, Purpose::Set)?;
    let mut selected: Vec<GroupPlan> = selected.into_values().collect();
    detect_overlaps(&mut selected);
    if !confirm_conflicts(ctx, &selected, opts.assume_yes)? {
        log.warn("aborted; nothing was changed");
        return Ok(());
    }

    let mut plans: BTreeMap<String, GroupPlan> = selected
        .into_iter()
        .map(|plan| (plan.group.clone(), plan))
        .collect();
    let mut tasks: Vec<Box<dyn Task>> = selection
        .groups
        .iter()
        .map(|name| {
            Box::new(SetGroup::new(
                name.clone(),
                plans.remove(name),
                group_hooks(ctx, name),
            )) as Box<dyn Task>
        })
        .collect();
    tasks.extend(unresolved_tasks(&ctx.config.configs, selection.missing));
    run_tasks_to_completion(&tasks, ctx, log, false)
}

/// Run the unset pipeline for the selected groups.
///
/// # Errors
///
/// Returns an error if any group fails.
pub fn unset(ctx: &Context, opts: &UnlinkOpts, log: &Arc<Logger>) -> Result<()> {
    if !ctx.config.has_hooks() {
        log.debug("no hooks found; unlinking only");
        return add::unlink(ctx, opts, log);
    }

    let (selection, mut plans) =
        select_with_hooks(ctx, &opts.groups, &opts.exclude, Purpose::Every)?;
    let mut tasks: Vec<Box<dyn Task>> = selection
        .groups
        .iter()
        .map(|name| {
            Box::new(UnsetGroup::new(
                name.clone(),
                plans.remove(name),
                group_hooks(ctx, name),
            )) as Box<dyn Task>
        })
        .collect();
    tasks.extend(unresolved_tasks(&ctx.config.configs, selection.missing));
    run_tasks_to_completion(&tasks, ctx, log, false)
}

/// Select among config groups and hook-only groups.
///
/// Returns the selection and the plans of the selected groups that have
/// config files.
fn select_with_hooks(
    ctx: &Context,
    names: &[String],
    exclude: &[String],
    purpose: Purpose,
) -> Result<(Selection, BTreeMap<String, GroupPlan>)> {
    let mut plans = plan_table(ctx, &ctx.config.configs);
    let mut pool = candidates(&plans)?;
    pool.extend(
        ctx.config
            .hooks
            .names()
            .filter(|name| !plans.contains_key(*name))
            .map(Candidate::without_files),
    );
    pool.sort_by(|a, b| a.name.cmp(&b.name));

    let selection = select(names, exclude, purpose, ctx.policy(), &pool)?;
    plans.retain(|name, _| selection.groups.contains(name));
    Ok((selection, plans))
}

fn group_hooks(ctx: &Context, name: &str) -> Vec<Hook> {
    ctx.config.hooks.get(name).map(discover).unwrap_or_default()
}
