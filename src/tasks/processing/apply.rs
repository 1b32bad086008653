//! Single-resource processing: check state, apply or remove one resource.

use anyhow::Result;

use super::context::Context;
use super::{ProcessOpts, TaskStats};
use crate::resources::{Applicable, Resource, ResourceChange, ResourceState};

/// Process a single resource given its current state, returning a stats delta.
pub(super) fn process_single<R: Resource>(
    ctx: &Context,
    resource: &R,
    resource_state: ResourceState,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    match resource_state {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceState::Invalid { reason } => {
            ctx.log.warn(&format!("skipping {desc}: {reason}"));
            delta.skipped += 1;
        }
        ResourceState::Missing if !opts.fix_missing => {
            delta.skipped += 1;
        }
        ResourceState::Incorrect { current } if !opts.fix_incorrect => {
            ctx.log.warn(&format!("conflict: {desc} ({current})"));
            delta.conflicts += 1;
        }
        resource_state @ (ResourceState::Missing | ResourceState::Incorrect { .. }) => {
            if ctx.dry_run() {
                if let Err(e) = resource.precheck() {
                    return record_error(ctx, &desc, opts, e);
                }
                let msg = if let ResourceState::Incorrect { ref current } = resource_state {
                    format!("would {} {desc} (currently {current})", opts.verb)
                } else {
                    format!("would {}: {desc}", opts.verb)
                };
                ctx.log.dry_run(&msg);
                delta.changed += 1;
                return Ok(delta);
            }
            delta += apply_resource(ctx, resource, opts)?;
        }
    }
    Ok(delta)
}

/// Apply a resource, or only describe it in a dry run.
pub(super) fn apply_or_describe<R: Applicable>(
    ctx: &Context,
    resource: &R,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    if ctx.dry_run() {
        if let Err(e) = resource.precheck() {
            return record_error(ctx, &resource.description(), opts, e);
        }
        ctx.log
            .dry_run(&format!("would {}: {}", opts.verb, resource.description()));
        return Ok(TaskStats {
            changed: 1,
            ..TaskStats::default()
        });
    }
    apply_resource(ctx, resource, opts)
}

/// Apply a single resource change, returning a stats delta.
pub(super) fn apply_resource<R: Applicable>(
    ctx: &Context,
    resource: &R,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    let change = match resource.apply() {
        Ok(change) => change,
        Err(e) => return record_error(ctx, &desc, opts, e),
    };

    match change {
        ResourceChange::Applied => {
            ctx.log.info(&format!("{}: {desc}", opts.verb));
            delta.changed += 1;
        }
        ResourceChange::AlreadyCorrect => {
            ctx.log.debug(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceChange::Skipped { reason } => {
            ctx.log.warn(&format!("conflict: {desc} ({reason})"));
            delta.conflicts += 1;
        }
    }
    Ok(delta)
}

/// Log a failed resource and count it, unless the run bails on errors.
fn record_error(
    ctx: &Context,
    desc: &str,
    opts: &ProcessOpts,
    e: anyhow::Error,
) -> Result<TaskStats> {
    if opts.bail_on_error {
        return Err(e);
    }
    ctx.log
        .error(&format!("failed to {} {desc}: {e:#}", opts.verb));
    let mut delta = TaskStats::new();
    delta.record_failure(&e);
    Ok(delta)
}

/// Remove a single resource, returning a stats delta.
pub(super) fn remove_single<R: Resource>(
    ctx: &Context,
    resource: &R,
    current: &ResourceState,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    match current {
        ResourceState::Correct => {
            if ctx.dry_run() {
                ctx.log.dry_run(&format!("would {}: {desc}", opts.verb));
                delta.changed += 1;
                return Ok(delta);
            }
            match resource.remove() {
                Ok(_) => {
                    ctx.log.info(&format!("{}: {desc}", opts.verb));
                    delta.changed += 1;
                }
                Err(e) if opts.bail_on_error => return Err(e),
                Err(e) => {
                    ctx.log
                        .error(&format!("failed to {} {desc}: {e:#}", opts.verb));
                    delta.record_failure(&e);
                }
            }
        }
        ResourceState::Incorrect { current } => {
            ctx.log.debug(&format!("leaving {desc}: {current}"));
            delta.skipped += 1;
        }
        ResourceState::Missing | ResourceState::Invalid { .. } => {
            delta.already_ok += 1;
        }
    }
    Ok(delta)
}
