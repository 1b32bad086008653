//! Rayon-based parallel resource processing.

use std::sync::Mutex;

use anyhow::Result;

use super::apply::{apply_or_describe, process_single, remove_single};
use super::{ProcessOpts, TaskStats};
use crate::resources::{Applicable, Resource};
use crate::tasks::Context;

/// Process resources in parallel using Rayon.
pub(super) fn process_resources_parallel<R: Resource + Send>(
    ctx: &Context,
    resources: Vec<R>,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    collect_parallel_stats(resources, |resource| {
        let current = resource.current_state()?;
        process_single(ctx, &resource, current, opts)
    })
}

/// Apply stateless resources in parallel using Rayon.
pub(super) fn process_applicable_parallel<R: Applicable + Send>(
    ctx: &Context,
    resources: Vec<R>,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    collect_parallel_stats(resources, |resource| {
        apply_or_describe(ctx, &resource, opts)
    })
}

/// Remove resources in parallel using Rayon.
pub(super) fn process_remove_parallel<R: Resource + Send>(
    ctx: &Context,
    resources: Vec<R>,
    opts: &ProcessOpts,
) -> Result<TaskStats> {
    collect_parallel_stats(resources, |resource| {
        let current = resource.current_state()?;
        remove_single(ctx, &resource, &current, opts)
    })
}

/// Accumulate per-item [`TaskStats`] deltas in parallel using Rayon.
///
/// The per-item work runs without the stats lock held; the lock is taken
/// only for the counter update after each item completes.
fn collect_parallel_stats<T: Send>(
    items: Vec<T>,
    work: impl Fn(T) -> Result<TaskStats> + Sync + Send,
) -> Result<TaskStats> {
    use rayon::prelude::*;
    let stats = Mutex::new(TaskStats::new());
    items.into_par_iter().try_for_each(|item| -> Result<()> {
        let delta = work(item)?;
        *stats
            .lock()
            .map_err(|e| anyhow::anyhow!("stats mutex poisoned: {e}"))? += delta;
        Ok(())
    })?;
    Ok(stats
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner))
}
