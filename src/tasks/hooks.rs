//! The set and unset pipelines: hooks around symlinking.
//!
//! ```text
//! set:   Pending → PreHookRunning → PreHookDone → Symlinking → Symlinked → PostHookRunning → Done
//!                                 ↘ PreHookFailed            ↘ SymlinkFailed               ↘ PostHookFailed
//!
//! unset: Pending → CleanupHookRunning → CleanupHookDone → Unlinking → Done
//!                                     ↘ CleanupHookFailed ↗          ↘ UnlinkFailed
//! ```
//!
//! A failed pre hook ends the group before anything is linked. A failed
//! symlink step still runs the post hooks. A failed cleanup hook never stops
//! unlinking. Hooks of one phase run one after another in file-name order;
//! the `pre_` and `post_` phases stop at the first failure, the cleanup
//! phase runs every hook.
use anyhow::Result;

use super::plan::GroupPlan;
use super::symlinks::{link_plan, unlink_plan};
use super::{Context, Task, TaskResult};
use crate::error::HookError;
use crate::resources::hook::{Hook, HookPhase, of_phase};

/// Steps of the set pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetState {
    /// Nothing has run yet.
    Pending,
    /// Running `pre_` hooks.
    PreHookRunning,
    /// Every `pre_` hook succeeded.
    PreHookDone,
    /// A `pre_` hook failed; nothing else runs.
    PreHookFailed,
    /// Linking files.
    Symlinking,
    /// Linking finished.
    Symlinked,
    /// Some files could not be linked.
    SymlinkFailed,
    /// Running `post_` hooks.
    PostHookRunning,
    /// The pipeline finished.
    Done,
    /// A `post_` hook failed.
    PostHookFailed,
}

/// Steps of the unset pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsetState {
    /// Nothing has run yet.
    Pending,
    /// Running `rm_` hooks.
    CleanupHookRunning,
    /// Every `rm_` hook succeeded.
    CleanupHookDone,
    /// An `rm_` hook failed; unlinking goes ahead.
    CleanupHookFailed,
    /// Removing symlinks.
    Unlinking,
    /// The pipeline finished.
    Done,
    /// Some symlinks could not be removed.
    UnlinkFailed,
}

/// Every state a pipeline went through, and how it ended.
#[derive(Debug)]
pub struct Outcome<S> {
    /// States in the order they were entered, starting with `Pending`.
    pub transitions: Vec<S>,
    /// The group's result.
    pub result: Result<TaskResult>,
}

impl<S: Copy> Outcome<S> {
    fn new(start: S) -> Self {
        Self {
            transitions: vec![start],
            result: Ok(TaskResult::Ok),
        }
    }

    fn enter(&mut self, state: S) {
        self.transitions.push(state);
    }

    /// The state the pipeline ended in.
    #[must_use]
    pub fn last(&self) -> Option<S> {
        self.transitions.last().copied()
    }
}

/// Run the hooks of one phase in order.
///
/// `pre_` and `post_` phases stop at the first failure. Every cleanup hook
/// runs even when an earlier one fails; each failure is logged. In a dry run
/// the hooks are only listed.
///
/// # Errors
///
/// Returns the [`HookError`] of the first hook that fails.
fn run_phase(ctx: &Context, hooks: &[Hook], phase: HookPhase) -> Result<(), HookError> {
    let mut first_failure = None;
    for hook in of_phase(hooks, phase) {
        if ctx.dry_run() {
            ctx.log
                .dry_run(&format!("would run {phase} hook {}", hook.name()));
            continue;
        }
        ctx.log.info(&format!("running {phase} hook {}", hook.name()));
        if let Err(e) = hook.run(ctx.executor.as_ref(), ctx.platform().family) {
            if phase != HookPhase::Cleanup {
                return Err(e);
            }
            ctx.log.error(&e.to_string());
            first_failure.get_or_insert(e);
        }
    }
    first_failure.map_or(Ok(()), Err)
}

fn no_link_result(ctx: &Context) -> TaskResult {
    if ctx.dry_run() {
        TaskResult::DryRun
    } else {
        TaskResult::Ok
    }
}

/// `set`: pre hooks, symlinks, post hooks for one group.
#[derive(Debug)]
pub struct SetGroup {
    name: String,
    plan: Option<GroupPlan>,
    hooks: Vec<Hook>,
}

impl SetGroup {
    /// Create the pipeline for a group.
    ///
    /// `plan` is `None` for groups that only have hooks.
    #[must_use]
    pub fn new(name: impl Into<String>, plan: Option<GroupPlan>, hooks: Vec<Hook>) -> Self {
        Self {
            name: name.into(),
            plan,
            hooks,
        }
    }

    /// Drive the pipeline, recording every state it enters.
    pub fn drive(&self, ctx: &Context) -> Outcome<SetState> {
        let mut outcome = Outcome::new(SetState::Pending);

        outcome.enter(SetState::PreHookRunning);
        if let Err(e) = run_phase(ctx, &self.hooks, HookPhase::Pre) {
            outcome.enter(SetState::PreHookFailed);
            outcome.result = Err(e.into());
            return outcome;
        }
        outcome.enter(SetState::PreHookDone);

        outcome.enter(SetState::Symlinking);
        let linked = self
            .plan
            .as_ref()
            .map_or_else(|| Ok(no_link_result(ctx)), |plan| link_plan(ctx, plan));
        outcome.enter(if linked.is_ok() {
            SetState::Symlinked
        } else {
            SetState::SymlinkFailed
        });

        outcome.enter(SetState::PostHookRunning);
        match run_phase(ctx, &self.hooks, HookPhase::Post) {
            Ok(()) => {
                outcome.enter(SetState::Done);
                outcome.result = linked;
            }
            Err(e) => {
                outcome.enter(SetState::PostHookFailed);
                outcome.result = match linked {
                    Ok(_) => Err(e.into()),
                    Err(link_err) => {
                        ctx.log.error(&e.to_string());
                        Err(link_err)
                    }
                };
            }
        }
        outcome
    }
}

impl Task for SetGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        self.drive(ctx).result
    }
}

/// `unset`: cleanup hooks, then unlink one group.
#[derive(Debug)]
pub struct UnsetGroup {
    name: String,
    plan: Option<GroupPlan>,
    hooks: Vec<Hook>,
}

impl UnsetGroup {
    /// Create the pipeline for a group.
    ///
    /// `plan` is `None` for groups that only have hooks.
    #[must_use]
    pub fn new(name: impl Into<String>, plan: Option<GroupPlan>, hooks: Vec<Hook>) -> Self {
        Self {
            name: name.into(),
            plan,
            hooks,
        }
    }

    /// Drive the pipeline, recording every state it enters.
    pub fn drive(&self, ctx: &Context) -> Outcome<UnsetState> {
        let mut outcome = Outcome::new(UnsetState::Pending);

        outcome.enter(UnsetState::CleanupHookRunning);
        let cleanup = run_phase(ctx, &self.hooks, HookPhase::Cleanup);
        if let Err(e) = &cleanup {
            ctx.log.error(&format!("{e}; removing symlinks anyway"));
            outcome.enter(UnsetState::CleanupHookFailed);
        } else {
            outcome.enter(UnsetState::CleanupHookDone);
        }

        outcome.enter(UnsetState::Unlinking);
        let unlinked = self
            .plan
            .as_ref()
            .map_or_else(|| Ok(no_link_result(ctx)), |plan| unlink_plan(ctx, plan));
        match unlinked {
            Ok(result) => {
                outcome.enter(UnsetState::Done);
                outcome.result = match cleanup {
                    Ok(()) => Ok(result),
                    Err(e) => Err(e.into()),
                };
            }
            Err(e) => {
                outcome.enter(UnsetState::UnlinkFailed);
                outcome.result = Err(e);
            }
        }
        outcome
    }
}

impl Task for UnsetGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        self.drive(ctx).result
    }
}
