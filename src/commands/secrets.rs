//! Commands: `encrypt` and `decrypt`.
//!
//! Both shell out to `age`, which asks for the passphrase on the terminal,
//! so files are processed one at a time.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, absolute_paths, run_tasks_to_completion, select_plans, unresolved_tasks};
use crate::cli::{EncryptOpts, GlobalOpts, UnlinkOpts};
use crate::config::root::TreeKind;
use crate::config::selection::ConflictPolicy;
use crate::config::validation::validate_group_name;
use crate::logging::{Log, Logger};
use crate::resources::secret::{AgeCipher, Cipher};
use crate::tasks::plan::detect_overlaps;
use crate::tasks::secrets::{DecryptGroup, EncryptFiles};
use crate::tasks::selection::Purpose;
use crate::tasks::{Context, Task};

/// Run `encrypt`.
///
/// # Errors
///
/// Returns an error if setup fails, `age` is not installed, or a file
/// cannot be encrypted.
pub fn run_encrypt(
    global: &GlobalOpts,
    opts: &EncryptOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
    let cipher = AgeCipher::locate(Arc::clone(&ctx.executor))?;
    encrypt(&ctx, opts, Arc::new(cipher), log)
}

/// Run `decrypt`.
///
/// # Errors
///
/// Returns an error if setup fails, `age` is not installed, or any group
/// fails.
pub fn run_decrypt(
    global: &GlobalOpts,
    opts: &UnlinkOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
    let cipher = AgeCipher::locate(Arc::clone(&ctx.executor))?;
    decrypt(&ctx, opts, Arc::new(cipher), log)
}

/// Encrypt files into `Secrets/<group>/`.
///
/// # Errors
///
/// Returns an error if the group name is invalid, `Secrets/` is missing, or
/// a file cannot be encrypted.
pub fn encrypt(
    ctx: &Context,
    opts: &EncryptOpts,
    cipher: Arc<dyn Cipher>,
    log: &Arc<Logger>,
) -> Result<()> {
    validate_group_name(&opts.group)?;
    ctx.config.root.require(TreeKind::Secrets)?;
    let files = absolute_paths(&opts.files)?;

    let tasks: Vec<Box<dyn Task>> = vec![Box::new(EncryptFiles::new(
        opts.group.clone(),
        files,
        cipher,
    ))];
    run_tasks_to_completion(&tasks, &sequential(ctx), log, false)
}

/// Decrypt the selected secret groups to their deployment paths.
///
/// # Errors
///
/// Returns an error if `Secrets/` is missing or any group fails.
pub fn decrypt(
    ctx: &Context,
    opts: &UnlinkOpts,
    cipher: Arc<dyn Cipher>,
    log: &Arc<Logger>,
) -> Result<()> {
    ctx.config.root.require(TreeKind::Secrets)?;
    let (mut plans, missing) = select_plans(
        ctx,
        &ctx.config.secrets,
        &opts.groups,
        &opts.exclude,
        Purpose::Every,
    )?;
    detect_overlaps(&mut plans);

    let mut tasks: Vec<Box<dyn Task>> = plans
        .into_iter()
        .map(|plan| Box::new(DecryptGroup::new(plan, Arc::clone(&cipher))) as Box<dyn Task>)
        .collect();
    tasks.extend(unresolved_tasks(&ctx.config.secrets, missing));
    if tasks.is_empty() {
        log.info("nothing to decrypt");
        return Ok(());
    }
    run_tasks_to_completion(&tasks, &sequential(ctx), log, false)
}

fn sequential(ctx: &Context) -> Context {
    let mut ctx = ctx.with_log(Arc::clone(&ctx.log));
    ctx.parallel = false;
    ctx
}
