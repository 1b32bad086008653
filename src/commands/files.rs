//! Commands that edit the dotfiles tree itself: `init`, `push`, `pop` and
//! `groupis`.
use std::collections::BTreeSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use walkdir::WalkDir;

use super::{CommandSetup, absolute_paths, confirm, plan_table, run_tasks_to_completion};
use crate::cli::{GlobalOpts, GroupisOpts, PopOpts, PushOpts};
use crate::config::root::{DotfilesRoot, TreeKind, candidate_roots, default_root};
use crate::config::selection::ConflictPolicy;
use crate::config::targets::split_group_name;
use crate::config::validation::{is_ignored, validate_group_name};
use crate::error::{ResolutionError, SetupError, relative_display};
use crate::logging::{Log, Logger};
use crate::tasks::files::{PopGroup, PushFiles, push_destination, variant_dirs};
use crate::tasks::plan::GroupPlan;
use crate::tasks::unresolved::MissingGroup;
use crate::tasks::{Context, Task};

/// Run `init`.
///
/// An existing root is completed in place; otherwise the root is created
/// at the first candidate location.
///
/// # Errors
///
/// Returns an error if no location is available or a directory cannot be
/// created.
pub fn run_init(global: &GlobalOpts, setup: &CommandSetup, log: &Arc<Logger>) -> Result<()> {
    let profile = global.profile.as_deref();
    let env = setup.env.as_ref();
    let root = match DotfilesRoot::locate(profile, env) {
        Ok(root) => root.path().to_path_buf(),
        Err(_) => default_root(profile, env).ok_or_else(|| SetupError::RootNotFound {
            searched: candidate_roots(profile, env),
        })?,
    };
    init(&root, global.dry_run, log.as_ref())
}

/// Create `Configs/`, `Hooks/` and `Secrets/` under `root`.
///
/// # Errors
///
/// Returns an error if a directory cannot be created.
pub fn init(root: &Path, dry_run: bool, log: &dyn Log) -> Result<()> {
    for kind in TreeKind::ALL {
        let dir = root.join(kind.dir_name());
        if dir.is_dir() {
            log.debug(&format!("{} already exists", dir.display()));
        } else if dry_run {
            log.dry_run(&format!("would create {}", dir.display()));
        } else {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            log.info(&format!("created {}", dir.display()));
        }
    }
    if !dry_run {
        log.info(&format!("dotfiles directory ready at {}", root.display()));
    }
    Ok(())
}

/// Run `push`.
///
/// # Errors
///
/// Returns an error if setup fails or a file cannot be copied.
pub fn run_push(
    global: &GlobalOpts,
    opts: &PushOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
    push(&ctx, opts, log)
}

/// Copy files (directories recursively) into `Configs/<group>/`.
///
/// # Errors
///
/// Returns an error if the group name is invalid or any file fails.
pub fn push(ctx: &Context, opts: &PushOpts, log: &Arc<Logger>) -> Result<()> {
    validate_group_name(&opts.group)?;
    let files = expand_dirs(absolute_paths(&opts.files)?);

    let existing = files
        .iter()
        .filter(|file| push_destination(ctx, &opts.group, file).exists())
        .count();
    if existing > 0
        && !confirm(
            &format!(
                "{existing} file(s) already in {} will be overwritten. Continue?",
                opts.group
            ),
            opts.assume_yes,
            ctx.dry_run(),
        )?
    {
        log.warn("aborted; nothing was changed");
        return Ok(());
    }

    let tasks: Vec<Box<dyn Task>> = vec![Box::new(PushFiles::new(opts.group.clone(), files))];
    run_tasks_to_completion(&tasks, ctx, log, false)
}

/// Replace every directory with the files below it.
fn expand_dirs(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path);
            continue;
        }
        files.extend(
            WalkDir::new(&path)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_ignored(&e.file_name().to_string_lossy()))
                .filter_map(Result::ok)
                .filter(|e| !e.file_type().is_dir())
                .map(walkdir::DirEntry::into_path),
        );
    }
    files
}

/// Run `pop`.
///
/// # Errors
///
/// Returns an error if setup fails or a group cannot be deleted.
pub fn run_pop(
    global: &GlobalOpts,
    opts: &PopOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
    pop(&ctx, opts, log)
}

/// Delete every variant directory of the named groups from `Configs/`.
///
/// Unknown names fail with exit code 4 once the other groups are deleted.
///
/// # Errors
///
/// Returns an error if `Configs/` cannot be read or any group fails.
pub fn pop(ctx: &Context, opts: &PopOpts, log: &Arc<Logger>) -> Result<()> {
    let configs = ctx.config.root.require(TreeKind::Configs)?;
    let mut tasks: Vec<Box<dyn Task>> = Vec::new();
    let mut doomed: Vec<String> = Vec::new();

    for group in &opts.groups {
        let dirs = variant_dirs(&configs, group)?;
        if dirs.is_empty() {
            tasks.push(Box::new(MissingGroup::new(ResolutionError::NoSuchGroup {
                group: group.clone(),
            })));
            continue;
        }
        if let Ok(resolved) = ctx.config.configs.get(group) {
            let linked = GroupPlan::build(resolved, ctx.target_base(), ctx.env.as_ref())
                .summary()?
                .linked;
            if linked > 0 {
                log.warn(&format!(
                    "{group} still has {linked} symlinked file(s); they will be left dangling"
                ));
            }
        }
        doomed.extend(
            dirs.iter()
                .map(|d| relative_display(d, ctx.config.root.path())),
        );
        tasks.push(Box::new(PopGroup::new(group.clone(), dirs)));
    }

    if !doomed.is_empty()
        && !confirm(
            &format!("Delete {}?", doomed.join(", ")),
            opts.assume_yes,
            ctx.dry_run(),
        )?
    {
        log.warn("aborted; nothing was changed");
        return Ok(());
    }
    run_tasks_to_completion(&tasks, ctx, log, false)
}

/// Run `groupis`: print the owning group of every path, one per line.
///
/// # Errors
///
/// Returns an error if setup fails or a path belongs to no group.
pub fn run_groupis(
    global: &GlobalOpts,
    opts: &GroupisOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
    let plans: Vec<GroupPlan> = plan_table(&ctx, &ctx.config.configs).into_values().collect();
    let mut unowned = None;
    let mut out = std::io::stdout().lock();

    for path in absolute_paths(&opts.paths)? {
        let groups = owners(&ctx, &plans, &path);
        if groups.is_empty() {
            log.warn(&format!("{} is not managed by any group", path.display()));
            unowned.get_or_insert(path);
            continue;
        }
        for group in groups {
            writeln!(out, "{group}")?;
        }
    }

    match unowned {
        Some(path) => Err(ResolutionError::NoSuchFile { path }.into()),
        None => Ok(()),
    }
}

/// Base groups that own `path`.
///
/// `path` is owned when it lies inside a group directory under `Configs/`,
/// or when it is (or contains) the deployment path of a managed file.
#[must_use]
pub fn owners(ctx: &Context, plans: &[GroupPlan], path: &Path) -> BTreeSet<String> {
    let configs = ctx.config.root.dir(TreeKind::Configs);
    if let Ok(rest) = path.strip_prefix(&configs)
        && let Some(dir) = rest.components().next()
    {
        let dir_name = dir.as_os_str().to_string_lossy();
        return BTreeSet::from([split_group_name(&dir_name).0.to_string()]);
    }

    plans
        .iter()
        .filter(|plan| {
            plan.entries
                .iter()
                .any(|entry| entry.deployment.starts_with(path))
        })
        .map(|plan| plan.group.clone())
        .collect()
}
