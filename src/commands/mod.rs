//! Top-level subcommand orchestration.
//!
//! Every command builds a [`Context`] through [`CommandSetup`], turns the
//! requested groups into [`Task`]s and hands them to
//! [`run_tasks_to_completion`].
pub mod add;
pub mod completions;
pub mod files;
pub mod list;
mod scheduler;
pub mod secrets;
pub mod set;
pub mod status;
pub mod version;

use std::collections::BTreeMap;
use std::io::{BufRead, IsTerminal as _, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::config::env::{Environment, SystemEnvironment};
use crate::config::groups::GroupTable;
use crate::config::root::DotfilesRoot;
use crate::config::selection::{ConflictPolicy, SelectionContext};
use crate::error::{ResolutionError, ReturnCode, TuckrError};
use crate::exec::{Executor, SystemExecutor};
use crate::interrupt::Interrupt;
use crate::logging::{Log, Logger};
use crate::platform::Platform;
use crate::tasks::plan::GroupPlan;
use crate::tasks::selection::{Candidate, Purpose, select};
use crate::tasks::unresolved::{MissingGroup, UnsupportedGroup};
use crate::tasks::{self, Context, Task};

/// The services every command runs against.
///
/// `main` uses [`CommandSetup::system`]; tests inject a static environment
/// and a fake executor.
#[derive(Debug, Clone)]
pub struct CommandSetup {
    /// Environment variables and well-known directories.
    pub env: Arc<dyn Environment>,
    /// Runs hooks and the cipher.
    pub executor: Arc<dyn Executor>,
    /// Host platform.
    pub platform: Platform,
    /// Raised by Ctrl-C.
    pub interrupt: Interrupt,
}

impl CommandSetup {
    /// The real process environment, executor and platform.
    #[must_use]
    pub fn system(interrupt: Interrupt) -> Self {
        Self {
            env: Arc::new(SystemEnvironment),
            executor: Arc::new(SystemExecutor),
            platform: Platform::detect(),
            interrupt,
        }
    }

    /// Explicit services with a fresh interrupt flag.
    #[must_use]
    pub fn new(env: Arc<dyn Environment>, executor: Arc<dyn Executor>, platform: Platform) -> Self {
        Self {
            env,
            executor,
            platform,
            interrupt: Interrupt::new(),
        }
    }

    /// Locate the dotfiles root, scan it and build the task context.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`](crate::error::SetupError) when the target
    /// directory, the root or its `Configs/` directory cannot be found, or an
    /// I/O error while scanning.
    pub fn context(
        &self,
        global: &GlobalOpts,
        policy: ConflictPolicy,
        log: Arc<dyn Log>,
    ) -> Result<Context> {
        let selection = SelectionContext::from_env(
            global.profile.clone(),
            &global.targets,
            self.env.as_ref(),
            self.platform.clone(),
        )?
        .with_dry_run(global.dry_run)
        .with_policy(policy);

        let root = DotfilesRoot::locate(global.profile.as_deref(), self.env.as_ref())?;
        log.debug(&format!("dotfiles root: {}", root.path().display()));
        if let Some(profile) = root.profile() {
            log.debug(&format!("profile: {profile}"));
        }
        log.debug(&format!("target: {}", selection.target_base.display()));
        if !selection.custom_targets.is_empty() {
            log.debug(&format!(
                "custom targets: {}",
                selection.custom_targets.join(", ")
            ));
        }

        let config = Config::load(root, &selection)?;
        for table in [&config.configs, &config.hooks, &config.secrets] {
            for err in table.rejected() {
                log.warn(&format!("ignoring directory: {err}"));
            }
        }

        Ok(Context::new(
            Arc::new(config),
            Arc::new(selection),
            log,
            Arc::clone(&self.env),
            Arc::clone(&self.executor),
            global.parallel,
        )
        .with_interrupt(self.interrupt.clone()))
    }
}

/// Plan every group of `table`, keyed by group name.
pub(crate) fn plan_table(ctx: &Context, table: &GroupTable) -> BTreeMap<String, GroupPlan> {
    table
        .groups()
        .map(|group| {
            (
                group.name.clone(),
                GroupPlan::build(group, ctx.target_base(), ctx.env.as_ref()),
            )
        })
        .collect()
}

/// Wildcard candidates with their live status counts.
pub(crate) fn candidates(plans: &BTreeMap<String, GroupPlan>) -> Result<Vec<Candidate>> {
    plans
        .values()
        .map(|plan| Ok(Candidate::new(plan.group.clone(), plan.summary()?)))
        .collect()
}

/// Select groups of `table` and return their plans, in selection order,
/// together with the requested names that did not resolve.
pub(crate) fn select_plans(
    ctx: &Context,
    table: &GroupTable,
    names: &[String],
    exclude: &[String],
    purpose: Purpose,
) -> Result<(Vec<GroupPlan>, Vec<ResolutionError>)> {
    let mut plans = plan_table(ctx, table);
    let selection = select(names, exclude, purpose, ctx.policy(), &candidates(&plans)?)?;
    let selected = selection
        .groups
        .iter()
        .filter_map(|group| plans.remove(group))
        .collect();
    Ok((selected, selection.missing))
}

/// Resolve command-line paths against the working directory.
///
/// Paths are not canonicalized, so a symlink names itself rather than its
/// target.
pub(crate) fn absolute_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    paths
        .iter()
        .map(|path| {
            std::path::absolute(path).with_context(|| format!("resolving {}", path.display()))
        })
        .collect()
}

/// One task per requested group that did not resolve.
///
/// Groups that exist only for other platforms are skipped; the rest fail
/// with their resolution error.
pub(crate) fn unresolved_tasks(
    table: &GroupTable,
    missing: Vec<ResolutionError>,
) -> Vec<Box<dyn Task>> {
    missing
        .into_iter()
        .map(|err| -> Box<dyn Task> {
            if let ResolutionError::NoSuchGroup { group } = &err
                && let Some(variants) = table.unsupported().get(group)
            {
                return Box::new(UnsupportedGroup::new(group.clone(), variants.clone()));
            }
            Box::new(MissingGroup::new(err))
        })
        .collect()
}

/// Execute every task, print the summary, and fail if any task failed.
///
/// With `parallel`, groups run on a bounded pool of worker threads, each
/// writing to its own buffered log.
///
/// # Errors
///
/// Returns [`TuckrError::RunFailed`] carrying the worst exit code when one or
/// more tasks failed.
pub fn run_tasks_to_completion(
    tasks: &[Box<dyn Task>],
    ctx: &Context,
    log: &Arc<Logger>,
    parallel: bool,
) -> Result<()> {
    let code = if parallel && tasks.len() > 1 {
        scheduler::run_tasks_parallel(tasks, ctx, log)
    } else {
        tasks
            .iter()
            .map(|task| tasks::execute(task.as_ref(), ctx))
            .fold(ReturnCode::Success, ReturnCode::worst)
    };

    log.print_summary();
    if ctx.interrupt.is_requested() {
        log.warn("interrupted; groups not started were skipped");
    }

    let failed = log.failure_count();
    if failed > 0 {
        return Err(TuckrError::RunFailed {
            failed,
            code: code.worst(ReturnCode::Failure),
        }
        .into());
    }
    Ok(())
}

/// Ask the user to confirm a destructive action.
///
/// `-y` and dry runs answer yes without asking. When standard input is not
/// a terminal nobody can answer, so the action is refused.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or written.
pub fn confirm(prompt: &str, assume_yes: bool, dry_run: bool) -> Result<bool> {
    if assume_yes || dry_run {
        return Ok(true);
    }
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }
    confirm_with(prompt, &mut stdin.lock(), &mut std::io::stderr().lock())
}

/// [`confirm`] against explicit streams.
///
/// # Errors
///
/// Returns an error if `input` cannot be read or `output` written.
pub fn confirm_with(
    prompt: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::env::StaticEnvironment;
    use crate::logging::TaskStatus;
    use crate::platform::Os;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::TaskResult;
    use crate::tasks::test_helpers::TestTree;
    use std::path::PathBuf;

    #[derive(Debug)]
    struct Fixed(&'static str, Option<ReturnCode>);

    impl Task for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            match self.1 {
                None => Ok(TaskResult::Ok),
                Some(code) => Err(TuckrError::FilesFailed { failed: 1, code }.into()),
            }
        }
    }

    fn logged(tree: &TestTree) -> (Context, Arc<Logger>) {
        let logger = Arc::new(Logger::new("test"));
        let ctx = tree.context().with_log(Arc::clone(&logger) as Arc<dyn Log>);
        (ctx, logger)
    }

    fn global(profile: Option<&str>) -> GlobalOpts {
        GlobalOpts {
            profile: profile.map(str::to_string),
            targets: Vec::new(),
            dry_run: false,
            parallel: false,
        }
    }

    #[test]
    fn confirm_accepts_yes() {
        let mut out = Vec::new();
        assert!(confirm_with("go?", &mut "y\n".as_bytes(), &mut out).unwrap());
        assert!(confirm_with("go?", &mut "YES\n".as_bytes(), &mut out).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "go? [y/N] go? [y/N] ");
    }

    #[test]
    fn confirm_defaults_to_no() {
        let mut out = Vec::new();
        assert!(!confirm_with("go?", &mut "\n".as_bytes(), &mut out).unwrap());
        assert!(!confirm_with("go?", &mut "nope\n".as_bytes(), &mut out).unwrap());
        assert!(!confirm_with("go?", &mut "".as_bytes(), &mut out).unwrap());
    }

    #[test]
    fn confirm_skips_the_prompt_when_told_to() {
        assert!(confirm("go?", true, false).unwrap());
        assert!(confirm("go?", false, true).unwrap());
    }

    #[test]
    fn run_succeeds_when_every_task_does() {
        let tree = TestTree::new();
        let (ctx, logger) = logged(&tree);
        let tasks: Vec<Box<dyn Task>> = vec![Box::new(Fixed("a", None)), Box::new(Fixed("b", None))];

        run_tasks_to_completion(&tasks, &ctx, &logger, false).unwrap();
        assert_eq!(logger.count(TaskStatus::Ok), 2);
    }

    #[test]
    fn run_failure_carries_the_worst_code() {
        let tree = TestTree::new();
        let (ctx, logger) = logged(&tree);
        let tasks: Vec<Box<dyn Task>> = vec![
            Box::new(Fixed("a", Some(ReturnCode::Failure))),
            Box::new(Fixed("b", None)),
            Box::new(Fixed("c", Some(ReturnCode::DecryptionFailed))),
        ];

        let err = run_tasks_to_completion(&tasks, &ctx, &logger, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TuckrError>(),
            Some(TuckrError::RunFailed { failed: 2, code: ReturnCode::DecryptionFailed })
        ));
        assert_eq!(logger.count(TaskStatus::Ok), 1);
    }

    #[test]
    fn interrupted_run_skips_every_task() {
        let tree = TestTree::new();
        let (ctx, logger) = logged(&tree);
        ctx.interrupt.request();
        let tasks: Vec<Box<dyn Task>> = vec![Box::new(Fixed("a", Some(ReturnCode::Failure)))];

        run_tasks_to_completion(&tasks, &ctx, &logger, false).unwrap();
        assert_eq!(logger.count(TaskStatus::Skipped), 1);
    }

    #[test]
    fn unresolved_tasks_tell_unsupported_from_missing() {
        let tree = TestTree::new();
        tree.config_file("wintools_windows", "tool.ini", "");
        let (ctx, logger) = logged(&tree);

        let tasks = unresolved_tasks(
            &ctx.config.configs,
            vec![
                ResolutionError::NoSuchGroup {
                    group: "wintools".to_string(),
                },
                ResolutionError::NoSuchGroup {
                    group: "nope".to_string(),
                },
            ],
        );
        let err = run_tasks_to_completion(&tasks, &ctx, &logger, false).unwrap_err();
        assert_eq!(crate::error::return_code(&err), ReturnCode::NoSuchFileOrDir);
        assert_eq!(logger.count(TaskStatus::Skipped), 1);
        assert_eq!(logger.count(TaskStatus::Failed), 1);
    }

    #[test]
    fn context_locates_root_from_tuckr_home() {
        let tree = TestTree::new();
        tree.config_file("zsh", ".zshrc", "");
        let parent: PathBuf = tree.root().parent().unwrap().to_path_buf();
        let env = StaticEnvironment::new()
            .with_var("TUCKR_HOME", parent.display().to_string())
            .with_home(tree.home());
        let setup = CommandSetup::new(
            Arc::new(env),
            Arc::new(MockExecutor::spawn_failure()),
            Platform::new(Os::Linux, false),
        );

        let ctx = setup
            .context(&global(None), ConflictPolicy::Skip, Arc::new(Logger::new("test")))
            .unwrap();
        assert_eq!(ctx.config.root.path(), tree.root());
        assert_eq!(ctx.target_base(), tree.home());
        assert!(ctx.config.configs.contains("zsh"));
    }

    #[test]
    fn context_reports_missing_root() {
        let tree = TestTree::new();
        let env = StaticEnvironment::new()
            .with_var("TUCKR_HOME", tree.home().display().to_string())
            .with_home(tree.home());
        let setup = CommandSetup::new(
            Arc::new(env),
            Arc::new(MockExecutor::spawn_failure()),
            Platform::new(Os::Linux, false),
        );

        let err = setup
            .context(&global(Some("work")), ConflictPolicy::Skip, Arc::new(Logger::new("test")))
            .unwrap_err();
        assert_eq!(
            crate::error::return_code(&err),
            ReturnCode::CouldntFindDotfiles
        );
    }
}
