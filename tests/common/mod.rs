// Shared helpers for integration tests.
//
// Provides a temporary dotfiles root next to a temporary target directory,
// an injected environment pointing at both, and a recording executor, so
// each integration test drives the real commands without touching the
// user's home directory.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tuckr_cli::cli::GlobalOpts;
use tuckr_cli::commands::CommandSetup;
use tuckr_cli::config::env::StaticEnvironment;
use tuckr_cli::exec::{ExecResult, Executor};
use tuckr_cli::logging::Logger;
use tuckr_cli::platform::{Os, Platform};

/// An [`Executor`] that records every program it is asked to run.
///
/// Scripts "exit" with the queued codes in order, then with zero.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    codes: Mutex<Vec<i32>>,
    runs: Mutex<Vec<PathBuf>>,
}

impl RecordingExecutor {
    /// An executor whose next runs exit with `codes`.
    pub fn with_codes(codes: &[i32]) -> Self {
        Self {
            codes: Mutex::new(codes.iter().rev().copied().collect()),
            runs: Mutex::new(Vec::new()),
        }
    }

    /// File names of the programs run so far, in order.
    pub fn runs(&self) -> Vec<String> {
        self.runs
            .lock()
            .expect("runs lock")
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl Executor for RecordingExecutor {
    fn run_interactive(
        &self,
        _dir: &Path,
        program: &OsStr,
        args: &[&OsStr],
    ) -> std::io::Result<ExecResult> {
        // `sh script` and direct execution both name the script last.
        let script = args.last().copied().unwrap_or(program);
        self.runs
            .lock()
            .expect("runs lock")
            .push(PathBuf::from(script));
        let code = self.codes.lock().expect("codes lock").pop().unwrap_or(0);
        Ok(ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            success: code == 0,
            code: Some(code),
        })
    }

    fn which(&self, _program: &str) -> Option<PathBuf> {
        None
    }
}

/// An isolated dotfiles root and target directory backed by a
/// [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    /// Holds `dotfiles/` and `home/`.
    pub dir: tempfile::TempDir,
    /// Executor shared with every [`CommandSetup`] built from this context.
    pub executor: Arc<RecordingExecutor>,
    platform: Platform,
}

impl IntegrationTestContext {
    /// The dotfiles root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("dotfiles")
    }

    /// The target directory.
    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// A path under the target directory.
    pub fn home_path(&self, relative: &str) -> PathBuf {
        self.home().join(relative)
    }

    /// Write a file under the target directory.
    pub fn write_home(&self, relative: &str, content: &str) -> PathBuf {
        write(&self.home_path(relative), content)
    }

    /// Whether `relative` under the target directory is a symlink.
    pub fn is_linked(&self, relative: &str) -> bool {
        self.home_path(relative)
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
    }

    /// Every entry under the dotfiles root and the target directory, keyed
    /// by relative path: `dir`, `file:<content>` or `link:<target>`.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        walkdir::WalkDir::new(self.dir.path())
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.expect("walk test tree"))
            .map(|entry| {
                let path = entry.path();
                let kind = entry.file_type();
                let value = if kind.is_symlink() {
                    format!("link:{}", std::fs::read_link(path).expect("read link").display())
                } else if kind.is_dir() {
                    "dir".to_string()
                } else {
                    format!("file:{}", std::fs::read_to_string(path).expect("read file"))
                };
                let key = path
                    .strip_prefix(self.dir.path())
                    .expect("under test dir")
                    .display()
                    .to_string();
                (key, value)
            })
            .collect()
    }

    /// Services pointing at this context's directories.
    pub fn setup(&self) -> CommandSetup {
        let env = StaticEnvironment::new()
            .with_var("TUCKR_HOME", self.dir.path().to_string_lossy())
            .with_var("TUCKR_TARGET", self.home().to_string_lossy())
            .with_home(self.home());
        CommandSetup::new(
            Arc::new(env),
            Arc::clone(&self.executor) as Arc<dyn Executor>,
            self.platform.clone(),
        )
    }

    /// Default global options: no profile, no targets, parallel.
    pub fn global(&self) -> GlobalOpts {
        GlobalOpts {
            profile: None,
            targets: Vec::new(),
            dry_run: false,
            parallel: true,
        }
    }

    /// A fresh logger for one command.
    pub fn logger(&self) -> Arc<Logger> {
        Arc::new(Logger::new("test"))
    }
}

fn write(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
    path.to_path_buf()
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// A root with empty `Configs/`, `Hooks/` and `Secrets/` on Linux.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        for sub in ["dotfiles/Configs", "dotfiles/Hooks", "dotfiles/Secrets", "home"] {
            std::fs::create_dir_all(dir.path().join(sub)).expect("create dir");
        }
        Self {
            ctx: IntegrationTestContext {
                dir,
                executor: Arc::new(RecordingExecutor::default()),
                platform: Platform::new(Os::Linux, false),
            },
        }
    }

    /// Write `Configs/<variant>/<logical>`.
    pub fn with_config_file(self, variant: &str, logical: &str, content: &str) -> Self {
        write(
            &self.ctx.root().join("Configs").join(variant).join(logical),
            content,
        );
        self
    }

    /// Write `Hooks/<variant>/<name>`.
    pub fn with_hook(self, variant: &str, name: &str) -> Self {
        write(
            &self.ctx.root().join("Hooks").join(variant).join(name),
            "#!/bin/sh\n",
        );
        self
    }

    /// Scripts run through the executor exit with `codes`, in order.
    pub fn with_hook_codes(mut self, codes: &[i32]) -> Self {
        self.ctx.executor = Arc::new(RecordingExecutor::with_codes(codes));
        self
    }

    /// Pretend to run on `platform`.
    pub fn on(mut self, platform: Platform) -> Self {
        self.ctx.platform = platform;
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}
