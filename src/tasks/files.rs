//! Moving files into and out of `Configs/`.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::{Context, ProcessOpts, Task, TaskResult, process_applicable};
use crate::config::paths::to_logical;
use crate::config::root::TreeKind;
use crate::config::targets::split_group_name;
use crate::config::validation::is_ignored;
use crate::resources::repo::{PushedFile, RemovedDir};

/// Where `file` is stored when pushed into `group`.
#[must_use]
pub fn push_destination(ctx: &Context, group: &str, file: &Path) -> PathBuf {
    ctx.config
        .root
        .dir(TreeKind::Configs)
        .join(group)
        .join(to_logical(file, ctx.target_base()))
}

/// Every directory under `configs_dir` that belongs to base group `group`,
/// whether or not it applies on this host.
///
/// # Errors
///
/// Returns an error if `configs_dir` cannot be read.
pub fn variant_dirs(configs_dir: &Path, group: &str) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let entries = std::fs::read_dir(configs_dir)
        .with_context(|| format!("reading {}", configs_dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading {}", configs_dir.display()))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if is_ignored(&name) || !entry.path().is_dir() {
            continue;
        }
        if split_group_name(&name).0 == group {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// `push`: copy files into one group.
#[derive(Debug)]
pub struct PushFiles {
    group: String,
    files: Vec<PathBuf>,
}

impl PushFiles {
    /// Push `files` (absolute paths) into `group`.
    #[must_use]
    pub fn new(group: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            group: group.into(),
            files,
        }
    }
}

impl Task for PushFiles {
    fn name(&self) -> &str {
        &self.group
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resources: Vec<PushedFile> = self
            .files
            .iter()
            .map(|file| PushedFile {
                source: file.clone(),
                destination: push_destination(ctx, &self.group, file),
            })
            .collect();
        let stats = process_applicable(ctx, resources, &ProcessOpts::apply_all("push"))?;
        stats.finish(ctx)
    }
}

/// `pop`: delete every variant directory of one group.
#[derive(Debug)]
pub struct PopGroup {
    group: String,
    dirs: Vec<PathBuf>,
}

impl PopGroup {
    /// Delete `dirs`, the variant directories of `group`.
    #[must_use]
    pub fn new(group: impl Into<String>, dirs: Vec<PathBuf>) -> Self {
        Self {
            group: group.into(),
            dirs,
        }
    }
}

impl Task for PopGroup {
    fn name(&self) -> &str {
        &self.group
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resources = self.dirs.iter().map(|path| RemovedDir { path: path.clone() });
        let stats = process_applicable(ctx, resources, &ProcessOpts::apply_all("delete"))?;
        stats.finish(ctx)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::{ReturnCode, TuckrError};
    use crate::tasks::test_helpers::{Level, TestTree};

    #[test]
    fn push_stores_file_at_its_logical_path() {
        let tree = TestTree::new();
        let file = tree.home_path(".config/nvim/init.lua");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "vim.o.number = true").unwrap();
        let ctx = tree.context();

        let result = PushFiles::new("nvim", vec![file]).run(&ctx).unwrap();
        assert_eq!(result, TaskResult::Ok);
        assert_eq!(
            std::fs::read_to_string(tree.root().join("Configs/nvim/.config/nvim/init.lua"))
                .unwrap(),
            "vim.o.number = true"
        );
    }

    #[test]
    fn push_continues_past_a_missing_file() {
        let tree = TestTree::new();
        let present = tree.home_path(".gitconfig");
        std::fs::write(&present, "[user]").unwrap();
        let ctx = tree.context();

        let err = PushFiles::new("git", vec![tree.home_path(".missing"), present])
            .run(&ctx)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TuckrError>(),
            Some(TuckrError::FilesFailed { failed: 1, code: ReturnCode::NoSuchFileOrDir })
        ));
        assert!(tree.root().join("Configs/git/.gitconfig").is_file());
    }

    #[test]
    fn push_dry_run_copies_nothing() {
        let tree = TestTree::new();
        let file = tree.home_path(".zshrc");
        std::fs::write(&file, "").unwrap();
        let (ctx, log) = tree.recorded_dry_run_context();

        PushFiles::new("zsh", vec![file]).run(&ctx).unwrap();
        assert!(!tree.root().join("Configs/zsh").exists());
        assert!(log.contains(Level::DryRun, "would push"));
    }

    #[test]
    fn variant_dirs_include_inapplicable_variants() {
        let tree = TestTree::new();
        tree.config_file("zsh", ".zshrc", "");
        tree.config_file("zsh_windows", ".zshrc", "");
        tree.config_file("zsh_#work", ".zshrc", "");
        tree.config_file("zshell", ".zshrc", "");

        let dirs = variant_dirs(&tree.root().join("Configs"), "zsh").unwrap();
        let names: Vec<_> = dirs
            .iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["zsh", "zsh_#work", "zsh_windows"]);
    }

    #[test]
    fn pop_deletes_every_variant() {
        let tree = TestTree::new();
        tree.config_file("zsh", ".zshrc", "");
        tree.config_file("zsh_windows", ".zshrc", "");
        tree.config_file("git", ".gitconfig", "");
        let ctx = tree.context();

        let dirs = variant_dirs(&tree.root().join("Configs"), "zsh").unwrap();
        assert_eq!(PopGroup::new("zsh", dirs).run(&ctx).unwrap(), TaskResult::Ok);
        assert!(!tree.root().join("Configs/zsh").exists());
        assert!(!tree.root().join("Configs/zsh_windows").exists());
        assert!(tree.root().join("Configs/git").exists());
    }
}
