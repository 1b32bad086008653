//! Encrypting files into `Secrets/<group>/` and restoring them.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use super::plan::GroupPlan;
use super::{Context, ProcessOpts, Task, TaskResult, TaskStats, process_applicable};
use crate::config::paths::to_logical;
use crate::config::root::TreeKind;
use crate::resources::secret::{Cipher, DecryptedFile, EncryptedFile};

/// `encrypt`: store files of one group as ciphertext.
#[derive(Debug)]
pub struct EncryptFiles {
    group: String,
    files: Vec<PathBuf>,
    cipher: Arc<dyn Cipher>,
}

impl EncryptFiles {
    /// Encrypt `files` (absolute paths) into `group`.
    #[must_use]
    pub fn new(group: impl Into<String>, files: Vec<PathBuf>, cipher: Arc<dyn Cipher>) -> Self {
        Self {
            group: group.into(),
            files,
            cipher,
        }
    }

    /// One resource per file; ciphertext goes to the file's logical path.
    fn resources(&self, ctx: &Context) -> Vec<EncryptedFile> {
        let group_dir = ctx.config.root.dir(TreeKind::Secrets).join(&self.group);
        self.files
            .iter()
            .map(|plaintext| EncryptedFile {
                plaintext: plaintext.clone(),
                ciphertext: group_dir.join(to_logical(plaintext, ctx.target_base())),
                cipher: Arc::clone(&self.cipher),
            })
            .collect()
    }
}

impl Task for EncryptFiles {
    fn name(&self) -> &str {
        &self.group
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let stats = process_applicable(ctx, self.resources(ctx), &ProcessOpts::apply_all("encrypt"))?;
        stats.finish(ctx)
    }
}

/// `decrypt`: restore every secret of one group to its deployment path.
#[derive(Debug)]
pub struct DecryptGroup {
    plan: GroupPlan,
    cipher: Arc<dyn Cipher>,
}

impl DecryptGroup {
    /// Decrypt the files of a planned `Secrets/` group.
    #[must_use]
    pub fn new(plan: GroupPlan, cipher: Arc<dyn Cipher>) -> Self {
        Self { plan, cipher }
    }
}

impl Task for DecryptGroup {
    fn name(&self) -> &str {
        &self.plan.group
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if self.plan.is_empty() {
            return Ok(TaskResult::Skipped("no secrets".to_string()));
        }
        let mut stats = TaskStats::new();
        self.plan.report_errors(ctx, &mut stats);
        let files = self.plan.entries.iter().map(|entry| DecryptedFile {
            ciphertext: entry.file.source.clone(),
            deployment: entry.deployment.clone(),
            cipher: Arc::clone(&self.cipher),
        });
        stats += process_applicable(ctx, files, &ProcessOpts::apply_all("decrypt"))?;
        stats.finish(ctx)
    }
}
