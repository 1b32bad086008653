//! The dotfiles tree as configuration.
//!
//! Nothing here mutates the filesystem: [`Config::load`] is a pure function
//! from the directory tree and a [`selection::SelectionContext`] to resolved
//! group tables.
pub mod env;
pub mod groups;
pub mod paths;
pub mod profiles;
pub mod root;
pub mod selection;
pub mod targets;
pub mod validation;

use anyhow::{Context, Result};

use groups::GroupTable;
use root::{DotfilesRoot, TreeKind};
use selection::SelectionContext;

/// The resolved dotfiles tree for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Active root.
    pub root: DotfilesRoot,
    /// Groups under `Configs/`.
    pub configs: GroupTable,
    /// Groups under `Hooks/` (empty when the directory is absent).
    pub hooks: GroupTable,
    /// Groups under `Secrets/` (empty when the directory is absent).
    pub secrets: GroupTable,
}

impl Config {
    /// Scan every top-level directory of `root`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SetupError::MissingDirectory`] when `Configs/`
    /// is absent, or an I/O error while scanning.
    pub fn load(root: DotfilesRoot, selection: &SelectionContext) -> Result<Self> {
        let configs_dir = root.require(TreeKind::Configs)?;
        let configs = GroupTable::scan(&configs_dir, selection).context("scanning Configs")?;
        let hooks = GroupTable::scan(&root.dir(TreeKind::Hooks), selection)
            .context("scanning Hooks")?;
        let secrets = GroupTable::scan(&root.dir(TreeKind::Secrets), selection)
            .context("scanning Secrets")?;

        Ok(Self {
            root,
            configs,
            hooks,
            secrets,
        })
    }

    /// Table for one top-level directory.
    #[must_use]
    pub const fn table(&self, kind: TreeKind) -> &GroupTable {
        match kind {
            TreeKind::Configs => &self.configs,
            TreeKind::Hooks => &self.hooks,
            TreeKind::Secrets => &self.secrets,
        }
    }

    /// Whether any hook group resolves in this context.
    #[must_use]
    pub fn has_hooks(&self) -> bool {
        self.hooks.names().next().is_some()
    }
}
