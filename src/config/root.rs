//! Locating the dotfiles root and its top-level layout.
use std::fmt;
use std::path::{Path, PathBuf};

use super::env::Environment;
use crate::error::SetupError;

/// Base name of the dotfiles directory.
pub const ROOT_NAME: &str = "dotfiles";

/// The three top-level directories of a dotfiles root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeKind {
    /// `Configs/`: files deployed as symlinks.
    Configs,
    /// `Hooks/`: setup and cleanup scripts.
    Hooks,
    /// `Secrets/`: encrypted files.
    Secrets,
}

impl TreeKind {
    /// Every kind, in layout order.
    pub const ALL: [Self; 3] = [Self::Configs, Self::Hooks, Self::Secrets];

    /// Directory name under the root.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Configs => "Configs",
            Self::Hooks => "Hooks",
            Self::Secrets => "Secrets",
        }
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Directory name for a profile: `dotfiles` or `dotfiles_<profile>`.
#[must_use]
pub fn root_dir_name(profile: Option<&str>) -> String {
    profile.map_or_else(|| ROOT_NAME.to_string(), |p| format!("{ROOT_NAME}_{p}"))
}

/// Where the root for `profile` may live, in search order.
///
/// `TUCKR_HOME` overrides the search entirely.
#[must_use]
pub fn candidate_roots(profile: Option<&str>, env: &dyn Environment) -> Vec<PathBuf> {
    let name = root_dir_name(profile);
    if let Some(home) = env.var("TUCKR_HOME") {
        return vec![PathBuf::from(home).join(name)];
    }

    let mut candidates = Vec::new();
    if let Some(config) = env.config_dir() {
        candidates.push(config.join(&name));
    }
    if let Some(home) = env.home_dir() {
        candidates.push(home.join(format!(".{name}")));
    }
    candidates
}

/// Where `tuckr init` creates a new root.
#[must_use]
pub fn default_root(profile: Option<&str>, env: &dyn Environment) -> Option<PathBuf> {
    candidate_roots(profile, env).into_iter().next()
}

/// The active dotfiles root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotfilesRoot {
    path: PathBuf,
    profile: Option<String>,
}

impl DotfilesRoot {
    /// Wrap an existing directory.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, profile: Option<String>) -> Self {
        Self {
            path: path.into(),
            profile,
        }
    }

    /// Find the root for `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::RootNotFound`] when no candidate exists.
    pub fn locate(profile: Option<&str>, env: &dyn Environment) -> Result<Self, SetupError> {
        let searched = candidate_roots(profile, env);
        if let Some(found) = searched.iter().find(|p| p.is_dir()) {
            return Ok(Self::new(found.clone(), profile.map(str::to_string)));
        }
        Err(SetupError::RootNotFound { searched })
    }

    /// Root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active profile, if any.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Path of a top-level directory, whether or not it exists.
    #[must_use]
    pub fn dir(&self, kind: TreeKind) -> PathBuf {
        self.path.join(kind.dir_name())
    }

    /// Path of a top-level directory that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::MissingDirectory`] when it does not.
    pub fn require(&self, kind: TreeKind) -> Result<PathBuf, SetupError> {
        let dir = self.dir(kind);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(SetupError::MissingDirectory { path: dir })
        }
    }
}
