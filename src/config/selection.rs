//! The immutable per-invocation context shared by every component.
use std::path::PathBuf;

use super::env::Environment;
use crate::error::SetupError;
use crate::platform::Platform;

/// What to do with a deployment path that is occupied by something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Leave it alone and report it.
    #[default]
    Skip,
    /// Delete it and put the symlink in its place.
    Force,
    /// Move its content into the repository, then link.
    Adopt,
}

impl ConflictPolicy {
    /// Build from the `--force` and `--adopt` flags (clap keeps them exclusive).
    #[must_use]
    pub const fn from_flags(force: bool, adopt: bool) -> Self {
        if adopt {
            Self::Adopt
        } else if force {
            Self::Force
        } else {
            Self::Skip
        }
    }

    /// Whether conflicting paths will be overwritten.
    #[must_use]
    pub const fn overrides_conflicts(self) -> bool {
        !matches!(self, Self::Skip)
    }
}

/// Profile, custom targets, dry-run flag, conflict policy, target directory
/// and platform for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionContext {
    /// Active profile (`dotfiles_<profile>`).
    pub profile: Option<String>,
    /// Active custom targets, highest priority first.
    pub custom_targets: Vec<String>,
    /// Simulate without touching the filesystem.
    pub dry_run: bool,
    /// Conflict handling.
    pub policy: ConflictPolicy,
    /// Base directory for unmarked logical paths.
    pub target_base: PathBuf,
    /// Host platform.
    pub platform: Platform,
}

impl SelectionContext {
    /// A context with defaults for everything but the target and platform.
    #[must_use]
    pub fn new(target_base: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            profile: None,
            custom_targets: Vec::new(),
            dry_run: false,
            policy: ConflictPolicy::Skip,
            target_base: target_base.into(),
            platform,
        }
    }

    /// Build the context from command-line values and the environment.
    ///
    /// Custom targets from `TUCKR_CUSTOM_TARGETS` rank after the ones given
    /// on the command line. The target base is `TUCKR_TARGET` or the home
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::NoTargetDirectory`] when neither is available.
    pub fn from_env(
        profile: Option<String>,
        cli_targets: &[String],
        env: &dyn Environment,
        platform: Platform,
    ) -> Result<Self, SetupError> {
        let target_base = env
            .var("TUCKR_TARGET")
            .map(PathBuf::from)
            .or_else(|| env.home_dir())
            .ok_or(SetupError::NoTargetDirectory)?;

        let from_env = env.var("TUCKR_CUSTOM_TARGETS").unwrap_or_default();
        let mut custom_targets: Vec<String> = Vec::new();
        for target in cli_targets
            .iter()
            .map(String::as_str)
            .chain(from_env.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            if !custom_targets.iter().any(|t| t == target) {
                custom_targets.push(target.to_string());
            }
        }

        Ok(Self {
            profile,
            custom_targets,
            ..Self::new(target_base, platform)
        })
    }

    /// Set the dry-run flag.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the conflict policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the custom targets.
    #[must_use]
    pub fn with_custom_targets(mut self, targets: &[&str]) -> Self {
        self.custom_targets = targets.iter().map(|t| (*t).to_string()).collect();
        self
    }
}
