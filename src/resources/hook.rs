//! Hook scripts under `Hooks/<group>/`.
//!
//! A hook is a value (script path, phase, group) so the set/unset pipelines
//! can be driven by a fake [`Executor`] in tests.
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::groups::ResolvedGroup;
use crate::error::HookError;
use crate::exec::Executor;
use crate::platform::Family;

/// When a hook runs, decided by its filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    /// `pre_*`: before symlinking during `set`.
    Pre,
    /// `post_*`: after symlinking during `set`.
    Post,
    /// `rm_*`: before unlinking during `unset`.
    Cleanup,
}

impl HookPhase {
    /// Every phase, in pipeline order.
    pub const ALL: [Self; 3] = [Self::Pre, Self::Post, Self::Cleanup];

    /// Filename prefix that selects this phase.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Pre => "pre_",
            Self::Post => "post_",
            Self::Cleanup => "rm_",
        }
    }

    /// Phase for a hook file name; `None` for unprefixed files.
    ///
    /// ```
    /// use tuckr_cli::resources::hook::HookPhase;
    ///
    /// assert_eq!(HookPhase::from_file_name("pre_install.sh"), Some(HookPhase::Pre));
    /// assert_eq!(HookPhase::from_file_name("rm_cache"), Some(HookPhase::Cleanup));
    /// assert_eq!(HookPhase::from_file_name("README.md"), None);
    /// ```
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| name.starts_with(p.prefix()))
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pre => "pre",
            Self::Post => "post",
            Self::Cleanup => "cleanup",
        })
    }
}

/// One hook script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hook {
    /// Base group the hook belongs to.
    pub group: String,
    /// Phase it runs in.
    pub phase: HookPhase,
    /// Absolute path of the script.
    pub path: PathBuf,
}

impl Hook {
    /// Script file name.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |n| n.to_string_lossy().to_string(),
        )
    }

    /// Directory the hook runs in: the variant directory holding it.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Program and arguments used to run the script on `family`.
    ///
    /// Executable scripts run directly on Unix; anything else goes through
    /// `sh`. Windows always uses `cmd /C`.
    #[must_use]
    pub fn command(&self, family: Family) -> (&OsStr, Vec<&OsStr>) {
        match family {
            Family::Windows => (
                OsStr::new("cmd"),
                vec![OsStr::new("/C"), self.path.as_os_str()],
            ),
            Family::Unix if is_executable(&self.path) => (self.path.as_os_str(), Vec::new()),
            Family::Unix => (OsStr::new("sh"), vec![self.path.as_os_str()]),
        }
    }

    /// Run the hook to completion with inherited standard streams.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Spawn`] if the process cannot start and
    /// [`HookError::Failed`] if it exits non-zero.
    pub fn run(&self, executor: &dyn Executor, family: Family) -> Result<(), HookError> {
        let (program, args) = self.command(family);
        let result = executor
            .run_interactive(self.working_dir(), program, &args)
            .map_err(|source| HookError::Spawn {
                hook: self.path.clone(),
                source,
            })?;
        if result.success {
            Ok(())
        } else {
            Err(HookError::Failed {
                hook: self.path.clone(),
                code: result.code,
            })
        }
    }
}

/// Hooks of a resolved `Hooks/` group, sorted by file name.
///
/// Only files directly inside a variant directory count; nested files and
/// unprefixed names are ignored. When two variants hold a hook with the same
/// name the higher-priority one wins.
#[must_use]
pub fn discover(group: &ResolvedGroup) -> Vec<Hook> {
    group
        .files
        .iter()
        .filter(|f| f.logical.components().count() == 1)
        .filter_map(|f| {
            let name = f.logical.to_str()?;
            Some(Hook {
                group: group.name.clone(),
                phase: HookPhase::from_file_name(name)?,
                path: f.source.clone(),
            })
        })
        .collect()
}

/// Hooks of one phase, in run order.
pub fn of_phase(hooks: &[Hook], phase: HookPhase) -> impl Iterator<Item = &Hook> {
    hooks.iter().filter(move |h| h.phase == phase)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
const fn is_executable(_path: &Path) -> bool {
    false
}
