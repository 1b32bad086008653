//! Domain-specific error types for tuckr.
//!
//! Internal modules return typed errors (e.g., [`SetupError`],
//! [`ResolutionError`]) while command handlers at the CLI boundary convert
//! them to [`anyhow::Error`] via the standard `?` operator. `main` recovers the
//! typed error from the chain with [`return_code`] to pick the exit status.
//!
//! # Error hierarchy
//!
//! ```text
//! TuckrError
//! ├── Setup(SetupError)           exit 2/3, aborts before any group runs
//! ├── Resolution(ResolutionError) exit 4 or 1, scoped to one group or file
//! ├── Selection(SelectionError)   exit 1
//! ├── Hook(HookError)             exit 1
//! ├── Secret(SecretError)         exit 4-7
//! ├── FilesFailed                 worst code of the files a group could not process
//! └── RunFailed                   worst code of the groups that failed
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use thiserror::Error;

/// Stable process exit codes.
///
/// The numeric order doubles as severity: when several groups fail the run
/// exits with the largest code, so reserved codes win over a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReturnCode {
    /// Everything went fine.
    #[default]
    Success = 0,
    /// Generic or partial failure (symlink, hook, ambiguity).
    Failure = 1,
    /// The dotfiles root could not be found.
    CouldntFindDotfiles = 2,
    /// `Configs/`, `Hooks/` or `Secrets/` is missing.
    NoSetupFolder = 3,
    /// A referenced file or group does not exist.
    NoSuchFileOrDir = 4,
    /// A file could not be encrypted.
    EncryptionFailed = 5,
    /// A file could not be decrypted.
    DecryptionFailed = 6,
    /// Ciphertext could not be read.
    EncryptedReadFailed = 7,
}

impl ReturnCode {
    /// Numeric exit status.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The more severe of two codes.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }
}

impl From<ReturnCode> for ExitCode {
    fn from(code: ReturnCode) -> Self {
        Self::from(code.code())
    }
}

/// Top-level error type for tuckr.
#[derive(Error, Debug)]
pub enum TuckrError {
    /// The dotfiles tree could not be set up for this invocation.
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// A group or file could not be resolved.
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// The requested group selection is not allowed.
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// A hook script failed.
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    /// A secret could not be encrypted or decrypted.
    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    /// Some files of a group could not be processed; the rest were.
    #[error("{failed} file(s) could not be processed")]
    FilesFailed {
        /// Number of files that failed.
        failed: usize,
        /// Worst exit code among the failures.
        code: ReturnCode,
    },

    /// One or more groups did not complete successfully.
    #[error("{failed} group(s) failed")]
    RunFailed {
        /// Number of groups that failed.
        failed: usize,
        /// Worst exit code among the failures.
        code: ReturnCode,
    },
}

impl TuckrError {
    /// Exit code for this error.
    #[must_use]
    pub const fn return_code(&self) -> ReturnCode {
        match self {
            Self::Setup(e) => e.return_code(),
            Self::Resolution(e) => e.return_code(),
            Self::Selection(_) | Self::Hook(_) => ReturnCode::Failure,
            Self::Secret(e) => e.return_code(),
            Self::FilesFailed { code, .. } | Self::RunFailed { code, .. } => *code,
        }
    }
}

/// Errors that abort a command before any group is processed.
#[derive(Error, Debug)]
pub enum SetupError {
    /// No candidate location holds a dotfiles directory.
    #[error("couldn't find the dotfiles directory (searched {})", display_paths(.searched))]
    RootNotFound {
        /// Candidate locations, in search order.
        searched: Vec<PathBuf>,
    },

    /// A required top-level directory is missing from the dotfiles root.
    #[error("missing directory {}; run `tuckr init` to create it", .path.display())]
    MissingDirectory {
        /// The directory that should exist.
        path: PathBuf,
    },

    /// Neither `TUCKR_TARGET` nor a home directory is available.
    #[error("couldn't determine the target directory; set TUCKR_TARGET")]
    NoTargetDirectory,
}

impl SetupError {
    /// Exit code for this error.
    #[must_use]
    pub const fn return_code(&self) -> ReturnCode {
        match self {
            Self::RootNotFound { .. } => ReturnCode::CouldntFindDotfiles,
            Self::MissingDirectory { .. } => ReturnCode::NoSetupFolder,
            Self::NoTargetDirectory => ReturnCode::Failure,
        }
    }
}

/// Errors scoped to a single group or managed file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No variant of the group applies under the active profile.
    #[error("no such group '{group}'")]
    NoSuchGroup {
        /// Requested base name.
        group: String,
    },

    /// A `%NAME` segment names a variable that is not set.
    #[error("environment variable '{var}' is not set (needed by {})", .path.display())]
    UnresolvedEnvVar {
        /// Variable name without the `%` marker.
        var: String,
        /// Logical path that referenced it.
        path: PathBuf,
    },

    /// Two managed files would be deployed to the same place.
    #[error("{} is claimed by more than one file: {}", .path.display(), .sources.join(", "))]
    AmbiguousDeployment {
        /// The contested deployment path.
        path: PathBuf,
        /// `group/logical-path` of every claimant.
        sources: Vec<String>,
    },

    /// A file named on the command line does not exist.
    #[error("{} does not exist", .path.display())]
    NoSuchFile {
        /// Missing path.
        path: PathBuf,
    },

    /// The group name cannot be used as a directory name on every platform.
    #[error("invalid group name '{group}': {reason}")]
    InvalidGroupName {
        /// Offending name.
        group: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ResolutionError {
    /// Exit code for this error.
    #[must_use]
    pub const fn return_code(&self) -> ReturnCode {
        match self {
            Self::NoSuchGroup { .. }
            | Self::NoSuchFile { .. }
            | Self::InvalidGroupName { .. } => ReturnCode::NoSuchFileOrDir,
            Self::UnresolvedEnvVar { .. } | Self::AmbiguousDeployment { .. } => {
                ReturnCode::Failure
            }
        }
    }
}

/// Errors raised while expanding the requested group list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// `--force`/`--adopt` combined with `*` and no explicit group.
    #[error("refusing to force or adopt every group; name the groups explicitly instead of '*'")]
    AmbiguousForce,
}

/// Errors raised by hook scripts.
#[derive(Error, Debug)]
pub enum HookError {
    /// The hook process could not be started.
    #[error("failed to start hook {}: {source}", .hook.display())]
    Spawn {
        /// Hook script path.
        hook: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The hook ran and reported failure.
    #[error("hook {} {}", .hook.display(), describe_exit(.code))]
    Failed {
        /// Hook script path.
        hook: PathBuf,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
    },
}

/// Errors raised at the secrets boundary.
#[derive(Error, Debug)]
pub enum SecretError {
    /// The external cipher program is not installed.
    #[error("'{program}' was not found in PATH")]
    CipherUnavailable {
        /// Program that was looked up.
        program: String,
    },

    /// A plaintext file could not be encrypted.
    #[error("failed to encrypt {}: {reason}", .path.display())]
    EncryptionFailed {
        /// Plaintext path.
        path: PathBuf,
        /// Cipher diagnostics.
        reason: String,
    },

    /// A ciphertext file could not be decrypted.
    #[error("failed to decrypt {}: {reason}", .path.display())]
    DecryptionFailed {
        /// Ciphertext path.
        path: PathBuf,
        /// Cipher diagnostics.
        reason: String,
    },

    /// A ciphertext file could not be read.
    #[error("failed to read encrypted file {}: {source}", .path.display())]
    ReadFailed {
        /// Ciphertext path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A file named for encryption does not exist.
    #[error("{} does not exist", .path.display())]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },
}

impl SecretError {
    /// Exit code for this error.
    #[must_use]
    pub const fn return_code(&self) -> ReturnCode {
        match self {
            Self::CipherUnavailable { .. } => ReturnCode::Failure,
            Self::EncryptionFailed { .. } => ReturnCode::EncryptionFailed,
            Self::DecryptionFailed { .. } => ReturnCode::DecryptionFailed,
            Self::ReadFailed { .. } => ReturnCode::EncryptedReadFailed,
            Self::NotFound { .. } => ReturnCode::NoSuchFileOrDir,
        }
    }
}

/// Find the exit code for an error by walking its cause chain.
///
/// The first typed error found decides; untyped errors exit with
/// [`ReturnCode::Failure`].
#[must_use]
pub fn return_code(err: &anyhow::Error) -> ReturnCode {
    err.chain()
        .find_map(|cause| {
            if let Some(e) = cause.downcast_ref::<TuckrError>() {
                Some(e.return_code())
            } else if let Some(e) = cause.downcast_ref::<SetupError>() {
                Some(e.return_code())
            } else if let Some(e) = cause.downcast_ref::<ResolutionError>() {
                Some(e.return_code())
            } else if let Some(e) = cause.downcast_ref::<SecretError>() {
                Some(e.return_code())
            } else if cause.is::<SelectionError>() || cause.is::<HookError>() {
                Some(ReturnCode::Failure)
            } else {
                None
            }
        })
        .unwrap_or(ReturnCode::Failure)
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[allow(clippy::ref_option)]
fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(
        || "was terminated by a signal".to_string(),
        |c| format!("exited with code {c}"),
    )
}

/// Render a path relative to `base` when possible, for compact messages.
#[must_use]
pub fn relative_display(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
