//! Typed error variants for resource operations.
//!
//! This module provides [`ResourceError`], a structured error type for
//! per-file link, unlink and adopt operations. Resource code returns these
//! variants directly; callers convert to [`anyhow::Error`] via `?`.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Errors that arise from resource checks and apply operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A command invoked by a resource failed with a non-zero exit code.
    #[error("command '{program}' failed (exit {exit_code}): {stderr}")]
    ExecutionFailed {
        /// Name of the program that was invoked.
        program: String,
        /// Exit code returned by the process.
        exit_code: i32,
        /// Captured standard error output.
        stderr: String,
    },

    /// A path the operation needs does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The missing path.
        path: String,
    },

    /// An operation was denied due to insufficient permissions.
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// Path for which permission was denied.
        path: String,
    },

    /// A path exists but is in a state the operation cannot handle.
    #[error("invalid state for '{resource}': {reason}")]
    InvalidState {
        /// Name or description of the resource in the invalid state.
        resource: String,
        /// Human-readable explanation of why the state is invalid.
        reason: String,
    },

    /// The requested operation is not supported for this resource type.
    #[error("operation '{operation}' is not supported for resource '{resource}'")]
    UnsupportedOperation {
        /// Name of the unsupported operation (e.g. `"remove"`).
        operation: String,
        /// Name or description of the resource.
        resource: String,
    },
}

impl ResourceError {
    /// Classify an I/O error raised while operating on `path`.
    ///
    /// Permission and not-found errors get their own variants so reports can
    /// name the path; anything else is returned unchanged.
    #[must_use]
    pub fn from_io(err: io::Error, path: &Path) -> anyhow::Error {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.display().to_string(),
            }
            .into(),
            io::ErrorKind::NotFound => Self::NotFound {
                path: path.display().to_string(),
            }
            .into(),
            _ => anyhow::Error::new(err).context(path.display().to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn execution_failed_display() {
        let e = ResourceError::ExecutionFailed {
            program: "cmd".to_string(),
            exit_code: 1,
            stderr: "access denied".to_string(),
        };
        assert!(e.to_string().contains("cmd"));
        assert!(e.to_string().contains("exit 1"));
        assert!(e.to_string().contains("access denied"));
    }

    #[test]
    fn not_found_display() {
        let e = ResourceError::NotFound {
            path: "/home/me/.zshrc".to_string(),
        };
        assert_eq!(e.to_string(), "not found: /home/me/.zshrc");
    }

    #[test]
    fn invalid_state_display() {
        let e = ResourceError::InvalidState {
            resource: "~/.bashrc".to_string(),
            reason: "broken symlink, nothing to adopt".to_string(),
        };
        assert!(e.to_string().contains("~/.bashrc"));
        assert!(e.to_string().contains("nothing to adopt"));
    }

    #[test]
    fn from_io_maps_permission_denied() {
        let err = ResourceError::from_io(
            io::Error::from(io::ErrorKind::PermissionDenied),
            Path::new("/etc/hosts"),
        );
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::PermissionDenied { path }) if path == "/etc/hosts"
        ));
    }

    #[test]
    fn from_io_keeps_other_errors() {
        let err = ResourceError::from_io(
            io::Error::other("disk on fire"),
            Path::new("/tmp/x"),
        );
        assert!(err.downcast_ref::<ResourceError>().is_none());
        assert!(format!("{err:#}").contains("disk on fire"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn resource_error_is_send_sync() {
        assert_send_sync::<ResourceError>();
    }
}
