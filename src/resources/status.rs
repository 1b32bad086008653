//! Symlink status classification.
//!
//! Classification only reads the filesystem: `symlink_metadata` and
//! `read_link` at the deployment path, never following the link itself.
//! A deployment path may still reach the repository through a symlinked
//! parent directory (a whole directory linked by an earlier adopt, or by an
//! older tool); such paths are recognised and never treated as removable.
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::symlink::paths_equal;

/// Why a deployment path is not ours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    /// A regular file or directory lives there.
    Occupied {
        /// Whether it is a directory.
        is_dir: bool,
    },
    /// A symlink to something other than the managed file.
    ForeignSymlink {
        /// Where the link points, as stored.
        target: PathBuf,
    },
    /// A symlink whose target does not exist.
    BrokenSymlink {
        /// Where the link points, as stored.
        target: PathBuf,
    },
    /// An ancestor of the deployment path is not a directory.
    ParentNotDirectory,
    /// A parent directory is a symlink into the repository, so the path
    /// names repository content rather than a deployed file.
    InsideRepository {
        /// The symlinked parent directory.
        ancestor: PathBuf,
    },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Occupied { is_dir: true } => write!(f, "a directory is in the way"),
            Self::Occupied { is_dir: false } => write!(f, "a file is in the way"),
            Self::ForeignSymlink { target } => write!(f, "symlink to {}", target.display()),
            Self::BrokenSymlink { target } => {
                write!(f, "broken symlink to {}", target.display())
            }
            Self::ParentNotDirectory => write!(f, "a parent path is not a directory"),
            Self::InsideRepository { ancestor } => {
                write!(f, "{} links into the repository", ancestor.display())
            }
        }
    }
}

/// Live state of one managed file's deployment path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymlinkStatus {
    /// A symlink to the managed source.
    Linked,
    /// Nothing there.
    Unlinked,
    /// Something else is there.
    Conflicting {
        /// What is in the way.
        conflict: Conflict,
    },
}

impl SymlinkStatus {
    /// Whether the path is occupied by something we do not own.
    #[must_use]
    pub const fn is_conflicting(&self) -> bool {
        matches!(self, Self::Conflicting { .. })
    }
}

/// Compare the deployment path against the expected symlink to `source`.
///
/// A missing parent directory is [`SymlinkStatus::Unlinked`]. A symlink is
/// [`SymlinkStatus::Linked`] when its target, resolved against the link's
/// directory, is `source`; a broken symlink to `source` is still ours.
///
/// When a parent directory of `deployment` is a symlink into `repository`,
/// the path is [`SymlinkStatus::Linked`] if it resolves to `source` and
/// [`Conflict::InsideRepository`] otherwise.
///
/// # Errors
///
/// Returns an error when the deployment path cannot be inspected for a
/// reason other than it being absent.
pub fn classify(source: &Path, deployment: &Path, repository: &Path) -> Result<SymlinkStatus> {
    if let Some(ancestor) = repository_ancestor(deployment, repository) {
        return Ok(if same_file(deployment, source) {
            SymlinkStatus::Linked
        } else {
            SymlinkStatus::Conflicting {
                conflict: Conflict::InsideRepository { ancestor },
            }
        });
    }

    let meta = match std::fs::symlink_metadata(deployment) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SymlinkStatus::Unlinked),
        Err(e) if e.kind() == io::ErrorKind::NotADirectory => {
            return Ok(SymlinkStatus::Conflicting {
                conflict: Conflict::ParentNotDirectory,
            });
        }
        Err(e) => {
            return Err(e).with_context(|| format!("inspecting {}", deployment.display()));
        }
    };

    if !meta.file_type().is_symlink() {
        return Ok(SymlinkStatus::Conflicting {
            conflict: Conflict::Occupied {
                is_dir: meta.is_dir(),
            },
        });
    }

    let target = std::fs::read_link(deployment)
        .with_context(|| format!("reading link {}", deployment.display()))?;
    let resolved = if target.is_absolute() {
        target.clone()
    } else {
        deployment
            .parent()
            .map_or_else(|| target.clone(), |dir| dir.join(&target))
    };

    if points_at(&resolved, source) {
        return Ok(SymlinkStatus::Linked);
    }
    let conflict = if deployment.exists() {
        Conflict::ForeignSymlink { target }
    } else {
        Conflict::BrokenSymlink { target }
    };
    Ok(SymlinkStatus::Conflicting { conflict })
}

/// The nearest parent directory of `path` that is a symlink resolving into
/// `repository`.
#[must_use]
pub fn repository_ancestor(path: &Path, repository: &Path) -> Option<PathBuf> {
    let repository = dunce::canonicalize(repository).ok()?;
    path.ancestors()
        .skip(1)
        .filter(|dir| !dir.as_os_str().is_empty())
        .find(|dir| {
            std::fs::symlink_metadata(dir).is_ok_and(|m| m.file_type().is_symlink())
                && dunce::canonicalize(dir).is_ok_and(|real| real.starts_with(&repository))
        })
        .map(Path::to_path_buf)
}

/// Whether `path`, with every symlink resolved, lies inside `repository`.
///
/// A missing final component is resolved through its parent directory.
#[must_use]
pub fn is_inside_repository(path: &Path, repository: &Path) -> bool {
    let Ok(repository) = dunce::canonicalize(repository) else {
        return false;
    };
    let real = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => dunce::canonicalize(parent).map(|dir| dir.join(name)),
        _ => dunce::canonicalize(path),
    };
    real.is_ok_and(|real| real.starts_with(&repository))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn points_at(resolved: &Path, source: &Path) -> bool {
    paths_equal(resolved, source) || same_file(resolved, source)
}

/// Aggregate status of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Every file is linked.
    FullySymlinked,
    /// Every file is unlinked (also an empty group).
    NotSymlinked,
    /// Anything in between.
    PartiallySymlinked,
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FullySymlinked => "symlinked",
            Self::NotSymlinked => "not symlinked",
            Self::PartiallySymlinked => "partially symlinked",
        })
    }
}

/// Per-status counts for one group.
///
/// # Examples
///
/// ```
/// use tuckr_cli::resources::status::{GroupStatus, GroupSummary, SymlinkStatus};
///
/// let summary = GroupSummary::from_statuses(&[SymlinkStatus::Linked, SymlinkStatus::Unlinked]);
/// assert_eq!(summary.status(), GroupStatus::PartiallySymlinked);
/// assert!(!summary.has_conflicts());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    /// Files that are linked.
    pub linked: usize,
    /// Files that are unlinked.
    pub unlinked: usize,
    /// Files whose deployment path is occupied.
    pub conflicting: usize,
}

impl GroupSummary {
    /// Count a set of file statuses.
    #[must_use]
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a SymlinkStatus>) -> Self {
        statuses
            .into_iter()
            .fold(Self::default(), |mut acc, status| {
                match status {
                    SymlinkStatus::Linked => acc.linked += 1,
                    SymlinkStatus::Unlinked => acc.unlinked += 1,
                    SymlinkStatus::Conflicting { .. } => acc.conflicting += 1,
                }
                acc
            })
    }

    /// Number of files counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.linked + self.unlinked + self.conflicting
    }

    /// Group-level status.
    #[must_use]
    pub const fn status(&self) -> GroupStatus {
        if self.unlinked == self.total() {
            GroupStatus::NotSymlinked
        } else if self.linked == self.total() {
            GroupStatus::FullySymlinked
        } else {
            GroupStatus::PartiallySymlinked
        }
    }

    /// Whether any file is conflicting.
    #[must_use]
    pub const fn has_conflicts(&self) -> bool {
        self.conflicting > 0
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn repo(dir: &Path) -> PathBuf {
        dir.join("repo")
    }

    fn source_in(dir: &Path) -> PathBuf {
        let source = dir.join("repo/.zshrc");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, "managed").unwrap();
        source
    }

    #[test]
    fn absent_path_is_unlinked() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let status = classify(&source, &dir.path().join("home/.zshrc"), &repo(dir.path())).unwrap();
        assert_eq!(status, SymlinkStatus::Unlinked);
    }

    #[test]
    fn missing_parent_directories_are_unlinked() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let status = classify(&source, &dir.path().join("a/b/c/.zshrc"), &repo(dir.path())).unwrap();
        assert_eq!(status, SymlinkStatus::Unlinked);
    }

    #[test]
    fn regular_file_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let deployment = dir.path().join(".zshrc");
        std::fs::write(&deployment, "mine").unwrap();

        let status = classify(&source, &deployment, &repo(dir.path())).unwrap();
        assert_eq!(
            status,
            SymlinkStatus::Conflicting {
                conflict: Conflict::Occupied { is_dir: false }
            }
        );
    }

    #[test]
    fn directory_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let deployment = dir.path().join(".zshrc");
        std::fs::create_dir(&deployment).unwrap();

        let status = classify(&source, &deployment, &repo(dir.path())).unwrap();
        assert_eq!(
            status,
            SymlinkStatus::Conflicting {
                conflict: Conflict::Occupied { is_dir: true }
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn file_as_parent_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        std::fs::write(dir.path().join(".config"), "not a dir").unwrap();

        let status = classify(&source, &dir.path().join(".config/app.conf"), &repo(dir.path())).unwrap();
        assert_eq!(
            status,
            SymlinkStatus::Conflicting {
                conflict: Conflict::ParentNotDirectory
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_source_is_linked() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let deployment = dir.path().join(".zshrc");
        std::os::unix::fs::symlink(&source, &deployment).unwrap();

        assert_eq!(classify(&source, &deployment, &repo(dir.path())).unwrap(), SymlinkStatus::Linked);
    }

    #[cfg(unix)]
    #[test]
    fn relative_symlink_to_source_is_linked() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let deployment = dir.path().join(".zshrc");
        std::os::unix::fs::symlink("repo/.zshrc", &deployment).unwrap();

        assert_eq!(classify(&source, &deployment, &repo(dir.path())).unwrap(), SymlinkStatus::Linked);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_elsewhere_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let other = dir.path().join("other");
        std::fs::write(&other, "other").unwrap();
        let deployment = dir.path().join(".zshrc");
        std::os::unix::fs::symlink(&other, &deployment).unwrap();

        let status = classify(&source, &deployment, &repo(dir.path())).unwrap();
        assert_eq!(
            status,
            SymlinkStatus::Conflicting {
                conflict: Conflict::ForeignSymlink { target: other }
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let deployment = dir.path().join(".zshrc");
        std::os::unix::fs::symlink("/nonexistent/target", &deployment).unwrap();

        let status = classify(&source, &deployment, &repo(dir.path())).unwrap();
        assert_eq!(
            status,
            SymlinkStatus::Conflicting {
                conflict: Conflict::BrokenSymlink {
                    target: PathBuf::from("/nonexistent/target")
                }
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_to_source_is_still_linked() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("repo/gone");
        let deployment = dir.path().join(".gone");
        std::os::unix::fs::symlink(&source, &deployment).unwrap();

        assert_eq!(classify(&source, &deployment, &repo(dir.path())).unwrap(), SymlinkStatus::Linked);
    }

    #[cfg(unix)]
    #[test]
    fn file_under_linked_directory_is_linked() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("repo/.vim/sub/file");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, "managed").unwrap();
        std::fs::create_dir(dir.path().join("home")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("repo/.vim"), dir.path().join("home/.vim"))
            .unwrap();

        let deployment = dir.path().join("home/.vim/sub/file");
        assert_eq!(
            classify(&source, &deployment, &repo(dir.path())).unwrap(),
            SymlinkStatus::Linked
        );
        assert_eq!(
            repository_ancestor(&deployment, &repo(dir.path())),
            Some(dir.path().join("home/.vim"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn path_through_link_to_other_repository_content_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("repo/vim/.vim/file");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, "managed").unwrap();
        std::fs::create_dir_all(dir.path().join("repo/vim_linux/.vim")).unwrap();
        std::fs::write(dir.path().join("repo/vim_linux/.vim/file"), "other").unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("repo/vim_linux/.vim"),
            dir.path().join(".vim"),
        )
        .unwrap();

        let status = classify(&source, &dir.path().join(".vim/file"), &repo(dir.path())).unwrap();
        assert_eq!(
            status,
            SymlinkStatus::Conflicting {
                conflict: Conflict::InsideRepository {
                    ancestor: dir.path().join(".vim")
                }
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_parent_outside_the_repository_is_transparent() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        std::fs::create_dir(dir.path().join("real_home")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real_home"), dir.path().join("home"))
            .unwrap();
        let deployment = dir.path().join("home/.zshrc");
        std::fs::write(&deployment, "mine").unwrap();

        assert_eq!(
            classify(&source, &deployment, &repo(dir.path())).unwrap(),
            SymlinkStatus::Conflicting {
                conflict: Conflict::Occupied { is_dir: false }
            }
        );
        assert!(!is_inside_repository(&deployment, &repo(dir.path())));
        assert!(is_inside_repository(&source, &repo(dir.path())));
    }

    #[test]
    fn classify_never_mutates() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_in(dir.path());
        let deployment = dir.path().join("deep/.zshrc");
        classify(&source, &deployment, &repo(dir.path())).unwrap();
        assert!(!dir.path().join("deep").exists());
    }

    // -----------------------------------------------------------------------
    // GroupSummary
    // -----------------------------------------------------------------------

    #[test]
    fn group_status_from_counts() {
        let linked = SymlinkStatus::Linked;
        let unlinked = SymlinkStatus::Unlinked;
        let conflicting = SymlinkStatus::Conflicting {
            conflict: Conflict::Occupied { is_dir: false },
        };

        assert_eq!(
            GroupSummary::from_statuses([&linked, &linked]).status(),
            GroupStatus::FullySymlinked
        );
        assert_eq!(
            GroupSummary::from_statuses([&unlinked]).status(),
            GroupStatus::NotSymlinked
        );
        let mixed = GroupSummary::from_statuses([&linked, &conflicting]);
        assert_eq!(mixed.status(), GroupStatus::PartiallySymlinked);
        assert!(mixed.has_conflicts());
    }

    #[test]
    fn empty_group_is_not_symlinked() {
        let summary = GroupSummary::from_statuses(std::iter::empty());
        assert_eq!(summary.status(), GroupStatus::NotSymlinked);
        assert!(!summary.has_conflicts());
    }

    #[test]
    fn conflict_display() {
        assert_eq!(
            Conflict::Occupied { is_dir: true }.to_string(),
            "a directory is in the way"
        );
        assert_eq!(
            Conflict::BrokenSymlink {
                target: PathBuf::from("/x")
            }
            .to_string(),
            "broken symlink to /x"
        );
    }
}
