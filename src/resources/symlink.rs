//! Symlink resource: one managed file and its deployment path.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::error::ResourceError;
use super::helpers::fs::{copy_into_place, ensure_parent_dir, remove_path};
use super::status::{Conflict, SymlinkStatus, classify, is_inside_repository, repository_ancestor};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::config::selection::ConflictPolicy;

/// A managed file's deployment symlink.
#[derive(Debug, Clone)]
pub struct ManagedLink {
    /// The managed file inside the repository (what the symlink points to).
    pub source: PathBuf,
    /// The deployment path (where the symlink lives).
    pub deployment: PathBuf,
    /// What to do when the deployment path is occupied.
    pub policy: ConflictPolicy,
    /// Dotfiles root; nothing resolving inside it is ever removed or
    /// overwritten. Defaults to the source's directory.
    pub repository: PathBuf,
}

impl ManagedLink {
    /// Create a new managed link.
    #[must_use]
    pub fn new(source: PathBuf, deployment: PathBuf, policy: ConflictPolicy) -> Self {
        let repository = source
            .parent()
            .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
        Self {
            source,
            deployment,
            policy,
            repository,
        }
    }

    /// Guard everything under `repository`.
    #[must_use]
    pub fn within(mut self, repository: impl Into<PathBuf>) -> Self {
        self.repository = repository.into();
        self
    }

    /// Classify the deployment path.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment path cannot be inspected.
    pub fn status(&self) -> Result<SymlinkStatus> {
        classify(&self.source, &self.deployment, &self.repository)
    }

    /// Whether the conflict policy can resolve `conflict`.
    fn check_policy(&self, conflict: &Conflict) -> Result<()> {
        let refuse = |reason: String| -> Result<()> {
            Err(ResourceError::InvalidState {
                resource: self.deployment.display().to_string(),
                reason,
            }
            .into())
        };
        let resolvable = match (self.policy, conflict) {
            (ConflictPolicy::Skip, _) => return Ok(()),
            (_, Conflict::ParentNotDirectory | Conflict::InsideRepository { .. }) => false,
            (ConflictPolicy::Adopt, Conflict::BrokenSymlink { .. }) => {
                return refuse(format!("{conflict}, nothing to adopt"));
            }
            _ => true,
        };
        if !resolvable {
            return refuse(conflict.to_string());
        }
        if is_inside_repository(&self.deployment, &self.repository) {
            return refuse(format!(
                "{} lies inside the repository",
                self.deployment.display()
            ));
        }
        Ok(())
    }

    fn link(&self) -> Result<()> {
        ensure_parent_dir(&self.deployment)?;
        create_symlink(&self.source, &self.deployment)
    }

    /// Copy whatever occupies the deployment path over the managed source.
    fn adopt(&self) -> Result<()> {
        copy_into_place(&self.deployment, &self.source).with_context(|| {
            format!(
                "adopt {} into {}",
                self.deployment.display(),
                self.source.display()
            )
        })?;
        remove_path(&self.deployment)
    }

    /// Remove the link that makes the deployment path resolve to the source.
    ///
    /// That is the deployment path itself, or a parent directory linked into
    /// the repository. Another file of the group may remove the same parent
    /// first.
    fn unlink(&self) -> Result<()> {
        let Some(ancestor) = repository_ancestor(&self.deployment, &self.repository) else {
            return remove_symlink(&self.deployment);
        };
        match remove_symlink(&ancestor) {
            Err(_) if std::fs::symlink_metadata(&ancestor).is_err() => Ok(()),
            other => other,
        }
    }
}

impl Applicable for ManagedLink {
    fn description(&self) -> String {
        format!("{} -> {}", self.deployment.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.status()? {
            SymlinkStatus::Linked => Ok(ResourceChange::AlreadyCorrect),
            SymlinkStatus::Unlinked => {
                self.link()?;
                Ok(ResourceChange::Applied)
            }
            SymlinkStatus::Conflicting { conflict } => {
                self.check_policy(&conflict)?;
                match self.policy {
                    ConflictPolicy::Skip => {
                        return Ok(ResourceChange::Skipped {
                            reason: conflict.to_string(),
                        });
                    }
                    ConflictPolicy::Force => remove_path(&self.deployment)?,
                    ConflictPolicy::Adopt => self.adopt()?,
                }
                self.link()?;
                Ok(ResourceChange::Applied)
            }
        }
    }

    fn precheck(&self) -> Result<()> {
        match self.status()? {
            SymlinkStatus::Conflicting { conflict } => self.check_policy(&conflict),
            SymlinkStatus::Linked | SymlinkStatus::Unlinked => Ok(()),
        }
    }

    fn remove(&self) -> Result<ResourceChange> {
        match self.status()? {
            SymlinkStatus::Linked => {
                self.unlink()?;
                Ok(ResourceChange::Applied)
            }
            SymlinkStatus::Unlinked => Ok(ResourceChange::AlreadyCorrect),
            SymlinkStatus::Conflicting { conflict } => Ok(ResourceChange::Skipped {
                reason: conflict.to_string(),
            }),
        }
    }
}

impl Resource for ManagedLink {
    fn current_state(&self) -> Result<ResourceState> {
        if std::fs::symlink_metadata(&self.source).is_err() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }
        Ok(match self.status()? {
            SymlinkStatus::Linked => ResourceState::Correct,
            SymlinkStatus::Unlinked => ResourceState::Missing,
            SymlinkStatus::Conflicting { conflict } => ResourceState::Incorrect {
                current: conflict.to_string(),
            },
        })
    }
}

/// Compare two paths for equality, handling UNC prefix normalization on Windows.
pub(crate) fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    normalize(a) == normalize(b)
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).map_err(|e| ResourceError::from_io(e, link))?;
    }

    #[cfg(windows)]
    {
        use crate::exec;

        let is_dir = target.is_dir();
        let result = if is_dir {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };

        if result.is_err() {
            // mklink needs developer mode or an elevated shell; /J makes a
            // junction for directories.
            let link_str = link.to_string_lossy();
            let target_str = target.to_string_lossy();
            let mut args: Vec<&str> = vec!["/c", "mklink"];
            if is_dir {
                args.push("/J");
            }
            args.push(&link_str);
            args.push(&target_str);
            exec::run("cmd", &args)?;
        }
    }

    Ok(())
}

/// Remove a symlink, handling platform differences.
///
/// On Windows, directory symlinks must be removed with `remove_dir` (not `remove_file`).
/// Rust's `symlink_metadata().is_dir()` returns `false` for symlinks, so we check
/// the raw `FILE_ATTRIBUTE_DIRECTORY` flag to detect directory symlinks.
/// If `remove_dir` still fails with OS error 5 (access denied), we fall back
/// to `cmd /c rmdir` which runs in a separate process.
pub(crate) fn remove_symlink(path: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("reading metadata: {}", path.display()))?;
    if is_dir_like(&meta) {
        match std::fs::remove_dir(path) {
            Ok(()) => {}
            #[cfg(windows)]
            Err(e) if e.raw_os_error() == Some(5) => {
                remove_dir_fallback(path)?;
            }
            Err(e) => return Err(ResourceError::from_io(e, path)),
        }
    } else {
        std::fs::remove_file(path).map_err(|e| ResourceError::from_io(e, path))?;
    }
    Ok(())
}

/// Check if metadata represents a directory-like entry.
fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

/// Fallback directory removal on Windows using `cmd /c rmdir`, which does not
/// hold any handles from the current process.
#[cfg(windows)]
fn remove_dir_fallback(path: &Path) -> Result<()> {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    use std::os::windows::process::CommandExt;
    let output = std::process::Command::new("cmd")
        .arg("/c")
        .arg("rmdir")
        .arg("/q")
        .arg(path)
        .creation_flags(CREATE_NO_WINDOW)
        .output()
        .context("failed to run rmdir")?;
    if !output.status.success() {
        anyhow::bail!(
            "remove directory/symlink '{}': {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        source: PathBuf,
        deployment: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("repo/Configs/zsh/.zshrc");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, "managed").unwrap();
        let deployment = dir.path().join("home/.zshrc");
        Fixture {
            _dir: dir,
            source,
            deployment,
        }
    }

    impl Fixture {
        fn link(&self, policy: ConflictPolicy) -> ManagedLink {
            ManagedLink::new(self.source.clone(), self.deployment.clone(), policy)
        }
    }

    #[test]
    fn paths_equal_works() {
        assert!(paths_equal(Path::new("/tmp/test"), Path::new("/tmp/test")));
        assert!(!paths_equal(Path::new("/tmp/test"), Path::new("/tmp/other")));
    }

    #[test]
    fn description_names_both_ends() {
        let f = fixture();
        let desc = f.link(ConflictPolicy::Skip).description();
        assert!(desc.contains(".zshrc -> "));
        assert!(desc.contains("repo"));
    }

    #[test]
    fn invalid_when_source_missing() {
        let f = fixture();
        std::fs::remove_file(&f.source).unwrap();
        let state = f.link(ConflictPolicy::Skip).current_state().unwrap();
        assert!(matches!(state, ResourceState::Invalid { .. }));
    }

    #[test]
    fn missing_when_deployment_absent() {
        let f = fixture();
        let state = f.link(ConflictPolicy::Skip).current_state().unwrap();
        assert_eq!(state, ResourceState::Missing);
    }

    #[test]
    fn link_then_classify_is_linked() {
        let f = fixture();
        let link = f.link(ConflictPolicy::Skip);
        assert_eq!(link.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(link.status().unwrap(), SymlinkStatus::Linked);
        assert_eq!(link.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(std::fs::read_to_string(&f.deployment).unwrap(), "managed");
    }

    #[test]
    fn linking_twice_is_a_noop() {
        let f = fixture();
        let link = f.link(ConflictPolicy::Skip);
        link.apply().unwrap();
        assert_eq!(link.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn link_creates_missing_parents() {
        let f = fixture();
        let nested = f.deployment.parent().unwrap().join(".config/zsh/.zshrc");
        let link = ManagedLink::new(f.source.clone(), nested.clone(), ConflictPolicy::Skip);
        link.apply().unwrap();
        assert_eq!(link.status().unwrap(), SymlinkStatus::Linked);
    }

    #[test]
    fn default_policy_skips_conflicts() {
        let f = fixture();
        std::fs::create_dir_all(f.deployment.parent().unwrap()).unwrap();
        std::fs::write(&f.deployment, "mine").unwrap();

        let change = f.link(ConflictPolicy::Skip).apply().unwrap();
        assert!(matches!(change, ResourceChange::Skipped { .. }));
        assert_eq!(std::fs::read_to_string(&f.deployment).unwrap(), "mine");
    }

    #[test]
    fn force_replaces_file() {
        let f = fixture();
        std::fs::create_dir_all(f.deployment.parent().unwrap()).unwrap();
        std::fs::write(&f.deployment, "mine").unwrap();

        let link = f.link(ConflictPolicy::Force);
        assert_eq!(link.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(link.status().unwrap(), SymlinkStatus::Linked);
        assert_eq!(std::fs::read_to_string(&f.source).unwrap(), "managed");
    }

    #[test]
    fn force_replaces_directory() {
        let f = fixture();
        std::fs::create_dir_all(f.deployment.join("inner")).unwrap();

        let link = f.link(ConflictPolicy::Force);
        link.apply().unwrap();
        assert_eq!(link.status().unwrap(), SymlinkStatus::Linked);
    }

    #[test]
    fn adopt_copies_content_into_source_then_links() {
        let f = fixture();
        std::fs::create_dir_all(f.deployment.parent().unwrap()).unwrap();
        std::fs::write(&f.deployment, "mine").unwrap();

        let link = f.link(ConflictPolicy::Adopt);
        assert_eq!(link.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(link.status().unwrap(), SymlinkStatus::Linked);
        assert_eq!(std::fs::read_to_string(&f.source).unwrap(), "mine");
        assert_eq!(std::fs::read_to_string(&f.deployment).unwrap(), "mine");
    }

    #[test]
    fn adopt_directory_copies_recursively() {
        let f = fixture();
        std::fs::create_dir_all(f.deployment.join("sub")).unwrap();
        std::fs::write(f.deployment.join("sub/file"), "nested").unwrap();

        let link = f.link(ConflictPolicy::Adopt);
        link.apply().unwrap();
        assert!(f.source.is_dir());
        assert_eq!(
            std::fs::read_to_string(f.source.join("sub/file")).unwrap(),
            "nested"
        );
        assert_eq!(link.status().unwrap(), SymlinkStatus::Linked);
    }

    #[cfg(unix)]
    #[test]
    fn adopt_broken_symlink_fails_without_touching_source() {
        let f = fixture();
        std::fs::create_dir_all(f.deployment.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink("/nonexistent", &f.deployment).unwrap();

        let err = f.link(ConflictPolicy::Adopt).apply().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::InvalidState { .. })
        ));
        assert_eq!(std::fs::read_to_string(&f.source).unwrap(), "managed");
    }

    #[cfg(unix)]
    #[test]
    fn precheck_agrees_with_apply() {
        let f = fixture();
        std::fs::create_dir_all(f.deployment.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink("/nonexistent", &f.deployment).unwrap();

        let err = f.link(ConflictPolicy::Adopt).precheck().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::InvalidState { .. })
        ));
        assert!(f.link(ConflictPolicy::Force).precheck().is_ok());
        assert!(f.link(ConflictPolicy::Skip).precheck().is_ok());
        assert!(f.deployment.symlink_metadata().unwrap().is_symlink());
    }

    #[test]
    fn force_refuses_a_deployment_inside_the_repository() {
        let f = fixture();
        let inside = f.source.with_file_name(".zprofile");
        std::fs::write(&inside, "repository content").unwrap();
        let link = ManagedLink::new(f.source.clone(), inside.clone(), ConflictPolicy::Force)
            .within(f.source.ancestors().nth(3).unwrap());

        let err = link.apply().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::InvalidState { .. })
        ));
        assert_eq!(std::fs::read_to_string(&inside).unwrap(), "repository content");
    }

    #[test]
    fn unlink_removes_only_our_symlink() {
        let f = fixture();
        let link = f.link(ConflictPolicy::Skip);
        link.apply().unwrap();

        assert_eq!(link.remove().unwrap(), ResourceChange::Applied);
        assert_eq!(link.status().unwrap(), SymlinkStatus::Unlinked);
        assert!(f.source.exists());
    }

    #[test]
    fn unlink_when_unlinked_is_a_noop() {
        let f = fixture();
        assert_eq!(
            f.link(ConflictPolicy::Skip).remove().unwrap(),
            ResourceChange::AlreadyCorrect
        );
    }

    #[test]
    fn unlink_leaves_conflicts_alone() {
        let f = fixture();
        std::fs::create_dir_all(f.deployment.parent().unwrap()).unwrap();
        std::fs::write(&f.deployment, "mine").unwrap();

        let change = f.link(ConflictPolicy::Force).remove().unwrap();
        assert!(matches!(change, ResourceChange::Skipped { .. }));
        assert_eq!(std::fs::read_to_string(&f.deployment).unwrap(), "mine");
    }
}
