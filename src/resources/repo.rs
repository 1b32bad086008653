//! Changes to the repository tree itself: copying files into `Configs/`
//! and deleting group directories.
use std::path::PathBuf;

use anyhow::Result;

use super::helpers::fs::{copy_into_place, remove_path, sha256_file};
use super::{Applicable, ResourceChange};
use crate::error::ResolutionError;

/// A file on disk copied into a group of the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedFile {
    /// The file being pushed.
    pub source: PathBuf,
    /// Where it lands under `Configs/<group>/`.
    pub destination: PathBuf,
}

impl Applicable for PushedFile {
    fn description(&self) -> String {
        format!("{} => {}", self.source.display(), self.destination.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.source.symlink_metadata().is_err() {
            return Err(ResolutionError::NoSuchFile {
                path: self.source.clone(),
            }
            .into());
        }
        // Pushing a linked file reads the repository copy through the link.
        if self.source.is_file()
            && self.destination.is_file()
            && sha256_file(&self.source)? == sha256_file(&self.destination)?
        {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        copy_into_place(&self.source, &self.destination)?;
        Ok(ResourceChange::Applied)
    }
}

/// A variant directory deleted from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedDir {
    /// Directory to delete.
    pub path: PathBuf,
}

impl Applicable for RemovedDir {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.path.symlink_metadata().is_err() {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        remove_path(&self.path)?;
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{ReturnCode, return_code};

    #[test]
    fn push_copies_into_the_group() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("home/.zshrc");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, "export EDITOR=nvim").unwrap();
        let destination = dir.path().join("Configs/zsh/.zshrc");

        let pushed = PushedFile {
            source,
            destination: destination.clone(),
        };
        assert_eq!(pushed.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(
            std::fs::read_to_string(&destination).unwrap(),
            "export EDITOR=nvim"
        );
        assert_eq!(pushed.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn push_overwrites_different_content() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("gitconfig");
        let destination = dir.path().join("Configs/git/.gitconfig");
        std::fs::write(&source, "new").unwrap();
        std::fs::create_dir_all(destination.parent().unwrap()).unwrap();
        std::fs::write(&destination, "old").unwrap();

        PushedFile {
            source,
            destination: destination.clone(),
        }
        .apply()
        .unwrap();
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "new");
    }

    #[test]
    fn push_missing_source_is_no_such_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PushedFile {
            source: dir.path().join("nope"),
            destination: dir.path().join("Configs/x/nope"),
        }
        .apply()
        .unwrap_err();
        assert_eq!(return_code(&err), ReturnCode::NoSuchFileOrDir);
        assert!(!dir.path().join("Configs").exists());
    }

    #[test]
    fn removed_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let group = dir.path().join("Configs/zsh");
        std::fs::create_dir_all(group.join(".config")).unwrap();
        std::fs::write(group.join(".zshrc"), "").unwrap();

        let removed = RemovedDir { path: group.clone() };
        assert_eq!(removed.apply().unwrap(), ResourceChange::Applied);
        assert!(!group.exists());
        assert_eq!(removed.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }
}
