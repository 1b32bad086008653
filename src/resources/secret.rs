//! Encrypted files under `Secrets/<group>/`.
//!
//! The cipher itself is an external program behind the [`Cipher`] trait.
//! A secret's ciphertext lives at the same logical path its plaintext is
//! deployed from, so decryption restores files through the path resolver.
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::helpers::fs::{ensure_parent_dir, remove_path, sha256_file};
use super::{Applicable, ResourceChange};
use crate::error::SecretError;
use crate::exec::Executor;

/// Program used by [`AgeCipher`].
pub const AGE_PROGRAM: &str = "age";

/// File-level encryption service.
#[cfg_attr(test, mockall::automock)]
pub trait Cipher: Send + Sync + fmt::Debug {
    /// Encrypt `plaintext` into `ciphertext`, overwriting it.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::EncryptionFailed`] when the cipher fails.
    fn encrypt(&self, plaintext: &Path, ciphertext: &Path) -> Result<(), SecretError>;

    /// Decrypt `ciphertext` into `plaintext`, overwriting it.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::DecryptionFailed`] when the cipher fails.
    fn decrypt(&self, ciphertext: &Path, plaintext: &Path) -> Result<(), SecretError>;
}

/// [`Cipher`] backed by the `age` command with passphrase encryption.
///
/// `age` prompts for the passphrase on the terminal, so it runs with
/// inherited standard streams.
#[derive(Debug, Clone)]
pub struct AgeCipher {
    program: PathBuf,
    executor: Arc<dyn Executor>,
}

impl AgeCipher {
    /// Find `age` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::CipherUnavailable`] when it is not installed.
    pub fn locate(executor: Arc<dyn Executor>) -> Result<Self, SecretError> {
        let program = executor
            .which(AGE_PROGRAM)
            .ok_or_else(|| SecretError::CipherUnavailable {
                program: AGE_PROGRAM.to_string(),
            })?;
        Ok(Self { program, executor })
    }

    fn run(&self, args: &[&OsStr], dir: &Path) -> Result<(), String> {
        let result = self
            .executor
            .run_interactive(dir, self.program.as_os_str(), args)
            .map_err(|e| e.to_string())?;
        if result.success {
            Ok(())
        } else {
            Err(result.code.map_or_else(
                || format!("{AGE_PROGRAM} was terminated by a signal"),
                |c| format!("{AGE_PROGRAM} exited with code {c}"),
            ))
        }
    }
}

impl Cipher for AgeCipher {
    fn encrypt(&self, plaintext: &Path, ciphertext: &Path) -> Result<(), SecretError> {
        let dir = plaintext.parent().unwrap_or_else(|| Path::new("."));
        self.run(
            &[
                OsStr::new("--passphrase"),
                OsStr::new("--output"),
                ciphertext.as_os_str(),
                plaintext.as_os_str(),
            ],
            dir,
        )
        .map_err(|reason| SecretError::EncryptionFailed {
            path: plaintext.to_path_buf(),
            reason,
        })
    }

    fn decrypt(&self, ciphertext: &Path, plaintext: &Path) -> Result<(), SecretError> {
        let dir = ciphertext.parent().unwrap_or_else(|| Path::new("."));
        self.run(
            &[
                OsStr::new("--decrypt"),
                OsStr::new("--output"),
                plaintext.as_os_str(),
                ciphertext.as_os_str(),
            ],
            dir,
        )
        .map_err(|reason| SecretError::DecryptionFailed {
            path: ciphertext.to_path_buf(),
            reason,
        })
    }
}

/// A plaintext file to store encrypted.
#[derive(Debug, Clone)]
pub struct EncryptedFile {
    /// Plaintext on disk.
    pub plaintext: PathBuf,
    /// Destination under `Secrets/<group>/`.
    pub ciphertext: PathBuf,
    /// Cipher to use.
    pub cipher: Arc<dyn Cipher>,
}

impl Applicable for EncryptedFile {
    fn description(&self) -> String {
        format!("{} => {}", self.plaintext.display(), self.ciphertext.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        if !self.plaintext.is_file() {
            return Err(SecretError::NotFound {
                path: self.plaintext.clone(),
            }
            .into());
        }
        ensure_parent_dir(&self.ciphertext)?;
        self.cipher.encrypt(&self.plaintext, &self.ciphertext)?;
        Ok(ResourceChange::Applied)
    }
}

/// A ciphertext to restore at its deployment path.
#[derive(Debug, Clone)]
pub struct DecryptedFile {
    /// Ciphertext under `Secrets/<group>/`.
    pub ciphertext: PathBuf,
    /// Resolved deployment path of the plaintext.
    pub deployment: PathBuf,
    /// Cipher to use.
    pub cipher: Arc<dyn Cipher>,
}

impl DecryptedFile {
    fn staging_path(&self) -> PathBuf {
        let parent = self.deployment.parent().unwrap_or_else(|| Path::new("."));
        parent.join(self.deployment.file_name().map_or_else(
            || ".tuckr_decrypt".to_string(),
            |n| format!(".{}.tuckr_decrypt", n.to_string_lossy()),
        ))
    }
}

impl Applicable for DecryptedFile {
    fn description(&self) -> String {
        format!("{} => {}", self.ciphertext.display(), self.deployment.display())
    }

    /// Decrypt next to the deployment path and move the result into place,
    /// unless the deployed file already has the same content.
    fn apply(&self) -> Result<ResourceChange> {
        std::fs::File::open(&self.ciphertext).map_err(|source| SecretError::ReadFailed {
            path: self.ciphertext.clone(),
            source,
        })?;

        ensure_parent_dir(&self.deployment)?;
        let staged = self.staging_path();
        if let Err(e) = self.cipher.decrypt(&self.ciphertext, &staged) {
            let _ = remove_path(&staged);
            return Err(e.into());
        }

        let unchanged = self.deployment.is_file()
            && sha256_file(&staged)? == sha256_file(&self.deployment)?;
        if unchanged {
            remove_path(&staged)?;
            return Ok(ResourceChange::AlreadyCorrect);
        }

        remove_path(&self.deployment)?;
        std::fs::rename(&staged, &self.deployment).with_context(|| {
            format!("moving {} into place", self.deployment.display())
        })?;
        Ok(ResourceChange::Applied)
    }
}
