//! File-system resource helpers.
use anyhow::{Context as _, Result};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::io::Read as _;
use std::path::Path;

use crate::resources::symlink::remove_symlink;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Remove whatever lives at `path`: a file, a symlink (broken or not, never
/// followed) or a whole directory tree. Does nothing if `path` does not exist.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_path(path: &Path) -> Result<()> {
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return Ok(());
    };
    if meta.file_type().is_symlink() {
        remove_symlink(path)
    } else if meta.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("remove directory: {}", path.display()))
    } else {
        std::fs::remove_file(path).with_context(|| format!("remove file: {}", path.display()))
    }
}

/// Recursively copy a directory tree, keeping directory permissions.
///
/// Symlinks within the source tree are *followed*: their content is copied,
/// not the link itself. File permissions are carried over by
/// [`std::fs::copy`].
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).with_context(|| {
                format!("copying {} to {}", src_path.display(), dst_path.display())
            })?;
        }
    }
    let perms = std::fs::metadata(src)
        .with_context(|| format!("reading metadata: {}", src.display()))?
        .permissions();
    std::fs::set_permissions(dst, perms)
        .with_context(|| format!("setting permissions: {}", dst.display()))?;
    Ok(())
}

/// Replace `target` with a copy of the content at `source`.
///
/// The copy is staged next to `target` first, so a failed copy leaves
/// `target` untouched. Directories are copied recursively. Falls back to a
/// plain copy when the final rename crosses a filesystem boundary.
///
/// # Errors
///
/// Returns an error if staging, removing the old `target`, or moving the
/// staged copy into place fails.
pub fn copy_into_place(source: &Path, target: &Path) -> Result<()> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let staged = parent.join(target.file_name().map_or_else(
        || ".tuckr_tmp".to_string(),
        |n| format!(".{}.tuckr_tmp", n.to_string_lossy()),
    ));
    let is_dir = source.is_dir();

    let cleanup = || {
        let _ = remove_path(&staged);
    };

    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent: {}", parent.display()))?;
    let copied = if is_dir {
        copy_dir_recursive(source, &staged)
    } else {
        std::fs::copy(source, &staged)
            .map(|_| ())
            .with_context(|| format!("copy {} to {}", source.display(), staged.display()))
    };
    if let Err(e) = copied {
        cleanup();
        return Err(e);
    }

    if let Err(e) = remove_path(target) {
        cleanup();
        return Err(e);
    }

    if std::fs::rename(&staged, target).is_err() {
        let moved = if is_dir {
            copy_dir_recursive(&staged, target)
        } else {
            std::fs::copy(&staged, target)
                .map(|_| ())
                .with_context(|| format!("copy {} to {}", staged.display(), target.display()))
        };
        cleanup();
        moved?;
    }
    Ok(())
}

/// Hex-encoded SHA-256 digest of a file's content.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(buf.get(..n).unwrap_or_default());
    }
    Ok(hex(&hasher.finalize()))
}

/// Hex-encoded SHA-256 digest of an in-memory buffer.
#[must_use]
pub fn sha256_bytes(data: &[u8]) -> String {
    hex(&Sha256::digest(data))
}

fn hex(digest: &[u8]) -> String {
    digest
        .iter()
        .fold(String::with_capacity(digest.len() * 2), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
}
