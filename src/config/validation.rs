//! Name checks applied while scanning the dotfiles tree.
use crate::error::ResolutionError;

/// Exact file names left behind by file managers and operating systems.
const JUNK_NAMES: &[&str] = &[
    ".DS_Store",
    ".AppleDouble",
    ".LSOverride",
    "Icon\r",
    ".Spotlight-V100",
    ".Trashes",
    "Thumbs.db",
    "ehthumbs.db",
    "ehthumbs_vista.db",
    "desktop.ini",
    "$RECYCLE.BIN",
    ".directory",
];

/// Prefixes of temporary files created by FUSE, trash and NFS.
const JUNK_PREFIXES: &[&str] = &[".fuse_hidden", ".Trash-", ".nfs", "._"];

/// Characters that cannot appear in a directory name on every platform.
const RESERVED_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

/// Device names Windows reserves regardless of extension.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Whether a file name is OS or editor clutter that must never be deployed.
///
/// ```
/// use tuckr_cli::config::validation::is_ignored;
///
/// assert!(is_ignored(".DS_Store"));
/// assert!(is_ignored("init.lua~"));
/// assert!(!is_ignored(".zshrc"));
/// ```
#[must_use]
pub fn is_ignored(file_name: &str) -> bool {
    JUNK_NAMES.contains(&file_name)
        || JUNK_PREFIXES.iter().any(|p| file_name.starts_with(p))
        || file_name.ends_with('~')
        || file_name.ends_with(".stackdump")
}

/// Check that `name` can be used as a group directory on every platform.
///
/// # Errors
///
/// Returns [`ResolutionError::InvalidGroupName`] describing the problem.
pub fn validate_group_name(name: &str) -> Result<(), ResolutionError> {
    let invalid = |reason: &str| ResolutionError::InvalidGroupName {
        group: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name refers to a directory entry"));
    }
    if let Some(c) = name.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(invalid(&format!("contains reserved character '{c}'")));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("contains a control character"));
    }
    if name.len() > 1 && (name.ends_with('.') || name.ends_with(char::is_whitespace)) {
        return Err(invalid("ends with a dot or whitespace"));
    }

    let stem = name.split('.').next().unwrap_or(name);
    if RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
    {
        return Err(invalid("is a reserved device name"));
    }

    Ok(())
}
