//! Mapping logical paths inside a group to deployment paths.
//!
//! A logical path is appended to the target base directory unless one of its
//! segments is a marker:
//!
//! - `^name` anchors the rest of the path at the filesystem root;
//! - `%NAME` replaces everything before it with the value of `$NAME`.
//!
//! Only the last marker counts.
use std::ffi::OsStr;
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

use super::env::Environment;
use crate::error::ResolutionError;

/// Prefix of a root-anchored segment.
pub const ROOT_MARKER: char = '^';

/// Prefix of an environment-anchored segment.
pub const ENV_MARKER: char = '%';

#[derive(Debug, Clone, Copy)]
enum Anchor<'a> {
    Root(&'a str),
    Env(&'a str),
}

/// Resolve `logical` (relative to its group directory) to a deployment path.
///
/// # Errors
///
/// Returns [`ResolutionError::UnresolvedEnvVar`] when the governing `%NAME`
/// marker names an unset variable.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tuckr_cli::config::env::StaticEnvironment;
/// use tuckr_cli::config::paths::resolve;
///
/// let env = StaticEnvironment::new().with_var("XDG_CONFIG_HOME", "/cfg");
/// let base = Path::new("/home/me");
///
/// assert_eq!(resolve(Path::new(".zshrc"), base, &env).unwrap(), PathBuf::from("/home/me/.zshrc"));
/// assert_eq!(resolve(Path::new("^etc/hosts"), base, &env).unwrap(), PathBuf::from("/etc/hosts"));
/// assert_eq!(
///     resolve(Path::new("%XDG_CONFIG_HOME/nvim/init.lua"), base, &env).unwrap(),
///     PathBuf::from("/cfg/nvim/init.lua"),
/// );
/// ```
pub fn resolve(
    logical: &Path,
    target_base: &Path,
    env: &dyn Environment,
) -> Result<PathBuf, ResolutionError> {
    let segments: Vec<&OsStr> = logical
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .collect();

    let anchor = segments
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, seg)| anchor_of(seg).map(|a| (i, a)));

    let Some((index, anchor)) = anchor else {
        return Ok(target_base.join(logical));
    };

    let rest = segments.iter().skip(index + 1);
    let mut resolved = match anchor {
        Anchor::Root(first) => filesystem_root(target_base).join(first),
        Anchor::Env(var) => env
            .var(var)
            .map(PathBuf::from)
            .ok_or_else(|| ResolutionError::UnresolvedEnvVar {
                var: var.to_string(),
                path: logical.to_path_buf(),
            })?,
    };
    resolved.extend(rest);
    Ok(resolved)
}

/// Inverse of [`resolve`] for paths found on disk: the logical path under
/// which `deployed` should be stored in a group.
///
/// Paths outside `target_base` become root-anchored.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tuckr_cli::config::paths::to_logical;
///
/// let base = Path::new("/home/me");
/// assert_eq!(to_logical(Path::new("/home/me/.zshrc"), base), PathBuf::from(".zshrc"));
/// assert_eq!(to_logical(Path::new("/etc/hosts"), base), PathBuf::from("^etc/hosts"));
/// ```
#[must_use]
pub fn to_logical(deployed: &Path, target_base: &Path) -> PathBuf {
    if let Ok(relative) = deployed.strip_prefix(target_base) {
        return relative.to_path_buf();
    }

    let mut normal = deployed.components().filter_map(|c| match c {
        Component::Normal(s) => Some(s),
        _ => None,
    });
    let mut logical = PathBuf::new();
    if let Some(first) = normal.next() {
        let mut anchored = ROOT_MARKER.to_string();
        anchored.push_str(&first.to_string_lossy());
        logical.push(anchored);
    }
    logical.extend(normal);
    logical
}

/// Recognize a marker segment. A lone `^` or `%` is an ordinary name.
fn anchor_of(segment: &OsStr) -> Option<Anchor<'_>> {
    let s = segment.to_str()?;
    if s.len() < 2 {
        return None;
    }
    s.strip_prefix(ROOT_MARKER)
        .map(Anchor::Root)
        .or_else(|| s.strip_prefix(ENV_MARKER).map(Anchor::Env))
}

/// The root (`/`, or the drive root on Windows) that `base` lives on.
fn filesystem_root(base: &Path) -> PathBuf {
    let root: PathBuf = base
        .components()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect();
    if root.as_os_str().is_empty() {
        PathBuf::from(MAIN_SEPARATOR_STR)
    } else {
        root
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::env::StaticEnvironment;

    fn env() -> StaticEnvironment {
        StaticEnvironment::new()
            .with_var("P", "/opt/p")
            .with_var("XDG_CONFIG_HOME", "/home/me/.config")
    }

    fn resolve_str(logical: &str) -> Result<PathBuf, ResolutionError> {
        resolve(Path::new(logical), Path::new("/home/me"), &env())
    }

    #[test]
    fn unmarked_path_is_appended_to_target_base() {
        for logical in [".zshrc", ".config/nvim/init.lua", "a/b/c/d"] {
            assert_eq!(
                resolve_str(logical).unwrap(),
                Path::new("/home/me").join(logical)
            );
        }
    }

    #[test]
    fn root_anchor_starts_at_filesystem_root() {
        assert_eq!(
            resolve_str("^etc/pacman.conf").unwrap(),
            PathBuf::from("/etc/pacman.conf")
        );
        assert_eq!(
            resolve_str("system/^etc/hosts").unwrap(),
            PathBuf::from("/etc/hosts")
        );
    }

    #[test]
    fn env_anchor_replaces_prefix() {
        assert_eq!(
            resolve_str("%XDG_CONFIG_HOME/nvim/init.lua").unwrap(),
            PathBuf::from("/home/me/.config/nvim/init.lua")
        );
        assert_eq!(
            resolve_str("ignored/%P/bin/tool").unwrap(),
            PathBuf::from("/opt/p/bin/tool")
        );
    }

    #[test]
    fn last_marker_wins() {
        assert_eq!(resolve_str("a/^etc/%P/f").unwrap(), PathBuf::from("/opt/p/f"));
        assert_eq!(resolve_str("%P/x/^etc/f").unwrap(), PathBuf::from("/etc/f"));
    }

    #[test]
    fn later_unset_variable_fails_even_after_root_anchor() {
        let err = resolve_str("^etc/%NOPE/f").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnresolvedEnvVar {
                var: "NOPE".to_string(),
                path: PathBuf::from("^etc/%NOPE/f"),
            }
        );
    }

    #[test]
    fn earlier_unset_variable_is_overridden() {
        assert_eq!(resolve_str("%NOPE/^etc/f").unwrap(), PathBuf::from("/etc/f"));
    }

    #[test]
    fn lone_marker_characters_are_plain_names() {
        assert_eq!(
            resolve_str("^/%/file").unwrap(),
            PathBuf::from("/home/me/^/%/file")
        );
    }

    #[test]
    fn to_logical_round_trips_through_resolve() {
        let base = Path::new("/home/me");
        for deployed in ["/home/me/.zshrc", "/etc/hosts", "/usr/local/bin/x"] {
            let logical = to_logical(Path::new(deployed), base);
            assert_eq!(resolve(&logical, base, &env()).unwrap(), PathBuf::from(deployed));
        }
    }
}
