//! Discovering profiles: sibling dotfiles roots named `dotfiles_<profile>`.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::env::Environment;
use super::root::ROOT_NAME;

/// A dotfiles root found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    /// Profile name, `None` for the default root.
    pub name: Option<String>,
    /// Root directory.
    pub path: PathBuf,
}

/// Every profile found in the directories a root may live in.
///
/// The same profile found in two places is reported once, for the location
/// that [`super::root::DotfilesRoot::locate`] would pick.
#[must_use]
pub fn discover(env: &dyn Environment) -> Vec<ProfileEntry> {
    let mut found: BTreeMap<Option<String>, PathBuf> = BTreeMap::new();

    let mut search: Vec<(PathBuf, bool)> = Vec::new();
    if let Some(home) = env.var("TUCKR_HOME") {
        search.push((PathBuf::from(home), false));
    } else {
        if let Some(config) = env.config_dir() {
            search.push((config, false));
        }
        if let Some(home) = env.home_dir() {
            search.push((home, true));
        }
    }

    for (dir, hidden) in search {
        for (name, path) in profiles_in(&dir, hidden) {
            found.entry(name).or_insert(path);
        }
    }

    found
        .into_iter()
        .map(|(name, path)| ProfileEntry { name, path })
        .collect()
}

/// Parse a directory name as a dotfiles root.
///
/// ```
/// use tuckr_cli::config::profiles::profile_from_dir_name;
///
/// assert_eq!(profile_from_dir_name("dotfiles", false), Some(None));
/// assert_eq!(profile_from_dir_name(".dotfiles_work", true), Some(Some("work".to_string())));
/// assert_eq!(profile_from_dir_name("dotfiles_", false), None);
/// assert_eq!(profile_from_dir_name("notes", false), None);
/// ```
#[must_use]
pub fn profile_from_dir_name(dir_name: &str, hidden: bool) -> Option<Option<String>> {
    let name = if hidden {
        dir_name.strip_prefix('.')?
    } else {
        dir_name
    };
    let rest = name.strip_prefix(ROOT_NAME)?;
    if rest.is_empty() {
        return Some(None);
    }
    rest.strip_prefix('_')
        .filter(|p| !p.is_empty())
        .map(|p| Some(p.to_string()))
}

fn profiles_in(dir: &Path, hidden: bool) -> Vec<(Option<String>, PathBuf)> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let file_name = e.file_name();
            let profile = profile_from_dir_name(file_name.to_str()?, hidden)?;
            Some((profile, e.path()))
        })
        .collect()
}
