//! Group resolution: from group directories on disk to merged groups.
//!
//! Every immediate subdirectory of `Configs/` (or `Hooks/`, `Secrets/`) is a
//! group variant. Variants are bucketed by base name; the applicable ones
//! contribute files, one variant per suffix tier, and when two contributing
//! variants hold the same logical path the higher-priority one wins. The
//! table is rebuilt from the directory tree on every invocation.
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::selection::SelectionContext;
use super::targets::{Priority, Suffix, split_group_name};
use super::validation::{is_ignored, validate_group_name};
use crate::error::ResolutionError;

/// One physical group directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Directory name, e.g. `zsh_linux`.
    pub dir_name: String,
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Recognized suffix, `None` for the unconditional directory.
    pub suffix: Option<Suffix>,
    /// Rank against the other variants of the same base.
    pub priority: Priority,
}

/// A file contributed to a group by one of its variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedFile {
    /// Base group name.
    pub group: String,
    /// Directory name of the contributing variant.
    pub variant: String,
    /// Path relative to the variant directory.
    pub logical: PathBuf,
    /// Absolute path of the file inside the repository.
    pub source: PathBuf,
}

impl ManagedFile {
    /// The dotfiles root holding this file (the parent of `Configs/`).
    #[must_use]
    pub fn repository(&self) -> &Path {
        self.source
            .ancestors()
            .nth(self.logical.components().count() + 2)
            .unwrap_or_else(|| Path::new("/"))
    }
}

/// A base group after merging its applicable variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroup {
    /// Base name.
    pub name: String,
    /// Contributing variants, highest priority first.
    pub variants: Vec<Variant>,
    /// Winning file for every logical path, sorted by logical path.
    pub files: Vec<ManagedFile>,
    /// Lower-priority files hidden by a winner with the same logical path.
    pub shadowed: Vec<ManagedFile>,
}

impl ResolvedGroup {
    /// Winning file for a logical path.
    #[must_use]
    pub fn file(&self, logical: &Path) -> Option<&ManagedFile> {
        self.files.iter().find(|f| f.logical == logical)
    }
}

/// All groups under one top-level directory, resolved for a context.
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    dir: PathBuf,
    groups: BTreeMap<String, ResolvedGroup>,
    unsupported: BTreeMap<String, Vec<String>>,
    rejected: Vec<ResolutionError>,
}

impl GroupTable {
    /// Scan `dir` and resolve every group in it.
    ///
    /// A missing directory yields an empty table. Directories with invalid
    /// names are left out and listed by [`GroupTable::rejected`].
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be read.
    pub fn scan(dir: &Path, selection: &SelectionContext) -> Result<Self> {
        let mut table = Self {
            dir: dir.to_path_buf(),
            ..Self::default()
        };
        if !dir.is_dir() {
            return Ok(table);
        }

        let mut buckets: BTreeMap<String, Vec<Variant>> = BTreeMap::new();
        let entries =
            std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(dir_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_ignored(&dir_name) {
                continue;
            }
            if let Err(e) = validate_group_name(&dir_name) {
                table.rejected.push(e);
                continue;
            }

            let (base, suffix) = split_group_name(&dir_name);
            let priority = Priority::of(suffix.as_ref(), &selection.custom_targets);
            buckets.entry(base.to_string()).or_default().push(Variant {
                dir_name: dir_name.clone(),
                path,
                suffix,
                priority,
            });
        }

        for (base, variants) in buckets {
            let (applicable, inapplicable): (Vec<_>, Vec<_>) =
                variants.into_iter().partition(|v| {
                    v.suffix.as_ref().is_none_or(|s| {
                        s.applies(&selection.platform, &selection.custom_targets)
                    })
                });

            let contributing = pick_contributing(applicable);
            if contributing.is_empty() {
                table.unsupported.insert(
                    base,
                    inapplicable.into_iter().map(|v| v.dir_name).collect(),
                );
                continue;
            }

            let group = merge_variants(&base, contributing)?;
            table.groups.insert(base, group);
        }

        Ok(table)
    }

    /// Directory this table was scanned from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up a base group.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NoSuchGroup`] when no variant of `name`
    /// applies to this context.
    pub fn get(&self, name: &str) -> Result<&ResolvedGroup, ResolutionError> {
        self.groups
            .get(name)
            .ok_or_else(|| ResolutionError::NoSuchGroup {
                group: name.to_string(),
            })
    }

    /// Whether a base group resolves in this context.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Resolved base names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Resolved groups, sorted by name.
    pub fn groups(&self) -> impl Iterator<Item = &ResolvedGroup> {
        self.groups.values()
    }

    /// Base names that exist only as variants for other platforms or
    /// inactive custom targets, with those variants' directory names.
    #[must_use]
    pub const fn unsupported(&self) -> &BTreeMap<String, Vec<String>> {
        &self.unsupported
    }

    /// Group directories skipped because of their name.
    #[must_use]
    pub fn rejected(&self) -> &[ResolutionError] {
        &self.rejected
    }
}

/// Keep the best variant of every tier, highest priority first.
fn pick_contributing(mut applicable: Vec<Variant>) -> Vec<Variant> {
    applicable.sort_by(|a, b| b.priority.cmp(&a.priority));
    let mut contributing: Vec<Variant> = Vec::new();
    for variant in applicable {
        if contributing
            .iter()
            .all(|c| c.priority.tier() != variant.priority.tier())
        {
            contributing.push(variant);
        }
    }
    contributing
}

fn merge_variants(base: &str, variants: Vec<Variant>) -> Result<ResolvedGroup> {
    let mut files: BTreeMap<PathBuf, ManagedFile> = BTreeMap::new();
    let mut shadowed = Vec::new();

    for variant in &variants {
        for logical in managed_paths(&variant.path)? {
            let file = ManagedFile {
                group: base.to_string(),
                variant: variant.dir_name.clone(),
                source: variant.path.join(&logical),
                logical: logical.clone(),
            };
            if files.contains_key(&logical) {
                shadowed.push(file);
            } else {
                files.insert(logical, file);
            }
        }
    }

    Ok(ResolvedGroup {
        name: base.to_string(),
        variants,
        files: files.into_values().collect(),
        shadowed,
    })
}

/// Logical paths of every file and symlink below `variant_dir`, sorted.
///
/// Directories are traversed, never managed themselves.
fn managed_paths(variant_dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(variant_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_str().is_some_and(is_ignored));

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", variant_dir.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(logical) = entry.path().strip_prefix(variant_dir) {
            paths.push(logical.to_path_buf());
        }
    }
    Ok(paths)
}
