//! Selection Engine: from the group names on the command line to the groups
//! a command processes.
//!
//! `*` expands to the candidates that still need the command; explicit
//! names are taken verbatim. Exclusions are applied after expansion and the
//! result keeps the first occurrence of every name.
use std::collections::HashSet;

use crate::config::selection::ConflictPolicy;
use crate::error::{ResolutionError, SelectionError};
use crate::resources::status::{GroupStatus, GroupSummary};

/// The wildcard group name.
pub const WILDCARD: &str = "*";

/// What the selected groups will be used for; decides what `*` expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Linking: groups not fully symlinked and free of conflicts.
    Add,
    /// Unlinking: groups with at least one linked file.
    Remove,
    /// Running the set pipeline: groups free of conflicts, hook-only
    /// groups included.
    Set,
    /// Everything that resolves (unset, decrypt).
    Every,
}

/// A group that `*` may expand to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Base group name.
    pub name: String,
    /// Status counts of its files, `None` for groups without `Configs/` files.
    pub summary: Option<GroupSummary>,
}

impl Candidate {
    /// A candidate with symlinked files.
    #[must_use]
    pub fn new(name: impl Into<String>, summary: GroupSummary) -> Self {
        Self {
            name: name.into(),
            summary: Some(summary),
        }
    }

    /// A candidate without symlinked files (e.g. a hook-only group).
    #[must_use]
    pub fn without_files(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: None,
        }
    }

    fn wanted_by_wildcard(&self, purpose: Purpose) -> bool {
        match (purpose, self.summary) {
            (Purpose::Every, _) | (Purpose::Set, None) => true,
            (Purpose::Add | Purpose::Remove, None) => false,
            (Purpose::Add, Some(s)) => s.status() != GroupStatus::FullySymlinked && !s.has_conflicts(),
            (Purpose::Remove, Some(s)) => s.linked > 0,
            (Purpose::Set, Some(s)) => !s.has_conflicts(),
        }
    }
}

/// Outcome of a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Groups to process, in order.
    pub groups: Vec<String>,
    /// Explicitly named groups that do not resolve.
    pub missing: Vec<ResolutionError>,
}

/// Expand `names` against `candidates`.
///
/// # Errors
///
/// Returns [`SelectionError::AmbiguousForce`] when `policy` overrides
/// conflicts and `*` is the only name given.
///
/// # Examples
///
/// ```
/// use tuckr_cli::config::selection::ConflictPolicy;
/// use tuckr_cli::resources::status::GroupSummary;
/// use tuckr_cli::tasks::selection::{select, Candidate, Purpose};
///
/// let linked = GroupSummary { linked: 1, ..GroupSummary::default() };
/// let unlinked = GroupSummary { unlinked: 1, ..GroupSummary::default() };
/// let candidates = [
///     Candidate::new("git", linked),
///     Candidate::new("nvim", unlinked),
///     Candidate::new("zsh", unlinked),
/// ];
///
/// let names = ["*".to_string()];
/// let exclude = ["zsh".to_string()];
/// let selection = select(&names, &exclude, Purpose::Add, ConflictPolicy::Skip, &candidates).unwrap();
/// assert_eq!(selection.groups, ["nvim"]);
/// ```
pub fn select(
    names: &[String],
    exclude: &[String],
    purpose: Purpose,
    policy: ConflictPolicy,
    candidates: &[Candidate],
) -> Result<Selection, SelectionError> {
    let wildcard = names.iter().any(|n| n == WILDCARD);
    let explicit = names.iter().any(|n| n != WILDCARD);
    if wildcard && !explicit && policy.overrides_conflicts() {
        return Err(SelectionError::AmbiguousForce);
    }

    let excluded: HashSet<&str> = exclude.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut selection = Selection::default();

    for name in names {
        let expanded: Vec<&str> = if name == WILDCARD {
            candidates
                .iter()
                .filter(|c| c.wanted_by_wildcard(purpose))
                .map(|c| c.name.as_str())
                .collect()
        } else {
            vec![name.as_str()]
        };

        for group in expanded {
            if excluded.contains(group) || !seen.insert(group) {
                continue;
            }
            if candidates.iter().any(|c| c.name == group) {
                selection.groups.push(group.to_string());
            } else {
                selection.missing.push(ResolutionError::NoSuchGroup {
                    group: group.to_string(),
                });
            }
        }
    }

    Ok(selection)
}
