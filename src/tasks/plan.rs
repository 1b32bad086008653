//! Deployment plans: every managed file of a group paired with its resolved
//! deployment path.
//!
//! Plans are built once per command from the resolved group table. Files
//! whose path cannot be resolved, or whose deployment path collides with
//! another file of the same run, are moved out of the plan into its
//! `errors`; the rest of the group proceeds.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{Context, TaskStats};
use crate::config::env::Environment;
use crate::config::groups::{ManagedFile, ResolvedGroup};
use crate::config::paths;
use crate::config::selection::ConflictPolicy;
use crate::error::ResolutionError;
use crate::resources::status::{GroupSummary, SymlinkStatus, classify};
use crate::resources::symlink::ManagedLink;

/// A managed file and where it is deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// The file inside the repository.
    pub file: ManagedFile,
    /// Resolved deployment path.
    pub deployment: PathBuf,
}

impl PlannedFile {
    /// `group/logical-path`, used to name the file in messages.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.file.group, self.file.logical.display())
    }

    /// Current status of the deployment path.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployment path cannot be inspected.
    pub fn status(&self) -> Result<SymlinkStatus> {
        classify(&self.file.source, &self.deployment, self.file.repository())
    }
}

/// Resolved deployment paths of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    /// Base group name.
    pub group: String,
    /// Files that can be processed, sorted by logical path.
    pub entries: Vec<PlannedFile>,
    /// Files left out of the plan and why.
    pub errors: Vec<ResolutionError>,
}

impl GroupPlan {
    /// Resolve the deployment path of every file of `group`.
    #[must_use]
    pub fn build(group: &ResolvedGroup, target_base: &Path, env: &dyn Environment) -> Self {
        let mut entries = Vec::with_capacity(group.files.len());
        let mut errors = Vec::new();
        for file in &group.files {
            match paths::resolve(&file.logical, target_base, env) {
                Ok(deployment) => entries.push(PlannedFile {
                    file: file.clone(),
                    deployment,
                }),
                Err(e) => errors.push(e),
            }
        }
        Self {
            group: group.name.clone(),
            entries,
            errors,
        }
    }

    /// Whether the plan holds neither files nor errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.errors.is_empty()
    }

    /// One symlink resource per planned file.
    #[must_use]
    pub fn links(&self, policy: ConflictPolicy) -> Vec<ManagedLink> {
        self.entries
            .iter()
            .map(|e| {
                ManagedLink::new(e.file.source.clone(), e.deployment.clone(), policy)
                    .within(e.file.repository())
            })
            .collect()
    }

    /// Status of every planned file, in plan order.
    ///
    /// # Errors
    ///
    /// Returns an error if a deployment path cannot be inspected.
    pub fn statuses(&self) -> Result<Vec<(&PlannedFile, SymlinkStatus)>> {
        self.entries
            .iter()
            .map(|e| Ok((e, e.status()?)))
            .collect()
    }

    /// Group-level status counts.
    ///
    /// # Errors
    ///
    /// Returns an error if a deployment path cannot be inspected.
    pub fn summary(&self) -> Result<GroupSummary> {
        let statuses: Vec<SymlinkStatus> = self
            .statuses()?
            .into_iter()
            .map(|(_, status)| status)
            .collect();
        Ok(GroupSummary::from_statuses(&statuses))
    }

    /// Log every plan error and count it as a failed file.
    pub fn report_errors(&self, ctx: &Context, stats: &mut TaskStats) {
        for err in &self.errors {
            ctx.log.error(&err.to_string());
            stats.record_failure(&err.clone().into());
        }
    }
}

/// Move files with colliding deployment paths out of their plans.
///
/// Two files collide when they resolve to the same path, or when one path
/// lies below the other (linking the outer one would route the inner one
/// through a symlink). Every file involved is dropped from its plan and
/// each affected plan gets one [`ResolutionError::AmbiguousDeployment`] per
/// collision.
pub fn detect_overlaps(plans: &mut [GroupPlan]) {
    let mut claims: Vec<(PathBuf, usize, usize)> = plans
        .iter()
        .enumerate()
        .flat_map(|(p, plan)| {
            plan.entries
                .iter()
                .enumerate()
                .map(move |(e, entry)| (entry.deployment.clone(), p, e))
        })
        .collect();
    // Component-wise ordering puts every path directly before its descendants.
    claims.sort();

    let mut clusters: Vec<Vec<(PathBuf, usize, usize)>> = Vec::new();
    for claim in claims {
        let nested = clusters
            .last()
            .and_then(|cluster| cluster.first())
            .is_some_and(|(anchor, _, _)| claim.0.starts_with(anchor));
        match clusters.last_mut() {
            Some(cluster) if nested => cluster.push(claim),
            _ => clusters.push(vec![claim]),
        }
    }

    let mut dropped: BTreeSet<(usize, usize)> = BTreeSet::new();
    for cluster in clusters.into_iter().filter(|c| c.len() > 1) {
        let Some((anchor, _, _)) = cluster.first() else {
            continue;
        };
        let sources: Vec<String> = cluster
            .iter()
            .filter_map(|(_, p, e)| plans.get(*p)?.entries.get(*e).map(PlannedFile::label))
            .collect();
        let affected: BTreeSet<usize> = cluster.iter().map(|(_, p, _)| *p).collect();
        for p in affected {
            if let Some(plan) = plans.get_mut(p) {
                plan.errors.push(ResolutionError::AmbiguousDeployment {
                    path: anchor.clone(),
                    sources: sources.clone(),
                });
            }
        }
        dropped.extend(cluster.iter().map(|(_, p, e)| (*p, *e)));
    }

    for (p, plan) in plans.iter_mut().enumerate() {
        let entries = std::mem::take(&mut plan.entries);
        plan.entries = entries
            .into_iter()
            .enumerate()
            .filter(|(e, _)| !dropped.contains(&(p, *e)))
            .map(|(_, entry)| entry)
            .collect();
    }
}
