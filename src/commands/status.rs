//! Command: `status`.
//!
//! Without group names every group is listed under its aggregate status.
//! Named groups are shown file by file. `--json` prints the same report
//! for scripts.
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use super::{CommandSetup, plan_table};
use crate::cli::{GlobalOpts, StatusOpts};
use crate::config::selection::ConflictPolicy;
use crate::error::{ResolutionError, TuckrError};
use crate::logging::{Log, Logger};
use crate::resources::status::{GroupStatus, GroupSummary, SymlinkStatus};
use crate::tasks::Context;
use crate::tasks::plan::{GroupPlan, detect_overlaps};
use crate::tasks::selection::{Candidate, Purpose, select};

/// Status of every requested group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Groups that resolve on this host, in report order.
    pub groups: Vec<GroupReport>,
    /// Groups whose variants all target other platforms.
    pub unsupported: Vec<UnsupportedReport>,
    /// Requested names that match no group.
    pub missing: Vec<String>,
}

/// Status of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// Group name.
    pub name: String,
    /// Aggregate status.
    pub status: GroupStatus,
    /// Per-status file counts.
    pub counts: GroupSummary,
    /// Files whose deployment path is occupied.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<FileReport>,
    /// Every file, for groups named on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileReport>>,
    /// Files that could not be planned.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Status of one managed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Logical path inside the group.
    pub logical: PathBuf,
    /// Resolved deployment path.
    pub deployment: PathBuf,
    /// Live state of the deployment path.
    pub state: SymlinkStatus,
}

/// A group with no variant for this host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedReport {
    /// Base group name.
    pub name: String,
    /// Directory names of its variants.
    pub variants: Vec<String>,
}

/// Run `status`.
///
/// # Errors
///
/// Returns an error if setup fails, a deployment path cannot be inspected,
/// or a named group does not exist (after the report is printed).
pub fn run(
    global: &GlobalOpts,
    opts: &StatusOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
    let report = build_report(&ctx, &opts.groups)?;

    let mut out = std::io::stdout().lock();
    if opts.json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        out.write_all(render_text(&report).as_bytes())?;
    }
    out.flush()?;

    if let Some(group) = report.missing.first() {
        return Err(TuckrError::Resolution(ResolutionError::NoSuchGroup {
            group: group.clone(),
        })
        .into());
    }
    Ok(())
}

/// Classify the files of `names` (every group when empty).
///
/// Overlapping deployment paths are detected across all groups, so a group
/// reports its ambiguous files even when the other claimant is not named.
///
/// # Errors
///
/// Returns an error if a deployment path cannot be inspected.
pub fn build_report(ctx: &Context, names: &[String]) -> Result<StatusReport> {
    let mut plans: Vec<GroupPlan> = plan_table(ctx, &ctx.config.configs).into_values().collect();
    detect_overlaps(&mut plans);
    let unsupported = ctx.config.configs.unsupported();
    let mut report = StatusReport::default();

    if names.is_empty() {
        for plan in &plans {
            report.groups.push(group_report(plan, false)?);
        }
        report.unsupported = unsupported
            .iter()
            .map(|(name, variants)| UnsupportedReport {
                name: name.clone(),
                variants: variants.clone(),
            })
            .collect();
        return Ok(report);
    }

    let pool: Vec<Candidate> = plans
        .iter()
        .map(|plan| Candidate::without_files(plan.group.clone()))
        .collect();
    let selection = select(names, &[], Purpose::Every, ConflictPolicy::Skip, &pool)?;
    for name in &selection.groups {
        if let Some(plan) = plans.iter().find(|p| &p.group == name) {
            report.groups.push(group_report(plan, true)?);
        }
    }
    for err in selection.missing {
        let ResolutionError::NoSuchGroup { group } = err else {
            continue;
        };
        match unsupported.get(&group) {
            Some(variants) => report.unsupported.push(UnsupportedReport {
                name: group,
                variants: variants.clone(),
            }),
            None => report.missing.push(group),
        }
    }
    Ok(report)
}

fn group_report(plan: &GroupPlan, detailed: bool) -> Result<GroupReport> {
    let statuses = plan.statuses()?;
    let counts = GroupSummary::from_statuses(statuses.iter().map(|(_, status)| status));
    let files: Vec<FileReport> = statuses
        .into_iter()
        .map(|(entry, state)| FileReport {
            logical: entry.file.logical.clone(),
            deployment: entry.deployment.clone(),
            state,
        })
        .collect();
    Ok(GroupReport {
        name: plan.group.clone(),
        status: counts.status(),
        counts,
        conflicts: files
            .iter()
            .filter(|f| f.state.is_conflicting())
            .cloned()
            .collect(),
        files: detailed.then_some(files),
        errors: plan.errors.iter().map(ToString::to_string).collect(),
    })
}

fn file_line(file: &FileReport) -> String {
    let arrow = format!("{} -> {}", file.logical.display(), file.deployment.display());
    match &file.state {
        SymlinkStatus::Linked => format!("  linked       {arrow}"),
        SymlinkStatus::Unlinked => format!("  unlinked     {arrow}"),
        SymlinkStatus::Conflicting { conflict } => format!("  conflicting  {arrow} ({conflict})"),
    }
}

/// Render a report as plain text.
#[must_use]
pub fn render_text(report: &StatusReport) -> String {
    let mut out = String::new();
    let mut section = |title: &str, lines: Vec<String>| {
        if lines.is_empty() {
            return;
        }
        let _ = writeln!(out, "{title}:");
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
    };

    let detailed = report.groups.iter().any(|g| g.files.is_some());
    if detailed {
        for group in &report.groups {
            let files = group.files.as_deref().unwrap_or_default();
            section(
                &format!("{} ({})", group.name, group.status),
                files.iter().map(file_line).collect(),
            );
        }
    } else {
        for status in [
            GroupStatus::FullySymlinked,
            GroupStatus::PartiallySymlinked,
            GroupStatus::NotSymlinked,
        ] {
            let title = match status {
                GroupStatus::FullySymlinked => "Symlinked",
                GroupStatus::PartiallySymlinked => "Partially symlinked",
                GroupStatus::NotSymlinked => "Not symlinked",
            };
            section(
                title,
                report
                    .groups
                    .iter()
                    .filter(|g| g.status == status)
                    .map(|g| match status {
                        GroupStatus::PartiallySymlinked => format!(
                            "  {} ({}/{} linked)",
                            g.name,
                            g.counts.linked,
                            g.counts.total()
                        ),
                        _ => format!("  {}", g.name),
                    })
                    .collect(),
            );
        }
        section(
            "Conflicts",
            report
                .groups
                .iter()
                .flat_map(|g| {
                    g.conflicts.iter().filter_map(move |f| match &f.state {
                        SymlinkStatus::Conflicting { conflict } => Some(format!(
                            "  {}/{}: {conflict}",
                            g.name,
                            f.logical.display()
                        )),
                        _ => None,
                    })
                })
                .collect(),
        );
    }

    section(
        "Errors",
        report
            .groups
            .iter()
            .flat_map(|g| g.errors.iter().map(move |e| format!("  {}: {e}", g.name)))
            .collect(),
    );
    section(
        "Not supported on this platform",
        report
            .unsupported
            .iter()
            .map(|u| format!("  {} ({})", u.name, u.variants.join(", ")))
            .collect(),
    );
    section(
        "No such group",
        report.missing.iter().map(|m| format!("  {m}")).collect(),
    );

    if out.is_empty() {
        out.push_str("No groups found\n");
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::status::Conflict;
    use crate::tasks::test_helpers::TestTree;

    fn file(logical: &str, state: SymlinkStatus) -> FileReport {
        FileReport {
            logical: PathBuf::from(logical),
            deployment: PathBuf::from("/home/me").join(logical),
            state,
        }
    }

    fn group(name: &str, files: Vec<FileReport>, detailed: bool) -> GroupReport {
        let counts = GroupSummary::from_statuses(files.iter().map(|f| &f.state));
        GroupReport {
            name: name.to_string(),
            status: counts.status(),
            counts,
            conflicts: files
                .iter()
                .filter(|f| f.state.is_conflicting())
                .cloned()
                .collect(),
            files: detailed.then_some(files),
            errors: Vec::new(),
        }
    }

    fn occupied() -> SymlinkStatus {
        SymlinkStatus::Conflicting {
            conflict: Conflict::Occupied { is_dir: false },
        }
    }

    #[test]
    fn overview_groups_by_status() {
        let report = StatusReport {
            groups: vec![
                group("git", vec![file(".gitconfig", SymlinkStatus::Linked)], false),
                group("nvim", vec![file(".vimrc", SymlinkStatus::Unlinked)], false),
                group(
                    "zsh",
                    vec![
                        file(".zshrc", SymlinkStatus::Linked),
                        file(".zprofile", occupied()),
                    ],
                    false,
                ),
            ],
            unsupported: vec![UnsupportedReport {
                name: "wintools".to_string(),
                variants: vec!["wintools_windows".to_string()],
            }],
            missing: Vec::new(),
        };

        insta::assert_snapshot!(render_text(&report), @r"
        Symlinked:
          git
        Partially symlinked:
          zsh (1/2 linked)
        Not symlinked:
          nvim
        Conflicts:
          zsh/.zprofile: a file is in the way
        Not supported on this platform:
          wintools (wintools_windows)
        ");
    }

    #[test]
    fn named_groups_are_shown_file_by_file() {
        let report = StatusReport {
            groups: vec![group(
                "zsh",
                vec![
                    file(".zprofile", occupied()),
                    file(".zshrc", SymlinkStatus::Linked),
                    file(".zlogin", SymlinkStatus::Unlinked),
                ],
                true,
            )],
            unsupported: Vec::new(),
            missing: vec!["nope".to_string()],
        };

        insta::assert_snapshot!(render_text(&report), @r"
        zsh (partially symlinked):
          conflicting  .zprofile -> /home/me/.zprofile (a file is in the way)
          linked       .zshrc -> /home/me/.zshrc
          unlinked     .zlogin -> /home/me/.zlogin
        No such group:
          nope
        ");
    }

    #[test]
    fn empty_report_says_so() {
        assert_eq!(render_text(&StatusReport::default()), "No groups found\n");
    }

    #[test]
    fn build_report_classifies_live_files() {
        let tree = TestTree::new();
        let source = tree.config_file("zsh", ".zshrc", "");
        tree.config_file("zsh", ".zprofile", "");
        tree.config_file("git", ".gitconfig", "");
        tree.config_file("wintools_windows", "tool.ini", "");
        std::fs::write(tree.home_path(".zprofile"), "mine").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(&source, tree.home_path(".zshrc")).unwrap();
        let ctx = tree.context();

        let report = build_report(&ctx, &[]).unwrap();
        let names: Vec<_> = report.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["git", "zsh"]);
        assert_eq!(report.groups[0].status, GroupStatus::NotSymlinked);
        assert_eq!(report.groups[1].conflicts.len(), 1);
        assert!(report.groups.iter().all(|g| g.files.is_none()));
        assert_eq!(report.unsupported[0].name, "wintools");
    }

    #[test]
    fn build_report_details_named_groups() {
        let tree = TestTree::new();
        tree.config_file("zsh", ".zshrc", "");
        tree.config_file("git", ".gitconfig", "");
        tree.config_file("wintools_windows", "tool.ini", "");
        let ctx = tree.context();

        let names = vec!["zsh".to_string(), "nope".to_string(), "wintools".to_string()];
        let report = build_report(&ctx, &names).unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].files.as_ref().unwrap().len(), 1);
        assert_eq!(report.missing, ["nope"]);
        assert_eq!(report.unsupported[0].variants, ["wintools_windows"]);
    }

    #[test]
    fn json_report_is_tagged() {
        let report = StatusReport {
            groups: vec![group("zsh", vec![file(".zshrc", occupied())], true)],
            ..StatusReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["groups"][0]["status"], "not_symlinked");
        assert_eq!(json["groups"][0]["counts"]["conflicting"], 1);
        assert_eq!(json["groups"][0]["files"][0]["state"]["status"], "conflicting");
        assert_eq!(
            json["groups"][0]["files"][0]["state"]["conflict"]["kind"],
            "occupied"
        );
    }
}
