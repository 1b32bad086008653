//! Command: `ls hooks|secrets|profiles`.
use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, Listing, LsOpts};
use crate::config::profiles::{self, ProfileEntry};
use crate::config::root::TreeKind;
use crate::config::selection::ConflictPolicy;
use crate::logging::{Log, Logger};
use crate::resources::hook::{self, Hook, HookPhase, of_phase};

/// Run `ls`.
///
/// # Errors
///
/// Returns an error if setup fails or the listed directory is missing.
pub fn run(
    global: &GlobalOpts,
    opts: &LsOpts,
    setup: &CommandSetup,
    log: &Arc<Logger>,
) -> Result<()> {
    let text = match opts.what {
        Listing::Profiles => render_profiles(&profiles::discover(setup.env.as_ref())),
        Listing::Hooks => {
            let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
            ctx.config.root.require(TreeKind::Hooks)?;
            let groups: Vec<(String, Vec<Hook>)> = ctx
                .config
                .table(TreeKind::Hooks)
                .groups()
                .map(|group| (group.name.clone(), hook::discover(group)))
                .collect();
            render_hooks(&groups)
        }
        Listing::Secrets => {
            let ctx = setup.context(global, ConflictPolicy::Skip, Arc::clone(log) as Arc<dyn Log>)?;
            ctx.config.root.require(TreeKind::Secrets)?;
            let groups: Vec<(String, usize)> = ctx
                .config
                .table(TreeKind::Secrets)
                .groups()
                .map(|group| (group.name.clone(), group.files.len()))
                .collect();
            render_secrets(&groups)
        }
    };

    let mut out = std::io::stdout().lock();
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(str::len).max().unwrap_or(0)
}

/// One line per hook group, listing its scripts by phase.
#[must_use]
pub fn render_hooks(groups: &[(String, Vec<Hook>)]) -> String {
    if groups.is_empty() {
        return "No hooks found\n".to_string();
    }
    let width = width(groups.iter().map(|(name, _)| name.as_str()));
    let mut out = String::new();
    for (name, hooks) in groups {
        let phases: Vec<String> = HookPhase::ALL
            .into_iter()
            .filter_map(|phase| {
                let names: Vec<String> = of_phase(hooks, phase).map(Hook::name).collect();
                (!names.is_empty()).then(|| format!("{phase}: {}", names.join(", ")))
            })
            .collect();
        let phases = if phases.is_empty() {
            "-".to_string()
        } else {
            phases.join("  ")
        };
        let _ = writeln!(out, "{name:<width$}  {phases}");
    }
    out
}

/// One line per secret group with its file count.
#[must_use]
pub fn render_secrets(groups: &[(String, usize)]) -> String {
    if groups.is_empty() {
        return "No secrets found\n".to_string();
    }
    let width = width(groups.iter().map(|(name, _)| name.as_str()));
    let mut out = String::new();
    for (name, count) in groups {
        let _ = writeln!(out, "{name:<width$}  {count} file(s)");
    }
    out
}

/// One line per profile with the root it lives in.
#[must_use]
pub fn render_profiles(entries: &[ProfileEntry]) -> String {
    if entries.is_empty() {
        return "No profiles found\n".to_string();
    }
    let label = |e: &ProfileEntry| e.name.clone().unwrap_or_else(|| "(default)".to_string());
    let labels: Vec<String> = entries.iter().map(label).collect();
    let width = width(labels.iter().map(String::as_str));
    let mut out = String::new();
    for (label, entry) in labels.iter().zip(entries) {
        let _ = writeln!(out, "{label:<width$}  {}", entry.path.display());
    }
    out
}
