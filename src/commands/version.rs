//! Command: print version information.
use std::io::Write as _;

use anyhow::Result;

/// Version string embedded by the build script, or the package version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("TUCKR_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the tuckr version to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run() -> Result<()> {
    writeln!(std::io::stdout().lock(), "tuckr {}", version())?;
    Ok(())
}
