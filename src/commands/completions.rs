//! Command: `completions`.
use std::io::Write;

use anyhow::Result;
use clap::CommandFactory as _;

use crate::cli::{Cli, CompletionsOpts};

/// Write the completion script for `opts.shell` to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run(opts: &CompletionsOpts) -> Result<()> {
    let mut out = std::io::stdout().lock();
    write_completions(opts.shell, &mut out);
    out.flush()?;
    Ok(())
}

/// Generate the completion script for `shell` into `out`.
pub fn write_completions(shell: clap_complete::Shell, out: &mut dyn Write) {
    clap_complete::generate(shell, &mut Cli::command(), "tuckr", out);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bash_completion_lists_subcommands() {
        let mut buf = Vec::new();
        write_completions(clap_complete::Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("tuckr"));
        assert!(script.contains("groupis"));
    }
}
