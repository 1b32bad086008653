//! Command-line interface definitions (clap derive).
//!
//! Argument parsing only; every subcommand is carried out by the matching
//! module under [`crate::commands`].
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI entry point for tuckr.
#[derive(Parser, Debug)]
#[command(
    name = "tuckr",
    about = "Symlink-farm dotfiles manager with conditional groups and hooks",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Use the dotfiles_<PROFILE> repository
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Custom targets to enable, highest priority first (group_#target)
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Preview changes without applying
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Disable parallel processing of groups and files (parallel is enabled by default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Symlink groups into the target directory
    Add(LinkOpts),
    /// Remove the symlinks of groups
    Rm(UnlinkOpts),
    /// Run pre hooks, symlink, then run post hooks
    Set(LinkOpts),
    /// Run cleanup hooks, then remove symlinks
    Unset(UnlinkOpts),
    /// Show the symlink status of groups
    Status(StatusOpts),
    /// Encrypt files into a group under Secrets/
    Encrypt(EncryptOpts),
    /// Decrypt groups from Secrets/ to their deployment paths
    Decrypt(UnlinkOpts),
    /// Copy files into a group under Configs/
    Push(PushOpts),
    /// Delete groups from Configs/
    Pop(PopOpts),
    /// List hooks, secrets or profiles
    Ls(LsOpts),
    /// Create the dotfiles directory structure
    Init,
    /// Print the group a deployed path belongs to
    Groupis(GroupisOpts),
    /// Generate shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Subcommand name, used to name the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Rm(_) => "rm",
            Self::Set(_) => "set",
            Self::Unset(_) => "unset",
            Self::Status(_) => "status",
            Self::Encrypt(_) => "encrypt",
            Self::Decrypt(_) => "decrypt",
            Self::Push(_) => "push",
            Self::Pop(_) => "pop",
            Self::Ls(_) => "ls",
            Self::Init => "init",
            Self::Groupis(_) => "groupis",
            Self::Completions(_) => "completions",
            Self::Version => "version",
        }
    }
}

/// Options for `add` and `set`.
#[derive(Parser, Debug, Clone)]
pub struct LinkOpts {
    /// Groups to process; `*` selects every group that needs it
    #[arg(required = true)]
    pub groups: Vec<String>,

    /// Groups to leave out
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Replace conflicting files with symlinks
    #[arg(short, long, conflicts_with = "adopt")]
    pub force: bool,

    /// Move conflicting files into the repository, then symlink them
    #[arg(short, long)]
    pub adopt: bool,

    /// Do not ask for confirmation
    #[arg(short = 'y', long = "yes")]
    pub assume_yes: bool,
}

/// Options for `rm`, `unset` and `decrypt`.
#[derive(Parser, Debug, Clone)]
pub struct UnlinkOpts {
    /// Groups to process; `*` selects every group that needs it
    #[arg(required = true)]
    pub groups: Vec<String>,

    /// Groups to leave out
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Vec<String>,
}

/// Options for `status`.
#[derive(Parser, Debug, Clone)]
pub struct StatusOpts {
    /// Groups to show file by file (all groups when empty)
    pub groups: Vec<String>,

    /// Print a machine-readable report
    #[arg(long)]
    pub json: bool,
}

/// Options for `encrypt`.
#[derive(Parser, Debug, Clone)]
pub struct EncryptOpts {
    /// Secrets group to store the files in
    pub group: String,

    /// Files to encrypt
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Options for `push`.
#[derive(Parser, Debug, Clone)]
pub struct PushOpts {
    /// Group to copy the files into
    pub group: String,

    /// Files to copy
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Do not ask before overwriting files in the repository
    #[arg(short = 'y', long = "yes")]
    pub assume_yes: bool,
}

/// Options for `pop`.
#[derive(Parser, Debug, Clone)]
pub struct PopOpts {
    /// Groups to delete
    #[arg(required = true)]
    pub groups: Vec<String>,

    /// Do not ask for confirmation
    #[arg(short = 'y', long = "yes")]
    pub assume_yes: bool,
}

/// What `ls` lists.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Hook scripts per group and phase
    Hooks,
    /// Secret groups
    Secrets,
    /// Dotfiles repositories per profile
    Profiles,
}

/// Options for `ls`.
#[derive(Parser, Debug, Clone)]
pub struct LsOpts {
    /// What to list
    #[arg(value_enum)]
    pub what: Listing,
}

/// Options for `groupis`.
#[derive(Parser, Debug, Clone)]
pub struct GroupisOpts {
    /// Deployed paths, or paths inside Configs/
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Options for `completions`.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsOpts {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_add_with_profile() {
        let cli = Cli::parse_from(["tuckr", "--profile", "work", "add", "zsh"]);
        assert_eq!(cli.global.profile, Some("work".to_string()));
        assert!(matches!(cli.command, Command::Add(_)));
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["tuckr", "add", "zsh", "-p", "work", "-n", "-v"]);
        assert_eq!(cli.global.profile, Some("work".to_string()));
        assert!(cli.global.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn parallel_is_default() {
        let cli = Cli::parse_from(["tuckr", "rm", "*"]);
        assert!(cli.global.parallel);
        let cli = Cli::parse_from(["tuckr", "--no-parallel", "rm", "*"]);
        assert!(!cli.global.parallel);
    }

    #[test]
    fn parse_targets_comma_delimited() {
        let cli = Cli::parse_from(["tuckr", "-t", "work,laptop", "status"]);
        assert_eq!(cli.global.targets, vec!["work", "laptop"]);
    }

    #[test]
    fn parse_add_with_exclude_and_force() {
        let cli = Cli::parse_from(["tuckr", "add", "*", "nvim", "-e", "zsh,git", "-f", "-y"]);
        assert!(
            matches!(&cli.command, Command::Add(_)),
            "Expected Add command"
        );
        if let Command::Add(opts) = cli.command {
            assert_eq!(opts.groups, vec!["*", "nvim"]);
            assert_eq!(opts.exclude, vec!["zsh", "git"]);
            assert!(opts.force);
            assert!(!opts.adopt);
            assert!(opts.assume_yes);
        }
    }

    #[test]
    fn force_and_adopt_conflict() {
        let result = Cli::try_parse_from(["tuckr", "add", "zsh", "-f", "-a"]);
        assert!(result.is_err());
    }

    #[test]
    fn add_requires_a_group() {
        assert!(Cli::try_parse_from(["tuckr", "add"]).is_err());
        assert!(Cli::try_parse_from(["tuckr", "pop"]).is_err());
    }

    #[test]
    fn status_groups_are_optional() {
        let cli = Cli::parse_from(["tuckr", "status", "--json"]);
        assert!(matches!(&cli.command, Command::Status(o) if o.json && o.groups.is_empty()));
    }

    #[test]
    fn parse_encrypt() {
        let cli = Cli::parse_from(["tuckr", "encrypt", "ssh", "/home/me/.ssh/config"]);
        assert!(matches!(
            &cli.command,
            Command::Encrypt(o) if o.group == "ssh" && o.files == [PathBuf::from("/home/me/.ssh/config")]
        ));
    }

    #[test]
    fn parse_ls() {
        let cli = Cli::parse_from(["tuckr", "ls", "hooks"]);
        assert!(matches!(&cli.command, Command::Ls(o) if o.what == Listing::Hooks));
        assert!(Cli::try_parse_from(["tuckr", "ls", "things"]).is_err());
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["tuckr", "completions", "zsh"]);
        assert!(matches!(
            &cli.command,
            Command::Completions(o) if o.shell == clap_complete::Shell::Zsh
        ));
    }

    #[test]
    fn command_names_match_subcommands() {
        let cli = Cli::parse_from(["tuckr", "groupis", "/home/me/.zshrc"]);
        assert_eq!(cli.command.name(), "groupis");
        let cli = Cli::parse_from(["tuckr", "version"]);
        assert_eq!(cli.command.name(), "version");
    }
}
