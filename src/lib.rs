//! Symlink-farm dotfiles manager.
//!
//! A dotfiles repository holds `Configs/`, `Hooks/` and `Secrets/`, each
//! split into groups. A group directory may carry a suffix (`zsh_linux`,
//! `git_#work`) restricting it to a platform or a custom target; the
//! variants that apply to this host are merged and their files are symlinked
//! into the target directory.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: scan the repository, resolve groups and deployment paths
//! - **[`resources`]**: filesystem primitives (symlinks, hooks, secrets)
//! - **[`tasks`]**: per-group units of work and group selection
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod interrupt;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod tasks;
