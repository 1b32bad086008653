//! Process environment access.
//!
//! Every component that reads an environment variable or a well-known
//! directory goes through [`Environment`], so resolution can be tested
//! against a fixed [`StaticEnvironment`] instead of the real process.
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Read-only view of the process environment.
pub trait Environment: Send + Sync + fmt::Debug {
    /// Value of `key`, `None` when unset or empty.
    fn var(&self, key: &str) -> Option<String>;

    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// The platform configuration directory (`~/.config`, `%APPDATA%`, ...).
    fn config_dir(&self) -> Option<PathBuf>;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        dirs::config_dir()
    }
}

/// A fixed environment, built up explicitly.
///
/// ```
/// use tuckr_cli::config::env::{Environment, StaticEnvironment};
///
/// let env = StaticEnvironment::new()
///     .with_home("/home/me")
///     .with_var("EDITOR", "nvim")
///     .with_var("EMPTY", "");
/// assert_eq!(env.var("EDITOR").as_deref(), Some("nvim"));
/// assert_eq!(env.var("EMPTY"), None);
/// assert_eq!(env.config_dir(), None);
/// ```
#[derive(Debug, Default, Clone)]
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl StaticEnvironment {
    /// An environment with no variables and no known directories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set the home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Set the configuration directory.
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config = Some(dir.into());
        self
    }
}

impl Environment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config.clone()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn static_environment_is_empty_by_default() {
        let env = StaticEnvironment::new();
        assert_eq!(env.var("HOME"), None);
        assert_eq!(env.home_dir(), None);
    }

    #[test]
    fn static_environment_overrides_later_values() {
        let env = StaticEnvironment::new()
            .with_var("A", "1")
            .with_var("A", "2");
        assert_eq!(env.var("A").as_deref(), Some("2"));
    }

    #[test]
    fn system_environment_treats_missing_as_none() {
        assert_eq!(
            SystemEnvironment.var("TUCKR_TEST_SURELY_UNSET_VARIABLE_42"),
            None
        );
    }
}
