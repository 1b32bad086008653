//! Placeholders for requested groups that cannot be processed, so they show
//! up in the run summary next to the groups that were.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::error::ResolutionError;

/// A requested group that does not exist.
#[derive(Debug)]
pub struct MissingGroup {
    name: String,
    error: ResolutionError,
}

impl MissingGroup {
    /// Wrap the resolution error reported for a requested group.
    #[must_use]
    pub fn new(error: ResolutionError) -> Self {
        let name = match &error {
            ResolutionError::NoSuchGroup { group }
            | ResolutionError::InvalidGroupName { group, .. } => group.clone(),
            other => other.to_string(),
        };
        Self { name, error }
    }
}

impl Task for MissingGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, _ctx: &Context) -> Result<TaskResult> {
        Err(self.error.clone().into())
    }
}

/// A requested group whose variants all target other platforms.
#[derive(Debug)]
pub struct UnsupportedGroup {
    name: String,
    variants: Vec<String>,
}

impl UnsupportedGroup {
    /// `variants` are the directory names that exist for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, variants: Vec<String>) -> Self {
        Self {
            name: name.into(),
            variants,
        }
    }
}

impl Task for UnsupportedGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        ctx.log.debug(&format!("variants: {}", self.variants.join(", ")));
        Ok(TaskResult::Skipped("not supported on this platform".to_string()))
    }
}
