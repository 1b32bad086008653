//! Shared execution context for group tasks.
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::config::env::Environment;
use crate::config::selection::{ConflictPolicy, SelectionContext};
use crate::exec::Executor;
use crate::interrupt::Interrupt;
use crate::logging::Log;
use crate::platform::Platform;

/// Everything a task needs: the scanned tree, the immutable selection
/// context and the injected services.
pub struct Context {
    /// The resolved dotfiles tree.
    pub config: Arc<Config>,
    /// Profile, targets, dry-run flag and conflict policy.
    pub selection: Arc<SelectionContext>,
    /// Logger for output and group recording.
    pub log: Arc<dyn Log>,
    /// Environment used by the path resolver.
    pub env: Arc<dyn Environment>,
    /// Runs hook scripts and the cipher.
    pub executor: Arc<dyn Executor>,
    /// Whether to process the files of a group in parallel using Rayon.
    pub parallel: bool,
    /// Raised by Ctrl-C; no new group starts once it is set.
    pub interrupt: Interrupt,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.config.root.path())
            .field("selection", &self.selection)
            .field("log", &"<dyn Log>")
            .field("env", &self.env)
            .field("executor", &self.executor)
            .field("parallel", &self.parallel)
            .field("interrupt", &self.interrupt)
            .finish()
    }
}

impl Context {
    /// Create a context with a fresh interrupt flag.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        selection: Arc<SelectionContext>,
        log: Arc<dyn Log>,
        env: Arc<dyn Environment>,
        executor: Arc<dyn Executor>,
        parallel: bool,
    ) -> Self {
        Self {
            config,
            selection,
            log,
            env,
            executor,
            parallel,
            interrupt: Interrupt::new(),
        }
    }

    /// Whether mutations are only simulated.
    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.selection.dry_run
    }

    /// Conflict handling for this run.
    #[must_use]
    pub fn policy(&self) -> ConflictPolicy {
        self.selection.policy
    }

    /// Base directory for unmarked logical paths.
    #[must_use]
    pub fn target_base(&self) -> &Path {
        &self.selection.target_base
    }

    /// Host platform.
    #[must_use]
    pub fn platform(&self) -> &Platform {
        &self.selection.platform
    }

    /// Create a copy of this context with a different logger.
    ///
    /// Everything else is shared by reference. The parallel scheduler uses
    /// this to give each group its own buffered logger.
    #[must_use]
    pub fn with_log(&self, log: Arc<dyn Log>) -> Self {
        Self {
            config: Arc::clone(&self.config),
            selection: Arc::clone(&self.selection),
            log,
            env: Arc::clone(&self.env),
            executor: Arc::clone(&self.executor),
            parallel: self.parallel,
            interrupt: self.interrupt.clone(),
        }
    }

    /// Use `interrupt` instead of this context's own flag.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::{RecordingLog, TestTree};

    #[test]
    fn with_log_preserves_other_fields() {
        let tree = TestTree::new();
        let ctx = tree.context();
        let ctx2 = ctx.with_log(Arc::new(RecordingLog::default()));
        assert_eq!(ctx2.target_base(), ctx.target_base());
        assert_eq!(ctx2.dry_run(), ctx.dry_run());
        assert_eq!(ctx2.parallel, ctx.parallel);
        assert!(Arc::ptr_eq(&ctx2.config, &ctx.config));
    }

    #[test]
    fn with_log_shares_the_interrupt_flag() {
        let tree = TestTree::new();
        let ctx = tree.context();
        let ctx2 = ctx.with_log(Arc::new(RecordingLog::default()));
        ctx.interrupt.request();
        assert!(ctx2.interrupt.is_requested());
    }

    #[test]
    fn debug_format_includes_key_fields() {
        let tree = TestTree::new();
        let debug = format!("{:?}", tree.context());
        assert!(debug.contains("Context"));
        assert!(debug.contains("dry_run"));
        assert!(debug.contains("target_base"));
    }
}
