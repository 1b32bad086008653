//! Ctrl-C handling.
//!
//! The first interrupt lets the groups already running finish and stops new
//! ones from starting; a second one exits immediately.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

/// Exit status used when a second interrupt forces an immediate exit.
const FORCED_EXIT: i32 = 130;

/// Shared "stop starting new work" flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    requested: Arc<AtomicBool>,
}

impl Interrupt {
    /// A flag that nothing has raised yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag when the user presses Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler is already installed for this process.
    pub fn install(&self) -> Result<()> {
        let requested = Arc::clone(&self.requested);
        ctrlc::set_handler(move || {
            if requested.swap(true, Ordering::SeqCst) {
                std::process::exit(FORCED_EXIT);
            }
            tracing::warn!("interrupted; finishing the groups in progress (press Ctrl-C again to abort)");
        })
        .context("installing the Ctrl-C handler")
    }

    /// Raise the flag.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Whether new work should not be started.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}
