//! Signal handling for graceful shutdown.
//!
//! Centralized Ctrl+C handling for the DejaText application. An `AtomicBool`
//! flag is shared across threads to signal when shutdown has been requested;
//! the fuzzy matching stage polls it between comparison batches.
//!
//! When a signal is received the flag is set, a short message is printed to
//! stderr, and the application exits with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Centralized shutdown handler for graceful application termination.
///
/// Wraps an `AtomicBool` flag that is set when a Ctrl+C signal is received.
/// The flag can be shared with worker threads to enable coordinated shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a new shutdown handler with the flag initially set to `false`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get a clone of the shutdown flag for passing to worker threads.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the Ctrl+C handler and return the shared shutdown handler.
///
/// # Errors
///
/// Returns an error if a signal handler is already installed for this
/// process (ctrlc only allows one handler).
pub fn install_handler() -> Result<ShutdownHandler, ctrlc::Error> {
    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    ctrlc::set_handler(move || {
        // First signal: request graceful shutdown. Second signal: hard exit.
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        let _ = writeln!(std::io::stderr(), "Interrupted. Cleaning up...");
    })?;

    Ok(handler)
}
