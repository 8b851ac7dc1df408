//! Process state shared with the Ctrl+C handler.
//!
//! Only one flag lives here: `SHUTDOWN`. Build mode and configuration are
//! passed explicitly, never read from globals.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Watch loop is running (Ctrl+C should stop it instead of exiting)
static WATCHING: AtomicBool = AtomicBool::new(false);

/// Setup the global Ctrl+C handler. Call once at program start
///
/// - Outside watch mode: exit immediately, partial output stays on disk
/// - In watch mode: set the flag so the loop and running stages wind down
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if WATCHING.load(Ordering::SeqCst) {
            crate::log!("watch"; "shutting down...");
        } else {
            std::process::exit(130);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Mark the watch loop as running
pub fn set_watching(watching: bool) {
    WATCHING.store(watching, Ordering::SeqCst);
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering for performance - worst case is processing
/// a few more files before stopping, which is acceptable
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag_default() {
        assert!(!is_shutdown());
    }

    #[test]
    fn test_watching_toggle() {
        set_watching(true);
        assert!(WATCHING.load(Ordering::SeqCst));
        set_watching(false);
        assert!(!WATCHING.load(Ordering::SeqCst));
    }
}
