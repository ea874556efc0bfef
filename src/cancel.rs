//! Interrupt-driven cancellation for playback.
//!
//! The player polls a [`CancelToken`] once per scheduling iteration and leaves
//! through its normal teardown path, so the terminal is restored the same way
//! whether playback finished or was interrupted.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag on SIGINT (Ctrl+C) or SIGTERM.
    #[cfg(unix)]
    pub fn install_signal_handlers(&self) -> io::Result<()> {
        use signal_hook::consts::signal::{SIGINT, SIGTERM};

        signal_hook::flag::register(SIGINT, Arc::clone(&self.flag))?;
        signal_hook::flag::register(SIGTERM, Arc::clone(&self.flag))?;
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn install_signal_handlers(&self) -> io::Result<()> {
        Ok(())
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}
