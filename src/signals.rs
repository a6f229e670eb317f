//! Process signals, recorded as flags and polled by the host between events

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SignalFlags {
    quit: Arc<AtomicBool>,
    activate: Arc<AtomicBool>,
}

impl SignalFlags {
    /// SIGINT/SIGTERM request a quit, SIGUSR1 re-activates the application
    pub fn register() -> Result<Self> {
        let flags = Self::default();

        #[cfg(unix)]
        {
            use anyhow::Context;
            use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1};

            for signal in [SIGINT, SIGTERM] {
                signal_hook::flag::register(signal, Arc::clone(&flags.quit))
                    .context(format!("Failed to register handler for signal {signal}"))?;
            }
            signal_hook::flag::register(SIGUSR1, Arc::clone(&flags.activate))
                .context("Failed to register handler for SIGUSR1")?;
        }

        Ok(flags)
    }

    /// True once per received quit signal batch
    pub fn take_quit(&self) -> bool {
        self.quit.swap(false, Ordering::SeqCst)
    }

    pub fn take_activate(&self) -> bool {
        self.activate.swap(false, Ordering::SeqCst)
    }
}
