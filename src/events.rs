//! Signal-driven process events.
//!
//! Signals are caught by `signal-hook` and land in atomic flags.  The main
//! loop polls the flags once per cycle, so no control code ever runs in
//! signal context.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────┐
//! │ SIGTERM/INT  │────▶│ terminate     │     │              │
//! │ SIGUSR1      │────▶│ reload        │────▶│  Main Loop   │
//! │ SIGUSR2/HUP  │────▶│ ignored (log) │     │  (poller)    │
//! └──────────────┘     └───────────────┘     └──────────────┘
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::info;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook::flag;

/// Granularity of [`SignalFlags::sleep`].
const SLEEP_SLICE: Duration = Duration::from_millis(200);

/// What the main loop should do after polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pending {
    pub terminate: bool,
    pub reload: bool,
}

#[derive(Debug, Default)]
pub struct SignalFlags {
    terminate: Arc<AtomicBool>,
    reload: Arc<AtomicBool>,
    ignored: Arc<AtomicBool>,
}

impl SignalFlags {
    /// Install handlers for every signal the daemon reacts to.
    pub fn register() -> io::Result<Self> {
        let flags = Self::default();
        flag::register(SIGTERM, Arc::clone(&flags.terminate))?;
        flag::register(SIGINT, Arc::clone(&flags.terminate))?;
        flag::register(SIGUSR1, Arc::clone(&flags.reload))?;
        flag::register(SIGUSR2, Arc::clone(&flags.ignored))?;
        flag::register(SIGHUP, Arc::clone(&flags.ignored))?;
        Ok(flags)
    }

    /// Read and clear the one-shot flags.  `terminate` is sticky.
    pub fn poll(&self) -> Pending {
        if self.ignored.swap(false, Ordering::AcqRel) {
            info!("INFO: signal SIGUSR2/SIGHUP caught, not implemented, continuing");
        }
        let pending = Pending {
            terminate: self.terminate.load(Ordering::Acquire),
            reload: self.reload.swap(false, Ordering::AcqRel),
        };
        if pending.reload {
            info!("INFO: signal SIGUSR1 caught, re-reading config");
        }
        pending
    }

    pub fn terminating(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    /// Request shutdown from inside the process.
    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::Release);
    }

    /// Sleep for `duration`, returning early once termination is requested.
    pub fn sleep(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.terminating() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}
