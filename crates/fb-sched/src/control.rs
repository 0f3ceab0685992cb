//! Cooperative stop and pause flags.
//!
//! Flags are polled, never waited on: stop after every block settles inside a
//! pass, pause between iterations. Clones share the same flags so a host
//! thread can hold one while the run holds another.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct RunControl {
    stop: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }

    pub fn pause_requested(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }

    /// Clear both flags before reusing the control for another run.
    pub fn reset(&self) {
        self.stop.store(false, Ordering::SeqCst);
        self.pause.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_flags() {
        let a = RunControl::new();
        let b = a.clone();
        b.request_stop();
        a.request_pause();
        assert!(a.stop_requested());
        assert!(b.pause_requested());
        b.resume();
        assert!(!a.pause_requested());
        a.reset();
        assert!(!b.stop_requested());
    }
}
