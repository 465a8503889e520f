//! Live-worker counter
//!
//! Tracks how many client workers are currently registered. Shutdown
//! waits here until the count drains to zero; that is the only moment at
//! which the tree is guaranteed to have no lock holders.

use parking_lot::{Condvar, Mutex};

/// Count of live worker threads with a condvar broadcast at zero.
#[derive(Debug, Default)]
pub struct WorkerCounter {
    active: Mutex<usize>,
    idle: Condvar,
}

impl WorkerCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        *self.active.lock() += 1;
    }

    /// Decrement the count, broadcasting when it reaches zero.
    pub fn decrement(&self) {
        let mut active = self.active.lock();
        debug_assert!(*active > 0, "worker counter underflow");
        *active -= 1;
        if *active == 0 {
            self.idle.notify_all();
        }
    }

    /// Block until the count reaches zero.
    pub fn wait_idle(&self) {
        let mut active = self.active.lock();
        while *active > 0 {
            self.idle.wait(&mut active);
        }
    }

    pub fn active(&self) -> usize {
        *self.active.lock()
    }
}
