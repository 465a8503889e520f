//! Stop/go gate for client workers
//!
//! The supervisor's `s` command parks every worker at its next gate check;
//! `g` lets them all through again. Workers consult the gate exactly once
//! per serve iteration, after reading a command and before executing it,
//! and never while holding a tree lock.

use parking_lot::{Condvar, Mutex};

use super::{CancelToken, Cancelled};

/// Global pause/resume barrier.
#[derive(Debug, Default)]
pub struct Gate {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block while the gate is stopped.
    ///
    /// Returns `Err(Cancelled)` if the worker's token fired while it was
    /// parked here. The mutex guard is released on every exit path.
    pub fn wait(&self, token: &CancelToken) -> Result<(), Cancelled> {
        let mut stopped = self.stopped.lock();
        while *stopped {
            if token.is_cancelled() {
                return Err(Cancelled);
            }
            self.cond.wait(&mut stopped);
        }
        drop(stopped);

        if token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Park workers at their next gate check. Does not wake anyone.
    pub fn stop(&self) {
        *self.stopped.lock() = true;
    }

    /// Let all parked workers through and stop parking new arrivals.
    pub fn release(&self) {
        let mut stopped = self.stopped.lock();
        *stopped = false;
        self.cond.notify_all();
    }

    /// Wake all parked workers without changing the gate state, so that
    /// cancelled workers can observe their tokens and exit.
    pub fn rouse(&self) {
        let _stopped = self.stopped.lock();
        self.cond.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_open_gate_passes_immediately() {
        let gate = Gate::new();
        let token = CancelToken::new();
        assert_eq!(gate.wait(&token), Ok(()));
    }

    #[test]
    fn test_cancelled_token_fails_even_when_open() {
        let gate = Gate::new();
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(gate.wait(&token), Err(Cancelled));
    }

    #[test]
    fn test_stop_parks_until_release() {
        let gate = Arc::new(Gate::new());
        gate.stop();

        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait(&CancelToken::new()))
        };

        // The waiter should still be parked after a settle window.
        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());

        gate.release();
        assert_eq!(waiter.join().unwrap(), Ok(()));
    }

    #[test]
    fn test_rouse_wakes_cancelled_waiter() {
        let gate = Arc::new(Gate::new());
        let token = CancelToken::new();
        gate.stop();

        let waiter = {
            let gate = Arc::clone(&gate);
            let token = token.clone();
            thread::spawn(move || gate.wait(&token))
        };

        thread::sleep(Duration::from_millis(50));
        token.cancel();
        gate.rouse();

        // Gate stays stopped; only the cancelled waiter gets out.
        assert_eq!(waiter.join().unwrap(), Err(Cancelled));
        assert!(gate.is_stopped());
    }
}
