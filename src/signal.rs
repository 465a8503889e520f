//! Signal monitor
//!
//! A dedicated thread consumes SIGINT for the whole process: one
//! interrupt kicks every connected client without stopping the server.
//! No other thread observes the signal; the iterator's handler is
//! process-global and delivery is serialized through its internal pipe.
//!
//! The Rust runtime already ignores SIGPIPE, so a write to a closed
//! client stream surfaces as an ordinary I/O error.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use signal_hook::consts::SIGINT;
use signal_hook::iterator::backend::Handle;
use signal_hook::iterator::Signals;

use crate::context::ServerContext;
use crate::error::Result;

/// Handle to the signal-monitor thread.
#[derive(Debug)]
pub struct SignalMonitor {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalMonitor {
    /// Install the SIGINT handler and start the monitor thread.
    pub fn start(ctx: Arc<ServerContext>) -> Result<Self> {
        let mut signals = Signals::new([SIGINT])?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("arbordb-signals".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    if signal == SIGINT {
                        tracing::info!("SIGINT received, cancelling all clients");
                        ctx.cancel_all_workers();
                    }
                }
            })?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// End the monitor: close the signal iterator and join the thread.
    /// Only the supervisor calls this, during final shutdown.
    pub fn stop(mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("signal monitor thread panicked");
            }
        }
    }
}
