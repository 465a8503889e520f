//! Supervisor
//!
//! The main thread's job after startup: run the admin loop on standard
//! input until EOF, then drive the shutdown sequence. Admin commands:
//!
//! - `s`: stop all clients at their next gate check
//! - `g`: release all clients
//! - `p [path]`: print the tree to stdout or to a truncated file
//!
//! The shutdown order matters: close the roster so nothing new registers,
//! cancel everyone, wait for the worker count to drain (only then does
//! the tree have no lock holders), then tear down the signal monitor, the
//! tree contents, and the listener.

use std::fs::File;
use std::io::{self, BufRead};
use std::sync::Arc;

use crate::config::Config;
use crate::context::ServerContext;
use crate::error::Result;
use crate::network::Listener;
use crate::signal::SignalMonitor;

/// Process-level coordinator for one server instance.
pub struct Supervisor {
    config: Config,
    ctx: Arc<ServerContext>,
}

impl Supervisor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ctx: ServerContext::new(),
        }
    }

    /// Run until EOF on standard input, then shut down. Blocking.
    pub fn run(&self) -> Result<()> {
        self.ctx.roster.open();
        let monitor = SignalMonitor::start(Arc::clone(&self.ctx))?;
        let listener = Listener::start(&self.config, Arc::clone(&self.ctx))?;

        self.admin_loop();
        self.shutdown(monitor, listener);
        Ok(())
    }

    fn admin_loop(&self) {
        let stdin = io::stdin();
        let mut line = String::new();

        loop {
            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => return, // EOF: shut down
                Ok(_) => {}
                Err(error) => {
                    tracing::error!(%error, "admin input failed, shutting down");
                    return;
                }
            }

            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("s") => {
                    tracing::info!("stopping all clients");
                    self.ctx.gate.stop();
                }
                Some("g") => {
                    tracing::info!("releasing all clients");
                    self.ctx.gate.release();
                }
                Some("p") => {
                    if let Err(error) = self.print_tree(tokens.next()) {
                        tracing::error!(%error, "print failed");
                    }
                }
                _ => {}
            }
        }
    }

    fn print_tree(&self, path: Option<&str>) -> Result<()> {
        match path {
            None => {
                let stdout = io::stdout();
                self.ctx.tree.print(&mut stdout.lock())?;
            }
            Some(path) => {
                let mut file = File::create(path)?;
                self.ctx.tree.print(&mut file)?;
            }
        }
        Ok(())
    }

    fn shutdown(&self, monitor: SignalMonitor, listener: Listener) {
        tracing::info!("admin EOF, shutting down");

        // No new registrations, then cancel everyone already in.
        self.ctx.roster.close();
        self.ctx.cancel_all_workers();

        // Workers unregister on their way out; once the count drains the
        // tree has no lock holders.
        self.ctx.counter.wait_idle();

        monitor.stop();
        self.ctx.tree.cleanup();
        listener.stop();

        tracing::info!("exiting database");
    }
}
