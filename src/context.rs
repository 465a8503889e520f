//! Shared server state
//!
//! The process-lifetime singletons (tree, gate, roster, counter) live in
//! one `ServerContext` constructed at supervisor startup and passed
//! explicitly to every thread that needs them.

use std::sync::Arc;

use crate::roster::Roster;
use crate::sync::{Gate, WorkerCounter};
use crate::tree::Tree;

/// Everything shared between the supervisor, the listener, the signal
/// monitor, and the client workers.
#[derive(Debug)]
pub struct ServerContext {
    pub tree: Tree,
    pub gate: Gate,
    pub counter: Arc<WorkerCounter>,
    pub roster: Roster,
}

impl ServerContext {
    pub fn new() -> Arc<Self> {
        let counter = Arc::new(WorkerCounter::new());
        Arc::new(Self {
            tree: Tree::new(),
            gate: Gate::new(),
            roster: Roster::new(Arc::clone(&counter)),
            counter,
        })
    }

    /// Cancel every registered worker and rouse the gate so workers
    /// parked there observe their tokens. Leaves the roster's open flag
    /// alone: an interrupt kicks all clients, it does not stop the server
    /// from accepting new ones.
    pub fn cancel_all_workers(&self) {
        self.roster.cancel_all();
        self.gate.rouse();
    }
}
