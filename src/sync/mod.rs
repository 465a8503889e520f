//! Synchronization Module
//!
//! The coordination primitives shared between worker threads and the
//! supervisor:
//! - `CancelToken`: cooperative cancellation flag checked at defined points
//! - `Gate`: global stop/go barrier consulted once per serve iteration
//! - `WorkerCounter`: live-worker count the shutdown path waits on

mod cancel;
mod counter;
mod gate;

pub use cancel::{CancelToken, Cancelled};
pub use counter::WorkerCounter;
pub use gate::Gate;
