//! # arbordb
//!
//! A multi-client, in-memory key/value store with:
//! - Fine-grained per-node reader/writer locking (hand-over-hand coupling)
//! - One worker thread per TCP connection
//! - Stop/go gating and cooperative cancellation of all clients
//! - Orderly shutdown that drains every lock holder first
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Listener                            │
//! │              (accept → admit one worker/conn)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Client Workers                            │
//! │        read line → gate → interpret → write response         │
//! └───────┬──────────────────────┬──────────────────────────────┘
//!         │                      │
//!         ▼                      ▼
//!   ┌───────────┐          ┌───────────┐       ┌──────────────┐
//!   │   Roster  │          │    Tree   │       │  Supervisor  │
//!   │ (handles) │          │ (RwLocks) │◀──────│ (stdin REPL) │
//!   └─────▲─────┘          └───────────┘       └──────────────┘
//!         │
//!   ┌─────┴─────────┐
//!   │ Signal Monitor│  SIGINT → cancel all clients
//!   └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod context;
pub mod network;
pub mod protocol;
pub mod roster;
pub mod signal;
pub mod supervisor;
pub mod sync;
pub mod tree;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use context::ServerContext;
pub use error::{DbError, Result};
pub use supervisor::Supervisor;
pub use tree::Tree;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of arbordb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
