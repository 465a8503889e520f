//! TCP listener
//!
//! Owns the bound socket on a dedicated thread and hands every accepted
//! stream to the admission entry. The socket is non-blocking so the loop
//! can poll its shutdown flag between accepts.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::Config;
use crate::context::ServerContext;
use crate::error::{DbError, Result};
use crate::network::worker;

/// Handle to the accept-loop thread.
#[derive(Debug)]
pub struct Listener {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind and start accepting.
    pub fn start(config: &Config, ctx: Arc<ServerContext>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            DbError::Network(format!("failed to bind to {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        tracing::info!("listening on {local_addr}");

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let max_connections = config.max_connections;
        let poll = Duration::from_millis(config.accept_poll_ms);

        let handle = thread::Builder::new()
            .name("arbordb-listener".to_string())
            .spawn(move || accept_loop(listener, ctx, flag, max_connections, poll))
            .map_err(|e| DbError::Network(format!("failed to spawn listener: {e}")))?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
            local_addr,
        })
    }

    /// The address actually bound, useful when the config asked for port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and join the thread.
    pub fn stop(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("listener thread panicked");
            }
        }
    }
}

fn accept_loop(
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    shutdown: Arc<AtomicBool>,
    max_connections: usize,
    poll: Duration,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                let current = ctx.counter.active();
                if current >= max_connections {
                    tracing::warn!(
                        "connection limit reached ({current}/{max_connections}), rejecting {addr}"
                    );
                    drop(stream);
                    continue;
                }

                tracing::debug!("accepted connection from {addr}");
                accept_stream(&ctx, stream);
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(poll);
            }
            Err(e) => {
                if !shutdown.load(Ordering::Relaxed) {
                    tracing::error!("accept error: {e}");
                }
            }
        }
    }
    tracing::debug!("listener stopped");
}

fn accept_stream(ctx: &Arc<ServerContext>, stream: TcpStream) {
    // The accept loop left the socket non-blocking; workers do blocking
    // reads.
    if let Err(error) = stream.set_nonblocking(false) {
        tracing::error!(%error, "failed to reset stream to blocking, dropping");
        return;
    }
    worker::admit(Arc::clone(ctx), stream);
}
