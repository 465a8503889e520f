//! Client worker
//!
//! One thread per connection. The lifecycle: admit, register in the
//! roster, run the serve loop, clean up. Cleanup (unregistration and the
//! counter decrement behind it) runs exactly once on every exit path:
//! EOF, stream error, or cancellation.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;

use crate::context::ServerContext;
use crate::protocol::interpret_command;
use crate::sync::CancelToken;

/// Admission entry: take ownership of an accepted stream and spawn its
/// worker thread.
pub fn admit(ctx: Arc<ServerContext>, stream: TcpStream) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let spawned = thread::Builder::new()
        .name(format!("arbordb-client-{peer}"))
        .spawn(move || run_client(ctx, stream));
    if let Err(error) = spawned {
        tracing::error!(%error, %peer, "failed to spawn client worker");
    }
}

fn run_client(ctx: Arc<ServerContext>, stream: TcpStream) {
    let token = CancelToken::new();
    let handle = match ctx.roster.try_register(&stream, token.clone()) {
        Some(handle) => handle,
        None => {
            // Server closed: drop the stream and exit without registering.
            tracing::debug!("server closed, refusing connection");
            return;
        }
    };

    serve(&ctx, &token, &stream);

    ctx.roster.unregister(handle.id());
    tracing::debug!(id = handle.id(), "client disconnected");
}

/// The serve loop: read one command line, pass the gate, interpret, write
/// the response. Every arm that fails falls out of the loop into cleanup.
fn serve(ctx: &ServerContext, token: &CancelToken, stream: &TcpStream) {
    let mut reader = BufReader::new(stream);
    let mut writer = stream;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(%error, "client read failed");
                break;
            }
        }

        // Cancellation points: after the blocking read, and inside the
        // gate wait. No tree lock is held at either.
        if token.is_cancelled() {
            break;
        }
        if ctx.gate.wait(token).is_err() {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let mut response = match interpret_command(&ctx.tree, token, line.trim_end()) {
            Ok(response) => response,
            Err(_) => break,
        };
        response.push('\n');

        if let Err(error) = writer.write_all(response.as_bytes()) {
            tracing::debug!(%error, "client write failed");
            break;
        }
    }
}
