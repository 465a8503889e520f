//! Server Tests
//!
//! End-to-end tests over real sockets: worker lifecycle, stop/go gating,
//! cancel-all, and the shutdown sequence.

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use arbordb::network::Listener;
use arbordb::{Config, ServerContext};

// =============================================================================
// Helpers
// =============================================================================

fn start_server() -> (Arc<ServerContext>, Listener) {
    let ctx = ServerContext::new();
    ctx.roster.open();
    let config = Config::builder().listen_addr("127.0.0.1:0").build();
    let listener = Listener::start(&config, Arc::clone(&ctx)).unwrap();
    (ctx, listener)
}

struct Client {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Client {
    fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        Self { stream, reader }
    }

    fn send(&mut self, line: &str) -> String {
        self.write(line);
        self.read_response()
    }

    fn write(&mut self, line: &str) {
        self.stream
            .write_all(format!("{line}\n").as_bytes())
            .unwrap();
    }

    fn read_response(&mut self) -> String {
        let mut response = String::new();
        let n = self.reader.read_line(&mut response).unwrap();
        assert!(n > 0, "server closed the connection");
        response.trim_end().to_string()
    }

    /// Expect no response within a short settle window.
    fn expect_silence(&mut self, window: Duration) {
        self.stream.set_read_timeout(Some(window)).unwrap();
        let mut byte = [0u8; 1];
        match self.reader.read(&mut byte) {
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {}
            other => panic!("expected silence, got {other:?}"),
        }
        self.stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
    }

    /// Expect the server to close this connection.
    fn expect_eof(&mut self) {
        let mut rest = String::new();
        let n = self.reader.read_line(&mut rest).unwrap();
        assert_eq!(n, 0, "expected EOF, got {rest:?}");
    }
}

fn wait_until(what: &str, mut pred: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !pred() {
        assert!(Instant::now() < deadline, "timed out waiting: {what}");
        thread::sleep(Duration::from_millis(10));
    }
}

// =============================================================================
// Serve Loop
// =============================================================================

#[test]
fn test_round_trip_over_tcp() {
    let (_ctx, listener) = start_server();
    let mut client = Client::connect(listener.local_addr());

    assert_eq!(client.send("a foo 1"), "added");
    assert_eq!(client.send("q foo"), "1");
    assert_eq!(client.send("d foo"), "removed");
    assert_eq!(client.send("q foo"), "not found");

    listener.stop();
}

#[test]
fn test_duplicate_insert_over_tcp() {
    let (_ctx, listener) = start_server();
    let mut client = Client::connect(listener.local_addr());

    assert_eq!(client.send("a x 1"), "added");
    assert_eq!(client.send("a x 2"), "already in database");
    assert_eq!(client.send("q x"), "1");

    listener.stop();
}

#[test]
fn test_clients_share_the_tree() {
    let (_ctx, listener) = start_server();
    let mut first = Client::connect(listener.local_addr());
    let mut second = Client::connect(listener.local_addr());

    assert_eq!(first.send("a shared 42"), "added");
    assert_eq!(second.send("q shared"), "42");
    assert_eq!(second.send("d shared"), "removed");
    assert_eq!(first.send("q shared"), "not found");

    listener.stop();
}

#[test]
fn test_disconnect_unregisters_worker() {
    let (ctx, listener) = start_server();

    let mut client = Client::connect(listener.local_addr());
    assert_eq!(client.send("a k 1"), "added");
    assert_eq!(ctx.roster.len(), 1);

    drop(client);
    wait_until("roster to empty after disconnect", || ctx.roster.is_empty());
    assert_eq!(ctx.counter.active(), 0);

    listener.stop();
}

// =============================================================================
// Stop / Go Gating
// =============================================================================

#[test]
fn test_stop_parks_clients_until_release() {
    let (ctx, listener) = start_server();
    let mut first = Client::connect(listener.local_addr());
    let mut second = Client::connect(listener.local_addr());

    // Make sure both workers are registered before stopping.
    assert_eq!(first.send("a warm 0"), "added");
    assert_eq!(second.send("q warm"), "0");

    ctx.gate.stop();

    first.write("a k1 v");
    second.write("a k2 v");
    first.expect_silence(Duration::from_millis(300));
    second.expect_silence(Duration::from_millis(300));

    ctx.gate.release();
    assert_eq!(first.read_response(), "added");
    assert_eq!(second.read_response(), "added");
    assert_eq!(first.send("q k2"), "v");

    listener.stop();
}

#[test]
fn test_in_flight_command_completes_after_stop() {
    let (ctx, listener) = start_server();
    let mut client = Client::connect(listener.local_addr());

    // The gate is checked before execution, not during: a stop issued
    // after the command was read must not affect the response already in
    // flight, and the next command parks.
    assert_eq!(client.send("a k 1"), "added");
    ctx.gate.stop();
    client.write("q k");
    client.expect_silence(Duration::from_millis(300));
    ctx.gate.release();
    assert_eq!(client.read_response(), "1");

    listener.stop();
}

// =============================================================================
// Cancel-All (interrupt path)
// =============================================================================

#[test]
fn test_cancel_all_kicks_clients_but_keeps_accepting() {
    let (ctx, listener) = start_server();

    let mut clients: Vec<Client> = (0..3)
        .map(|i| {
            let mut c = Client::connect(listener.local_addr());
            assert_eq!(c.send(&format!("a warm{i} 0")), "added");
            c
        })
        .collect();
    assert_eq!(ctx.roster.len(), 3);

    ctx.cancel_all_workers();

    for client in &mut clients {
        client.expect_eof();
    }
    wait_until("roster to empty after cancel-all", || ctx.roster.is_empty());
    assert_eq!(ctx.counter.active(), 0);

    // The server is still open for business.
    let mut fresh = Client::connect(listener.local_addr());
    assert_eq!(fresh.send("a y 1"), "added");

    listener.stop();
}

#[test]
fn test_cancel_all_wakes_gated_workers() {
    let (ctx, listener) = start_server();
    let mut client = Client::connect(listener.local_addr());
    assert_eq!(client.send("a warm 0"), "added");

    // Park the worker at the gate, then cancel. The worker must get out
    // of the gate wait and clean up even though the gate stays stopped.
    ctx.gate.stop();
    client.write("q warm");
    client.expect_silence(Duration::from_millis(200));

    ctx.cancel_all_workers();
    client.expect_eof();
    wait_until("roster to empty after gated cancel", || {
        ctx.roster.is_empty()
    });
    assert!(ctx.gate.is_stopped());

    listener.stop();
}

// =============================================================================
// Shutdown Sequence
// =============================================================================

#[test]
fn test_shutdown_drains_workers_and_empties_tree() {
    let (ctx, listener) = start_server();

    let mut clients: Vec<Client> = (0..2)
        .map(|i| {
            let mut c = Client::connect(listener.local_addr());
            assert_eq!(c.send(&format!("a key{i} {i}")), "added");
            c
        })
        .collect();

    // The sequence the supervisor runs on admin EOF.
    ctx.roster.close();
    ctx.cancel_all_workers();

    let drained = {
        let ctx = Arc::clone(&ctx);
        thread::spawn(move || ctx.counter.wait_idle())
    };
    wait_until("worker count to drain", || drained.is_finished());
    drained.join().unwrap();

    assert!(ctx.roster.is_empty());
    assert_eq!(ctx.counter.active(), 0);
    for client in &mut clients {
        client.expect_eof();
    }

    ctx.tree.cleanup();
    assert!(ctx.tree.keys_in_order().is_empty());

    // Closed roster: a late connection is accepted by the socket but its
    // worker refuses to register and drops it.
    let mut late = Client::connect(listener.local_addr());
    late.write("a late 1");
    late.expect_eof();
    assert!(ctx.roster.is_empty());

    listener.stop();
}
