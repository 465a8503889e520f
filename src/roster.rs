//! Client roster
//!
//! The mutex-protected set of live worker handles, plus the server's
//! open/closed flag. Keeping the flag inside the same critical section as
//! registration means no worker can slip in after a final cancel-all: the
//! supervisor closes the roster, then cancels, and any admission racing
//! with that either registered before the close (and gets cancelled) or
//! observes the closed flag and backs out.
//!
//! Lock order: the roster mutex may be held while taking the counter's
//! mutex, never the reverse.

use std::collections::HashMap;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::sync::{CancelToken, WorkerCounter};

/// One registered worker: enough state to request its cancellation from
/// another thread.
#[derive(Debug)]
pub struct ClientHandle {
    id: u64,
    /// Clone of the worker's stream, used only to break its blocking read.
    stream: TcpStream,
    token: CancelToken,
}

impl ClientHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request cooperative cancellation: set the token, then shut the
    /// socket down so a read blocked in the serve loop returns.
    pub fn cancel(&self) {
        self.token.cancel();
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

#[derive(Debug)]
struct RosterInner {
    open: bool,
    clients: HashMap<u64, Arc<ClientHandle>>,
}

/// Registry of live workers.
#[derive(Debug)]
pub struct Roster {
    inner: Mutex<RosterInner>,
    counter: Arc<WorkerCounter>,
    next_id: AtomicU64,
}

impl Roster {
    /// A new roster starts closed; the supervisor opens it before the
    /// listener starts handing out connections.
    pub fn new(counter: Arc<WorkerCounter>) -> Self {
        Self {
            inner: Mutex::new(RosterInner {
                open: false,
                clients: HashMap::new(),
            }),
            counter,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn open(&self) {
        self.inner.lock().open = true;
    }

    /// Refuse all future registrations. Step one of shutdown.
    pub fn close(&self) {
        self.inner.lock().open = false;
    }

    /// Register a worker, or return `None` when the server is closed (or
    /// the stream cannot be cloned for the cancellation path). The
    /// open-check, the insertion, and the counter increment form one
    /// critical section with respect to [`Roster::cancel_all`].
    pub fn try_register(
        &self,
        stream: &TcpStream,
        token: CancelToken,
    ) -> Option<Arc<ClientHandle>> {
        let mut inner = self.inner.lock();
        if !inner.open {
            return None;
        }
        let stream = match stream.try_clone() {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(%error, "failed to clone client stream, refusing");
                return None;
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = Arc::new(ClientHandle { id, stream, token });
        inner.clients.insert(id, Arc::clone(&handle));
        self.counter.increment();
        Some(handle)
    }

    /// Remove a worker's record. Runs exactly once per registered worker,
    /// from its cleanup path; the counter broadcast below is what the
    /// shutdown wait listens for.
    pub fn unregister(&self, id: u64) {
        let removed = self.inner.lock().clients.remove(&id);
        if removed.is_some() {
            self.counter.decrement();
        }
    }

    /// Request cancellation of every registered worker. The map is not
    /// drained here; each worker unregisters itself on the way out.
    pub fn cancel_all(&self) {
        let inner = self.inner.lock();
        tracing::debug!(count = inner.clients.len(), "cancelling all clients");
        for handle in inner.clients.values() {
            handle.cancel();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
