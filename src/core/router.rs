//! The router: a single dispatch thread that owns the backend list
//!
//! Every interaction with the backend list is a message on one ordered,
//! unbounded queue: log entries, backend replacement and addition, status
//! queries and the close request. The dispatch thread handles one message at
//! a time, so delivery and reconfiguration never race.
//!
//! # Ordering
//!
//! Entries from one [`Logger`] are delivered in the order of their per-logger
//! sequence numbers. Global sequence numbers are drawn when a router accepts
//! an entry, so across loggers they reflect acceptance order, not the order in
//! which threads issued their log calls.
//!
//! # Shutdown
//!
//! [`Router::close`] takes the admission gate exclusively, marks the router as
//! closing and enqueues the close request. Producers check the mark while
//! holding the gate shared, so every accepted entry sits ahead of the close
//! request in the queue and is delivered before the dispatch thread exits.
//! Later calls fail with [`RouterError::RouterClosed`].
//!
//! A backend that blocks in `log` stalls the whole dispatch thread; writes
//! have no timeout.

use super::backend::SharedBackend;
use super::caller::{SharedCallerProvider, TrackedCaller};
use super::entry::Entry;
use super::error::{Result, RouterError};
use super::level::LevelRegistry;
use super::logger::Logger;
use super::metrics::RouterMetrics;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Called on the dispatch thread with the backend name and the failure that
/// got it removed
pub type DiagnosticCallback = Arc<dyn Fn(&str, &RouterError) + Send + Sync>;

enum Message {
    Log(Entry),
    SetBackends(Vec<SharedBackend>, Sender<()>),
    AddBackends(Vec<SharedBackend>, Sender<()>),
    Status(Sender<RouterStatus>),
    Close(Sender<()>),
}

/// Snapshot returned by [`Router::status`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterStatus {
    /// Last global sequence number handed out
    pub gid: u64,
    /// Backends currently registered
    pub backends: usize,
    pub delivered: u64,
    pub failed: u64,
}

impl fmt::Display for RouterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "router status: gid={} backends={} delivered={} failed={}",
            self.gid, self.backends, self.delivered, self.failed
        )
    }
}

struct Shared {
    sender: Sender<Message>,
    /// `true` once a close was requested
    closing: RwLock<bool>,
    next_gid: Arc<AtomicU64>,
    metrics: Arc<RouterMetrics>,
    registry: Arc<LevelRegistry>,
    caller: SharedCallerProvider,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Shared {
    fn shutdown(&self) -> Result<()> {
        let (ack_tx, ack_rx) = bounded(1);
        {
            let mut closing = self.closing.write();
            if *closing {
                return Err(RouterError::RouterClosed);
            }
            *closing = true;
            self.sender
                .send(Message::Close(ack_tx))
                .map_err(|_| RouterError::ChannelSendError)?;
        }

        let acked = ack_rx.recv().is_ok();
        if let Some(handle) = self.handle.lock().take() {
            if let Err(e) = handle.join() {
                eprintln!(
                    "[ROUTER ERROR] Dispatch thread panicked during shutdown: {}",
                    panic_message(&e)
                );
                return Err(RouterError::ChannelReceiveError);
            }
        }

        if acked {
            Ok(())
        } else {
            Err(RouterError::ChannelReceiveError)
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if !*self.closing.read() {
            if let Err(e) = self.shutdown() {
                eprintln!("[ROUTER ERROR] Failed to drain router on drop: {}", e);
            }
        }
    }
}

/// Cloneable handle to a dispatch thread
///
/// The thread is drained and stopped by [`Router::close`], or when the last
/// handle (including the ones held by loggers) is dropped.
#[derive(Clone)]
pub struct Router {
    shared: Arc<Shared>,
}

impl Router {
    /// A router with the built-in levels, tracked caller locations and no
    /// backends
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// A named logger feeding this router
    pub fn logger(&self, name: impl Into<Arc<str>>) -> Logger {
        Logger::new(self.clone(), name)
    }

    pub fn registry(&self) -> &Arc<LevelRegistry> {
        &self.shared.registry
    }

    pub fn caller_provider(&self) -> &SharedCallerProvider {
        &self.shared.caller
    }

    pub fn metrics(&self) -> &RouterMetrics {
        &self.shared.metrics
    }

    /// Draw the next global sequence number (starts at 1)
    pub fn next_gid(&self) -> u64 {
        self.shared.next_gid.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last global sequence number handed out
    pub fn current_gid(&self) -> u64 {
        self.shared.next_gid.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        *self.shared.closing.read()
    }

    /// Hand an entry to the dispatch thread, returning its global sequence
    /// number
    ///
    /// Returns once the entry is queued; delivery happens asynchronously.
    pub fn log(&self, entry: Entry) -> Result<u64> {
        let closing = self.shared.closing.read();
        if *closing {
            self.shared.metrics.record_rejected();
            return Err(RouterError::RouterClosed);
        }

        let gid = self.next_gid();
        let lid = entry.lid();
        self.shared
            .sender
            .send(Message::Log(entry.with_ids(gid, lid)))
            .map_err(|_| RouterError::ChannelSendError)?;
        self.shared.metrics.record_accepted();
        Ok(gid)
    }

    /// Replace the backend list; returns once the dispatch thread applied it
    pub fn set_backends(&self, backends: Vec<SharedBackend>) -> Result<()> {
        self.request(|ack| Message::SetBackends(backends, ack))
    }

    /// Append to the backend list; returns once the dispatch thread applied it
    pub fn add_backends(&self, backends: Vec<SharedBackend>) -> Result<()> {
        self.request(|ack| Message::AddBackends(backends, ack))
    }

    pub fn status(&self) -> Result<RouterStatus> {
        self.request(Message::Status)
    }

    /// Deliver every accepted entry, flush all backends and stop the
    /// dispatch thread
    ///
    /// Blocks until the drain is complete. A second call, or any call racing
    /// with a completed close, returns [`RouterError::RouterClosed`].
    pub fn close(&self) -> Result<()> {
        self.shared.shutdown()
    }

    /// Alias for [`Router::close`]
    pub fn drain(&self) -> Result<()> {
        self.close()
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Message) -> Result<T> {
        let (reply_tx, reply_rx) = bounded(1);
        {
            let closing = self.shared.closing.read();
            if *closing {
                self.shared.metrics.record_rejected();
                return Err(RouterError::RouterClosed);
            }
            self.shared
                .sender
                .send(make(reply_tx))
                .map_err(|_| RouterError::ChannelSendError)?;
        }
        reply_rx.recv().map_err(|_| RouterError::ChannelReceiveError)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("gid", &self.current_gid())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Owner of the backend list, running on the dispatch thread
struct Dispatcher {
    backends: Vec<SharedBackend>,
    receiver: Receiver<Message>,
    next_gid: Arc<AtomicU64>,
    metrics: Arc<RouterMetrics>,
    on_backend_error: Option<DiagnosticCallback>,
    dirty: bool,
}

impl Dispatcher {
    fn run(mut self) {
        while let Ok(message) = self.receiver.recv() {
            match message {
                Message::Log(entry) => self.deliver(&entry),
                Message::SetBackends(backends, ack) => {
                    self.flush_all();
                    self.backends = backends;
                    let _ = ack.send(());
                }
                Message::AddBackends(backends, ack) => {
                    self.backends.extend(backends);
                    let _ = ack.send(());
                }
                Message::Status(reply) => {
                    // buffered write errors surface here, not in `log`
                    if self.dirty {
                        self.flush_all();
                    }
                    let _ = reply.send(self.status());
                }
                Message::Close(ack) => {
                    // Nothing can be admitted after the close request; this
                    // only picks up what is already queued.
                    for message in self.receiver.try_iter().collect::<Vec<_>>() {
                        if let Message::Log(entry) = message {
                            self.deliver(&entry);
                        }
                    }
                    self.flush_all();
                    let _ = ack.send(());
                    return;
                }
            }

            if self.dirty && self.receiver.is_empty() {
                self.flush_all();
            }
        }
        self.flush_all();
    }

    fn status(&self) -> RouterStatus {
        RouterStatus {
            gid: self.next_gid.load(Ordering::SeqCst),
            backends: self.backends.len(),
            delivered: self.metrics.delivered(),
            failed: self.metrics.failed_writes(),
        }
    }

    /// Send `entry` to every interested backend, then retire the ones that
    /// failed
    fn deliver(&mut self, entry: &Entry) {
        let mut failed = Vec::new();

        for (idx, backend) in self.backends.iter().enumerate() {
            if !entry.targets(backend.name()) {
                continue;
            }

            let result = catch_unwind(AssertUnwindSafe(|| {
                if backend.wants(entry) {
                    backend.log(entry).map(|()| true)
                } else {
                    Ok(false)
                }
            }));

            match result {
                Ok(Ok(true)) => {
                    self.metrics.record_delivered();
                    self.dirty = true;
                }
                Ok(Ok(false)) => {}
                Ok(Err(e)) => {
                    eprintln!(
                        "[ROUTER ERROR] Backend '{}' failed and was removed: {}",
                        backend.name(),
                        e
                    );
                    failed.push((idx, e));
                }
                Err(panic_info) => {
                    let message = panic_message(&panic_info);
                    eprintln!(
                        "[ROUTER CRITICAL] Backend '{}' panicked: {}. \
                         It was removed; other backends continue to function.",
                        backend.name(),
                        message
                    );
                    let e = RouterError::BackendPanic {
                        backend: backend.name().to_string(),
                        message,
                    };
                    failed.push((idx, e));
                }
            }
        }

        if !failed.is_empty() {
            self.retire(failed);
        }
    }

    fn retire(&mut self, failed: Vec<(usize, RouterError)>) {
        for (idx, e) in &failed {
            self.metrics.record_failed_write();
            self.metrics.record_backend_removed();
            if let Some(ref callback) = self.on_backend_error {
                let name = self.backends[*idx].name();
                if catch_unwind(AssertUnwindSafe(|| callback(name, e))).is_err() {
                    eprintln!("[ROUTER WARNING] Backend error callback panicked");
                }
            }
        }

        let mut idx = 0;
        self.backends.retain(|_| {
            let keep = !failed.iter().any(|(failed_idx, _)| *failed_idx == idx);
            idx += 1;
            keep
        });
    }

    /// Flush every backend and retire the ones whose flush failed
    fn flush_all(&mut self) {
        let mut failed = Vec::new();

        for (idx, backend) in self.backends.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| backend.flush())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!(
                        "[ROUTER ERROR] Backend '{}' flush failed and was removed: {}",
                        backend.name(),
                        e
                    );
                    failed.push((idx, e));
                }
                Err(panic_info) => {
                    let message = panic_message(&panic_info);
                    eprintln!(
                        "[ROUTER CRITICAL] Backend '{}' panicked during flush: {}. \
                         It was removed; other backends continue to function.",
                        backend.name(),
                        message
                    );
                    let e = RouterError::BackendPanic {
                        backend: backend.name().to_string(),
                        message,
                    };
                    failed.push((idx, e));
                }
            }
        }
        self.dirty = false;

        if !failed.is_empty() {
            self.retire(failed);
        }
    }
}

fn panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for [`Router`]
///
/// # Example
/// ```
/// use rust_log_router::prelude::*;
/// use std::sync::Arc;
///
/// let registry = Arc::new(LevelRegistry::new());
/// let router = Router::builder()
///     .registry(Arc::clone(&registry))
///     .caller_provider(Arc::new(NoCaller))
///     .on_backend_error(Arc::new(|backend: &str, err: &RouterError| {
///         eprintln!("ALERT: backend {backend} removed: {err}");
///     }))
///     .build()
///     .unwrap();
///
/// router.close().unwrap();
/// ```
pub struct RouterBuilder {
    registry: Option<Arc<LevelRegistry>>,
    caller: Option<SharedCallerProvider>,
    backends: Vec<SharedBackend>,
    on_backend_error: Option<DiagnosticCallback>,
    thread_name: String,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            caller: None,
            backends: Vec::new(),
            on_backend_error: None,
            thread_name: "log-router".to_string(),
        }
    }

    /// Share a level registry (default: a fresh one with the built-in levels)
    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: Arc<LevelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace how call sites become caller info (default: [`TrackedCaller`])
    #[must_use = "builder methods return a new value"]
    pub fn caller_provider(mut self, provider: SharedCallerProvider) -> Self {
        self.caller = Some(provider);
        self
    }

    /// Register a backend before the dispatch thread starts
    #[must_use = "builder methods return a new value"]
    pub fn backend(mut self, backend: SharedBackend) -> Self {
        self.backends.push(backend);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backends(mut self, backends: impl IntoIterator<Item = SharedBackend>) -> Self {
        self.backends.extend(backends);
        self
    }

    /// Callback invoked when a backend fails and is removed
    #[must_use = "builder methods return a new value"]
    pub fn on_backend_error(mut self, callback: DiagnosticCallback) -> Self {
        self.on_backend_error = Some(callback);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Spawn the dispatch thread
    pub fn build(self) -> Result<Router> {
        let (sender, receiver) = unbounded();
        let next_gid = Arc::new(AtomicU64::new(0));
        let metrics = Arc::new(RouterMetrics::new());

        let dispatcher = Dispatcher {
            backends: self.backends,
            receiver,
            next_gid: Arc::clone(&next_gid),
            metrics: Arc::clone(&metrics),
            on_backend_error: self.on_backend_error,
            dirty: false,
        };
        let handle = thread::Builder::new()
            .name(self.thread_name)
            .spawn(move || dispatcher.run())?;

        Ok(Router {
            shared: Arc::new(Shared {
                sender,
                closing: RwLock::new(false),
                next_gid,
                metrics,
                registry: self
                    .registry
                    .unwrap_or_else(|| Arc::new(LevelRegistry::new())),
                caller: self.caller.unwrap_or_else(|| Arc::new(TrackedCaller)),
                handle: Mutex::new(Some(handle)),
            }),
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
