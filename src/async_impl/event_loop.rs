// Copyright (c) 2023 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The event loop that multiplexes every in-flight transfer of this client
//! over one background thread.
//!
//! The thread owns the engine's multi handle, the reactor, the parked
//! executors and both timing disciplines. The only cross-thread state is the
//! pending queue (one mutex), a handful of atomics and the reactor's wakeup
//! handle; the engine is never called while the pending lock is held, since
//! it takes internal locks of its own.

use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use curl::multi::{Easy2Handle, Events, Multi, Socket};
use mio::{Interest, Poll, Token, Waker};
use slab::Slab;

use crate::async_impl::executor::{Collector, Executor};
use crate::async_impl::pool::HandlePool;
use crate::async_impl::socket::SocketContext;
use crate::async_impl::timesup::TimesupIndex;
use crate::error::{ErrorKind, HttpClientError};
use crate::request::Request;
use crate::resolve::ResolveHost;
use crate::status::RequestStatus;

const WAKE_TOKEN: Token = Token(usize::MAX);

// How long the destructor sleeps between re-checks while draining. The
// condvar is signalled on every completion, the timeout only guards against
// a wakeup racing the counter.
const DRAIN_RECHECK: Duration = Duration::from_millis(10);

/// A builder which is used to construct an [`EventLoop`].
///
/// # Examples
///
/// ```no_run
/// use mux_http_client::async_impl::EventLoopBuilder;
///
/// let event_loop = EventLoopBuilder::new()
///     .reserve_connections(8)
///     .max_connections(64)
///     .build()
///     .unwrap();
/// ```
pub struct EventLoopBuilder {
    reserve_connections: usize,
    max_connections: Option<usize>,
    resolve_hosts: Vec<ResolveHost>,
}

impl EventLoopBuilder {
    /// Creates a new, default `EventLoopBuilder`.
    pub fn new() -> Self {
        Self {
            reserve_connections: 0,
            max_connections: None,
            resolve_hosts: Vec::new(),
        }
    }

    /// Pre-creates this many transfer handles so early submissions do not
    /// pay the handle setup cost. Defaults to 0.
    pub fn reserve_connections(mut self, reserve: usize) -> Self {
        self.reserve_connections = reserve;
        self
    }

    /// Caps the engine's connection cache. Defaults to the engine's own
    /// sizing.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Adds a `host:port => ip` override applied to every request this loop
    /// runs, in addition to the request's own overrides.
    pub fn resolve_host(mut self, resolve_host: ResolveHost) -> Self {
        self.resolve_hosts.push(resolve_host);
        self
    }

    /// Constructs the `EventLoop` and spawns its background thread. Returns
    /// only once the thread reports running, so requests can be submitted
    /// immediately.
    pub fn build(self) -> Result<EventLoop, HttpClientError> {
        let poll =
            Poll::new().map_err(|e| HttpClientError::new_with_cause(ErrorKind::Build, Some(e)))?;
        let waker = Waker::new(poll.registry(), WAKE_TOKEN)
            .map_err(|e| HttpClientError::new_with_cause(ErrorKind::Build, Some(e)))?;

        let pool = Arc::new(HandlePool::new());
        pool.warm(self.reserve_connections);

        let shared = Arc::new(Shared {
            pending: Mutex::new(Vec::new()),
            waker,
            active: AtomicU64::new(0),
            running: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            started: (Mutex::new(false), Condvar::new()),
            drained: (Mutex::new(()), Condvar::new()),
        });

        let thread_shared = shared.clone();
        let max_connections = self.max_connections;
        let thread = std::thread::Builder::new()
            .name("mux-http-event-loop".to_string())
            .spawn(move || {
                let mut inner = Inner::new(thread_shared, poll, max_connections);
                inner.run();
            })
            .map_err(|e| HttpClientError::new_with_cause(ErrorKind::Build, Some(e)))?;

        // Wait for the thread to spin up, so the caller can submit without a
        // startup race.
        {
            let (lock, cvar) = &shared.started;
            let mut started = lock.lock().unwrap();
            while !*started {
                started = cvar.wait(started).unwrap();
            }
        }

        Ok(EventLoop {
            shared,
            pool,
            resolve_hosts: Arc::new(self.resolve_hosts),
            thread: Some(thread),
        })
    }
}

impl Default for EventLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives every submitted request to completion on one background thread,
/// reusing connections between requests, and reports each outcome through
/// the request's completion callback.
///
/// Dropping the loop lets all in-flight requests drain first; the drop
/// returns only after every completion callback has fired.
///
/// # Examples
///
/// ```no_run
/// use mux_http_client::async_impl::EventLoop;
/// use mux_http_client::Request;
///
/// let event_loop = EventLoop::new().unwrap();
///
/// let mut request = Request::new("http://www.example.com");
/// request.on_complete(|_request, response| {
///     println!("{}", response.status_code());
/// });
/// assert!(event_loop.submit(request));
/// ```
pub struct EventLoop {
    shared: Arc<Shared>,
    pool: Arc<HandlePool>,
    resolve_hosts: Arc<Vec<ResolveHost>>,
    thread: Option<JoinHandle<()>>,
}

impl EventLoop {
    /// Creates an `EventLoop` with default settings.
    pub fn new() -> Result<Self, HttpClientError> {
        EventLoopBuilder::new().build()
    }

    /// Creates a new, default [`EventLoopBuilder`].
    pub fn builder() -> EventLoopBuilder {
        EventLoopBuilder::new()
    }

    /// Hands a request to the loop. The request is prepared on the calling
    /// thread, queued, and picked up by the loop thread on its next wakeup.
    ///
    /// Returns `false` when the loop is stopping; the request is dropped
    /// unchanged and no callback will fire for it.
    pub fn submit(&self, request: Request) -> bool {
        if self.shared.stopping.load(Ordering::SeqCst) {
            return false;
        }

        // Count the request before it is visible to the loop so the drain
        // logic sees pending submissions too.
        self.shared.active.fetch_add(1, Ordering::SeqCst);

        let mut executor = Executor::new(request, self.pool.clone());
        if executor.prepare(self.resolve_hosts.as_slice()).is_err() {
            self.shared.active.fetch_sub(1, Ordering::SeqCst);
            self.shared.notify_drained();
            return false;
        }

        {
            let mut pending = self.shared.pending.lock().unwrap();
            pending.push(executor);
        }
        let _ = self.shared.waker.wake();
        true
    }

    /// The number of requests submitted but not yet finalized, pending ones
    /// included.
    pub fn active_request_count(&self) -> u64 {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Whether the background thread is running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Stops accepting new submissions. Idempotent; requests already in
    /// flight drain normally.
    pub fn stop(&self) {
        self.shared.stopping.store(true, Ordering::SeqCst);
    }

    /// How many transfer handles the loop's pool has created so far.
    pub fn transfer_handle_count(&self) -> u64 {
        self.pool.created_count()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.shared.stopping.store(true, Ordering::SeqCst);

        // Let every in-flight and pending request finish; each completion
        // signals the condvar. A dead loop thread can no longer drain, so
        // stop waiting if it goes away.
        {
            let (lock, cvar) = &self.shared.drained;
            let mut guard = lock.lock().unwrap();
            while self.shared.active.load(Ordering::SeqCst) > 0
                && self.shared.running.load(Ordering::SeqCst)
            {
                let (next, _) = cvar.wait_timeout(guard, DRAIN_RECHECK).unwrap();
                guard = next;
            }
        }

        self.shared.shutdown.store(true, Ordering::SeqCst);
        // One final wakeup so the reactor observes the shutdown flag.
        let _ = self.shared.waker.wake();

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct Shared {
    pending: Mutex<Vec<Executor>>,
    waker: Waker,
    active: AtomicU64,
    running: AtomicBool,
    stopping: AtomicBool,
    shutdown: AtomicBool,
    started: (Mutex<bool>, Condvar),
    drained: (Mutex<()>, Condvar),
}

impl Shared {
    fn notify_drained(&self) {
        let (_, cvar) = &self.drained;
        cvar.notify_all();
    }
}

// Engine callbacks fire re-entrantly inside multi calls, while the loop
// already holds its own state mutably, so they only enqueue work here.
enum EngineRequest {
    Timer(Option<Duration>),
    Socket {
        socket: Socket,
        input: bool,
        output: bool,
        remove: bool,
        token: usize,
    },
}

// An executor whose transfer the engine currently owns, together with the
// attached engine handle that identifies and finalizes it.
struct Parked {
    executor: Executor,
    handle: Easy2Handle<Collector>,
}

// The loop thread's private state. Nothing in here is touched from any
// other thread.
struct Inner {
    shared: Arc<Shared>,
    multi: Multi,
    poll: Poll,
    engine_rx: Receiver<EngineRequest>,
    parked: HashMap<usize, Parked>,
    next_token: usize,
    timesup: TimesupIndex,
    sockets: Slab<SocketContext>,
    transport_deadline: Option<u64>,
    grabbed: Vec<Executor>,
    epoch: Instant,
}

impl Inner {
    fn new(shared: Arc<Shared>, poll: Poll, max_connections: Option<usize>) -> Self {
        let (tx, rx) = channel::<EngineRequest>();

        let mut multi = Multi::new();
        let socket_tx: Sender<EngineRequest> = tx.clone();
        multi
            .socket_function(move |socket, events, token| {
                let _ = socket_tx.send(EngineRequest::Socket {
                    socket,
                    input: events.input(),
                    output: events.output(),
                    remove: events.remove(),
                    token,
                });
            })
            .expect("engine rejected the socket callback");
        multi
            .timer_function(move |timeout| {
                let _ = tx.send(EngineRequest::Timer(timeout));
                true
            })
            .expect("engine rejected the timer callback");
        if let Some(max) = max_connections {
            let _ = multi.set_max_connects(max);
        }

        Self {
            shared,
            multi,
            poll,
            engine_rx: rx,
            parked: HashMap::new(),
            next_token: 1,
            timesup: TimesupIndex::new(),
            sockets: Slab::new(),
            transport_deadline: None,
            grabbed: Vec::new(),
            epoch: Instant::now(),
        }
    }

    fn run(&mut self) {
        self.shared.running.store(true, Ordering::SeqCst);
        {
            let (lock, cvar) = &self.shared.started;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }

        let mut events = mio::Events::with_capacity(256);
        let mut fired: Vec<(Token, bool, bool, bool)> = Vec::new();

        loop {
            if self.shared.shutdown.load(Ordering::SeqCst) {
                break;
            }

            let timeout = self.poll_timeout();
            if let Err(e) = self.poll.poll(&mut events, timeout) {
                if e.kind() == IoErrorKind::Interrupted {
                    continue;
                }
                break;
            }

            fired.clear();
            for event in events.iter() {
                fired.push((
                    event.token(),
                    event.is_readable(),
                    event.is_writable(),
                    event.is_error(),
                ));
            }

            for &(token, readable, writable, error) in &fired {
                if token == WAKE_TOKEN {
                    self.accept_pending();
                } else {
                    self.socket_event(token, readable, writable, error);
                }
            }

            let now = self.now_ms();
            if self
                .transport_deadline
                .map(|deadline| deadline <= now)
                .unwrap_or(false)
            {
                self.transport_deadline = None;
                self.check_actions(None);
            }

            self.expire_timesup(now);
            if self.apply_engine_requests() {
                self.check_actions(None);
            }
        }

        self.shared.running.store(false, Ordering::SeqCst);
    }

    // Milliseconds on the loop's monotonic clock.
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    // The reactor blocks until the next of: wakeup, socket event, transport
    // timer, earliest timesup deadline.
    fn poll_timeout(&self) -> Option<Duration> {
        let now = self.now_ms();
        let timesup_deadline = self.timesup.earliest().map(|(deadline, _)| deadline);
        let deadline = match (self.transport_deadline, timesup_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        deadline.map(|d| Duration::from_millis(d.saturating_sub(now)))
    }

    /// Moves every queued executor into the engine. The pending lock is
    /// held only for the swap: the engine must never be called under it.
    fn accept_pending(&mut self) {
        let mut grabbed = std::mem::take(&mut self.grabbed);
        {
            let mut pending = self.shared.pending.lock().unwrap();
            std::mem::swap(&mut *pending, &mut grabbed);
        }

        let now = self.now_ms();
        for mut executor in grabbed.drain(..) {
            let token = self.next_token;
            self.next_token += 1;

            // Index the deadline before the engine sees the transfer: a very
            // fast completion must find its entry in place.
            if let Some(timesup) = executor.timesup() {
                let deadline = now + timesup.as_millis() as u64;
                let timesup_token = self.timesup.insert(deadline, token);
                executor.set_timesup_token(timesup_token);
            }

            let easy = executor.take_easy();
            match self.multi.add2(easy) {
                Ok(mut handle) => {
                    if handle.set_token(token).is_err() {
                        // Unidentifiable transfers cannot be completed later;
                        // back out immediately.
                        let easy = self.multi.remove2(handle).ok();
                        self.complete_request_normal(executor, RequestStatus::SendError, easy);
                        continue;
                    }
                    self.parked.insert(token, Parked { executor, handle });
                    // Nudge the engine right away so fast completions are
                    // picked up this turn.
                    self.check_actions(None);
                }
                Err(_) => {
                    self.complete_request_normal(executor, RequestStatus::SendError, None);
                }
            }
        }
        // Keep the buffer for the next swap.
        self.grabbed = grabbed;
    }

    fn socket_event(&mut self, token: Token, readable: bool, writable: bool, error: bool) {
        let Some(context) = self.sockets.get(token.0) else {
            return;
        };
        let socket = context.socket();

        let mut events = Events::new();
        events.input(readable);
        events.output(writable);
        events.error(error);
        self.check_actions(Some((socket, events)));
    }

    /// Drives the engine and reaps finished transfers. Every path that
    /// touches the multi funnels through here.
    fn check_actions(&mut self, target: Option<(Socket, Events)>) {
        self.drive_engine(target);
        self.reap_completions();

        // The engine may request an immediate re-run (zero-delay timer);
        // honor it inline, bounded, and fall back to an immediate poll
        // timeout if it keeps asking.
        let mut rounds = 0;
        while self.apply_engine_requests() {
            if rounds == 8 {
                self.transport_deadline = Some(self.now_ms());
                break;
            }
            rounds += 1;
            self.drive_engine(None);
            self.reap_completions();
        }
    }

    fn drive_engine(&mut self, target: Option<(Socket, Events)>) {
        // A failing multi call is not a per-request error; affected
        // transfers surface through their own completion messages.
        let _ = match target {
            Some((socket, events)) => self.multi.action(socket, &events),
            // No socket is ready: drive the engine through its timeout
            // sentinel so transfers without a readiness event (connect
            // timeouts, transport timeouts) still advance.
            None => self
                .multi
                .action(curl_sys::CURL_SOCKET_TIMEOUT, &Events::new()),
        };
    }

    fn reap_completions(&mut self) {
        let mut finished: Vec<(usize, Result<(), curl::Error>)> = Vec::new();
        self.multi.messages(|message| {
            if let Some(result) = message.result() {
                if let Ok(token) = message.token() {
                    finished.push((token, result));
                }
            }
        });

        for (token, result) in finished {
            let Some(Parked { executor, handle }) = self.parked.remove(&token) else {
                continue;
            };
            let easy = self.multi.remove2(handle).ok();
            let status = RequestStatus::from_transfer_result(result);
            self.complete_request_normal(executor, status, easy);
        }
    }

    /// The single normal completion path: stamps the response, fires the
    /// callback unless timesup got there first, releases the transfer
    /// handle and retires the request from the active count.
    fn complete_request_normal(
        &mut self,
        mut executor: Executor,
        status: RequestStatus,
        mut easy: Option<curl::easy::Easy2<Collector>>,
    ) {
        if !executor.completion_called() {
            executor.set_completion_called();
            if let Some(token) = executor.take_timesup_token() {
                self.timesup.remove(token);
            }
            executor.finish_normal(status, easy.as_mut());
            executor.deliver();
        }

        if let Some(easy) = easy {
            executor.release_handle(easy);
        }

        self.shared.active.fetch_sub(1, Ordering::SeqCst);
        self.shared.notify_drained();
    }

    /// Expires every entry whose deadline has passed, in deadline order.
    /// The index advance happens here, not in the executor's timesup
    /// finalization, so several executors sharing one deadline expire in a
    /// single scan.
    fn expire_timesup(&mut self, now: u64) {
        while let Some((deadline, token)) = self.timesup.earliest() {
            if deadline > now {
                break;
            }
            if let Some(parked) = self.parked.get_mut(&token) {
                if !parked.executor.completion_called() {
                    parked.executor.set_completion_called();
                    let partial = {
                        let (status_line, headers, _) = parked.handle.get_mut().take_collected();
                        Some((status_line, headers))
                    };
                    parked.executor.finish_timesup(partial);
                    parked.executor.deliver();
                }
                // The entry is about to be dropped; the executor must not
                // try to remove it again on the normal path.
                parked.executor.clear_timesup_token();
            }
            self.timesup.pop_first();
        }
    }

    /// Applies the poll-interest and timer changes the engine queued during
    /// its callbacks. Returns whether an immediate re-run was requested.
    fn apply_engine_requests(&mut self) -> bool {
        let mut immediate = false;
        while let Ok(request) = self.engine_rx.try_recv() {
            match request {
                EngineRequest::Timer(None) => self.transport_deadline = None,
                EngineRequest::Timer(Some(timeout)) => {
                    if timeout.is_zero() {
                        self.transport_deadline = None;
                        immediate = true;
                    } else {
                        self.transport_deadline =
                            Some(self.now_ms() + timeout.as_millis() as u64);
                    }
                }
                EngineRequest::Socket {
                    socket,
                    input,
                    output,
                    remove,
                    token,
                } => self.apply_socket_request(socket, input, output, remove, token),
            }
        }
        immediate
    }

    fn apply_socket_request(
        &mut self,
        socket: Socket,
        input: bool,
        output: bool,
        remove: bool,
        token: usize,
    ) {
        if remove {
            if token > 0 {
                if let Some(mut context) = self.sockets.try_remove(token - 1) {
                    context.disarm(self.poll.registry());
                }
                let _ = self.multi.assign(socket, 0);
            }
            return;
        }

        let interest = match (input, output) {
            (true, true) => Interest::READABLE | Interest::WRITABLE,
            (true, false) => Interest::READABLE,
            (false, true) => Interest::WRITABLE,
            (false, false) => return,
        };

        if token == 0 {
            // First interest on this socket: set a context up and hand its
            // token to the engine.
            let key = self.sockets.insert(SocketContext::new(socket));
            let registry = self.poll.registry();
            let armed = self
                .sockets
                .get_mut(key)
                .map(|context| context.arm(registry, Token(key), interest).is_ok())
                .unwrap_or(false);
            if !armed || self.multi.assign(socket, key + 1).is_err() {
                if let Some(mut context) = self.sockets.try_remove(key) {
                    context.disarm(self.poll.registry());
                }
            }
        } else if let Some(context) = self.sockets.get_mut(token - 1) {
            let _ = context.arm(self.poll.registry(), Token(token - 1), interest);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The loop only exits once the active count is zero, so no executor
        // is parked anymore; what remains are idle socket registrations.
        let registry = self.poll.registry();
        for (_, context) in self.sockets.iter_mut() {
            context.disarm(registry);
        }
    }
}
