//! The reactor context: owns sessions and listeners, demultiplexes
//! inbound frames, routes requests to registered handlers, and routes
//! responses back to client continuations.
//!
//! One receive thread per session pushes frames onto a shared queue; the
//! run loop (optionally a managed thread) pops and dispatches them. User
//! handlers and response continuations always run on the executor, never
//! on the reactor thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::runtime::channel::Channel;
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::encoding::Encoding;
use crate::runtime::error::{Result, RuntimeError};
use crate::runtime::executor::{default_executor, Executor};
use crate::runtime::frame::{Frame, FrameType, FLAG_END_STREAM};
use crate::runtime::hb1::Reader;
use crate::runtime::rpc::{self, Request, Response, Status};
use crate::runtime::uds::{self, UdsServer};

#[derive(Debug, Clone, Copy)]
pub struct ContextConfig {
    /// Spawn a managed reactor thread in `start()`.
    pub managed_reactor: bool,
    /// Worker pool size for the default executor; 0 means one worker per
    /// available core.
    pub worker_threads: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            managed_reactor: true,
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Client,
    Server,
}

/// Per-channel state: the receive thread and the peer's advertised
/// encoding. Owned by the context from attach until stop or transport
/// error.
pub struct Session {
    id: u64,
    channel: Arc<dyn Channel>,
    kind: SessionKind,
    peer_encoding: AtomicU8,
    running: AtomicBool,
    io_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    fn new(id: u64, channel: Arc<dyn Channel>, kind: SessionKind) -> Self {
        Session {
            id,
            channel,
            kind,
            peer_encoding: AtomicU8::new(Encoding::Hb1 as u8),
            running: AtomicBool::new(false),
            io_thread: Mutex::new(None),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn peer_encoding(&self) -> Encoding {
        Encoding::from_u8(self.peer_encoding.load(Ordering::Relaxed)).unwrap_or_default()
    }

    fn set_peer_encoding(&self, encoding: Encoding) {
        self.peer_encoding.store(encoding as u8, Ordering::Relaxed);
    }

    pub fn send(&self, frame: Frame) -> Result<()> {
        self.channel.send(frame)
    }

    fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.channel.close();
        let handle = match self.io_thread.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            if handle.thread().id() == std::thread::current().id() {
                // The receive loop is tearing itself down; detach.
                drop(handle);
            } else {
                let _ = handle.join();
            }
        }
    }
}

struct QueuedFrame {
    session: Arc<Session>,
    frame: Frame,
}

struct ListenerState {
    server: Arc<UdsServer>,
    running: AtomicBool,
    thread: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    dispatcher: Arc<Dispatcher>,
    executor: RwLock<Arc<dyn Executor>>,
    stop_requested: AtomicBool,
    queue: Mutex<VecDeque<QueuedFrame>>,
    queue_cv: Condvar,
    sessions: Mutex<Vec<Arc<Session>>>,
    listeners: Mutex<Vec<Arc<ListenerState>>>,
    next_session_id: AtomicU64,
}

pub struct Context {
    config: ContextConfig,
    shared: Arc<Shared>,
    reactor_running: AtomicBool,
    reactor_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Context {
    pub fn new(config: ContextConfig) -> Self {
        let executor: Arc<dyn Executor> = if config.worker_threads == 0 {
            default_executor()
        } else {
            Arc::new(crate::runtime::executor::ThreadPoolExecutor::new(
                config.worker_threads,
            ))
        };
        Context {
            config,
            shared: Arc::new(Shared {
                dispatcher: Arc::new(Dispatcher::new()),
                executor: RwLock::new(executor),
                stop_requested: AtomicBool::new(false),
                queue: Mutex::new(VecDeque::new()),
                queue_cv: Condvar::new(),
                sessions: Mutex::new(Vec::new()),
                listeners: Mutex::new(Vec::new()),
                next_session_id: AtomicU64::new(1),
            }),
            reactor_running: AtomicBool::new(false),
            reactor_thread: Mutex::new(None),
        }
    }

    /// The dispatcher shared with generated client stubs.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.shared.dispatcher.clone()
    }

    pub fn executor(&self) -> Arc<dyn Executor> {
        self.shared
            .executor
            .read()
            .map(|executor| executor.clone())
            .unwrap_or_else(|_| {
                let fallback: Arc<dyn Executor> = default_executor();
                fallback
            })
    }

    pub fn set_executor(&self, executor: Arc<dyn Executor>) {
        if let Ok(mut slot) = self.shared.executor.write() {
            *slot = executor;
        }
    }

    /// Binds a UNIX socket at `path` and accepts connections on a
    /// dedicated thread; each accepted channel becomes a server session.
    pub fn listen(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let server = uds::listen(path)?;
        let state = Arc::new(ListenerState {
            server,
            running: AtomicBool::new(true),
            thread: Mutex::new(None),
        });

        let shared = self.shared.clone();
        let accept_state = state.clone();
        let handle = std::thread::Builder::new()
            .name("hasten-accept".to_string())
            .spawn(move || accept_loop(&shared, &accept_state))
            .map_err(|err| RuntimeError::internal(format!("spawn accept thread: {err}")))?;
        if let Ok(mut slot) = state.thread.lock() {
            *slot = Some(handle);
        }

        if let Ok(mut listeners) = self.shared.listeners.lock() {
            listeners.push(state);
        }
        Ok(())
    }

    /// Connects to a UNIX socket and registers the channel as a client
    /// session.
    pub fn connect(&self, path: impl AsRef<std::path::Path>) -> Result<Arc<dyn Channel>> {
        let channel = uds::connect(path)?;
        add_session(&self.shared, channel.clone(), SessionKind::Client)?;
        Ok(channel)
    }

    /// Wraps an externally provided channel in a session.
    pub fn attach_channel(&self, channel: Arc<dyn Channel>, server_side: bool) -> Result<()> {
        let kind = if server_side {
            SessionKind::Server
        } else {
            SessionKind::Client
        };
        add_session(&self.shared, channel, kind)
    }

    /// Spawns the managed reactor thread, if configured.
    pub fn start(&self) {
        if !self.config.managed_reactor {
            return;
        }
        if self.reactor_running.swap(true, Ordering::AcqRel) {
            return;
        }
        let shared = self.shared.clone();
        let handle = std::thread::Builder::new()
            .name("hasten-reactor".to_string())
            .spawn(move || {
                run_loop(&shared, true, false);
            });
        match handle {
            Ok(handle) => {
                if let Ok(mut slot) = self.reactor_thread.lock() {
                    *slot = Some(handle);
                }
            }
            Err(err) => {
                self.reactor_running.store(false, Ordering::Release);
                error!("failed to spawn reactor thread: {err}");
            }
        }
    }

    /// Flips the stop flag, wakes the run loop, closes listeners, and
    /// closes every session channel so their receive loops exit.
    pub fn stop(&self) {
        if self.shared.stop_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.queue_cv.notify_all();

        if let Ok(listeners) = self.shared.listeners.lock() {
            for state in listeners.iter() {
                state.running.store(false, Ordering::Release);
                state.server.close();
            }
        }

        let sessions = match self.shared.sessions.lock() {
            Ok(mut sessions) => std::mem::take(&mut *sessions),
            Err(_) => Vec::new(),
        };
        for session in sessions {
            session.stop();
        }
    }

    /// Joins the reactor thread and all listener threads.
    pub fn join(&self) {
        let handle = match self.reactor_thread.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let _ = handle.join();
        }

        let listeners = match self.shared.listeners.lock() {
            Ok(mut listeners) => std::mem::take(&mut *listeners),
            Err(_) => Vec::new(),
        };
        for state in listeners {
            let handle = match state.thread.lock() {
                Ok(mut slot) => slot.take(),
                Err(_) => None,
            };
            if let Some(handle) = handle {
                let _ = handle.join();
            }
        }
        self.reactor_running.store(false, Ordering::Release);
    }

    /// Blocks for frames until stopped; returns the number processed.
    pub fn run(&self) -> usize {
        run_loop(&self.shared, true, false)
    }

    /// Blocks for at most one frame.
    pub fn run_one(&self) -> usize {
        run_loop(&self.shared, true, true)
    }

    /// Drains queued frames without blocking.
    pub fn poll(&self) -> usize {
        run_loop(&self.shared, false, false)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

// -- Session management --

fn add_session(shared: &Arc<Shared>, channel: Arc<dyn Channel>, kind: SessionKind) -> Result<()> {
    let id = shared.next_session_id.fetch_add(1, Ordering::Relaxed);
    let session = Arc::new(Session::new(id, channel, kind));

    if let Ok(mut sessions) = shared.sessions.lock() {
        sessions.push(session.clone());
    }

    start_session(shared, &session)?;
    send_initial_settings(shared, &session);
    Ok(())
}

fn start_session(shared: &Arc<Shared>, session: &Arc<Session>) -> Result<()> {
    if session.running.swap(true, Ordering::AcqRel) {
        return Ok(());
    }
    let shared = shared.clone();
    let io_session = session.clone();
    let handle = std::thread::Builder::new()
        .name(format!("hasten-session-{}", session.id()))
        .spawn(move || io_loop(&shared, &io_session))
        .map_err(|err| RuntimeError::internal(format!("spawn session thread: {err}")))?;
    if let Ok(mut slot) = session.io_thread.lock() {
        *slot = Some(handle);
    }
    Ok(())
}

/// Per-session receive loop: push frames to the shared queue until the
/// channel errors out or the session stops.
fn io_loop(shared: &Arc<Shared>, session: &Arc<Session>) {
    while session.running.load(Ordering::Relaxed) {
        match session.channel.receive() {
            Ok(frame) => enqueue_frame(shared, session.clone(), frame),
            Err(err) => {
                handle_session_error(shared, session, &err);
                break;
            }
        }
    }
}

fn enqueue_frame(shared: &Shared, session: Arc<Session>, frame: Frame) {
    if let Ok(mut queue) = shared.queue.lock() {
        queue.push_back(QueuedFrame { session, frame });
    }
    shared.queue_cv.notify_one();
}

fn handle_session_error(shared: &Shared, session: &Arc<Session>, err: &RuntimeError) {
    if shared.stop_requested.load(Ordering::Relaxed) {
        info!(session = session.id(), "session closed during shutdown");
    } else {
        error!(session = session.id(), "session error: {err}");
    }
    remove_session(shared, session);
    session.stop();
}

fn remove_session(shared: &Shared, session: &Arc<Session>) {
    if let Ok(mut sessions) = shared.sessions.lock() {
        sessions.retain(|existing| !Arc::ptr_eq(existing, session));
    }
}

fn send_initial_settings(shared: &Shared, session: &Arc<Session>) {
    let mut frame = Frame::new(FrameType::Settings);
    frame.payload.push(Encoding::Hb1 as u8);
    if let Err(err) = session.send(frame) {
        handle_session_error(shared, session, &err);
    }
}

// -- Accept loop --

fn accept_loop(shared: &Arc<Shared>, state: &Arc<ListenerState>) {
    while state.running.load(Ordering::Relaxed)
        && !shared.stop_requested.load(Ordering::Relaxed)
    {
        match state.server.accept() {
            Ok(channel) => {
                if let Err(err) = add_session(shared, channel, SessionKind::Server) {
                    warn!("session creation failed: {err}");
                }
            }
            Err(err) => {
                if !state.running.load(Ordering::Relaxed)
                    || shared.stop_requested.load(Ordering::Relaxed)
                {
                    break;
                }
                warn!(
                    path = %state.server.path().display(),
                    "accept failed: {err}"
                );
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

// -- Run loop --

fn pop_frame(shared: &Shared, block: bool) -> Option<QueuedFrame> {
    let mut queue = shared.queue.lock().ok()?;
    if block {
        while queue.is_empty() && !shared.stop_requested.load(Ordering::Relaxed) {
            queue = shared.queue_cv.wait(queue).ok()?;
        }
    }
    queue.pop_front()
}

fn run_loop(shared: &Arc<Shared>, block: bool, single: bool) -> usize {
    let mut processed = 0;
    loop {
        let item = pop_frame(shared, block);
        let Some(item) = item else {
            if block && !shared.stop_requested.load(Ordering::Relaxed) {
                continue;
            }
            break;
        };
        handle_frame(shared, &item.session, item.frame);
        processed += 1;

        if single {
            break;
        }
    }
    processed
}

// -- Frame dispatch --

fn handle_frame(shared: &Arc<Shared>, session: &Arc<Session>, frame: Frame) {
    match frame.header.frame_type {
        FrameType::Ping => handle_ping(shared, session, frame),
        FrameType::Settings => handle_settings(session, &frame),
        FrameType::Goodbye => handle_goodbye(shared, session),
        FrameType::Cancel => {
            warn!(
                stream = frame.header.stream_id,
                "{} frame ignored (not implemented)",
                frame.header.frame_type.label()
            );
        }
        FrameType::Error => {
            warn!(
                session = session.id(),
                payload_len = frame.payload.len(),
                "{} frame received",
                frame.header.frame_type.label()
            );
        }
        FrameType::Data => match session.kind() {
            SessionKind::Server => handle_server_data(shared, session, frame),
            SessionKind::Client => handle_client_data(shared, frame),
        },
    }
}

fn handle_ping(shared: &Shared, session: &Arc<Session>, frame: Frame) {
    let mut response = Frame::new(FrameType::Ping);
    response.header.flags = frame.header.flags;
    response.header.stream_id = frame.header.stream_id;
    response.payload = frame.payload;
    if let Err(err) = session.send(response) {
        handle_session_error(shared, session, &err);
    }
}

fn handle_settings(session: &Arc<Session>, frame: &Frame) {
    if let Some(&byte) = frame.payload.first() {
        match Encoding::from_u8(byte) {
            Some(encoding) => session.set_peer_encoding(encoding),
            None => warn!(session = session.id(), "peer advertised unknown encoding {byte}"),
        }
    }
}

fn handle_goodbye(shared: &Shared, session: &Arc<Session>) {
    info!(session = session.id(), "peer requested goodbye");
    session.stop();
    remove_session(shared, session);
}

// -- Server data path --

#[derive(Debug)]
struct ParsedRequest {
    request: Request,
    stream_id: u64,
}

fn parse_rpc_request(payload: &[u8]) -> Result<ParsedRequest> {
    let mut reader = Reader::new(payload);
    let module_id = reader.read_varint()?;
    let interface_id = reader.read_varint()?;
    let method_id = reader.read_varint()?;
    let encoding_id = reader.read_varint()?;
    let encoding = match Encoding::from_u8(encoding_id as u8) {
        Some(encoding) if encoding_id <= u8::MAX as u64 => encoding,
        _ => return Err(RuntimeError::transport("unsupported encoding")),
    };
    let stream_id = reader.read_varint()?;
    let body = reader.read_exact(reader.remaining())?.to_vec();

    Ok(ParsedRequest {
        request: Request {
            module_id,
            interface_id,
            method_id,
            encoding,
            payload: body,
        },
        stream_id,
    })
}

fn build_response_payload(status: Status, body: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(body.len() + 2);
    crate::runtime::hb1::write_varint(&mut payload, Encoding::Hb1 as u64);
    payload.push(status as u8);
    payload.extend_from_slice(body);
    payload
}

fn parse_rpc_response(payload: &[u8]) -> Result<Response> {
    let mut reader = Reader::new(payload);
    let encoding_id = reader.read_varint()?;
    if encoding_id != Encoding::Hb1 as u64 {
        return Err(RuntimeError::transport("unsupported encoding"));
    }
    if reader.is_empty() {
        return Err(RuntimeError::transport("missing response status"));
    }
    let status_byte = reader.read_byte()?;
    let status = Status::from_u8(status_byte)
        .ok_or_else(|| RuntimeError::transport("unknown response status"))?;
    let body = reader.read_exact(reader.remaining())?.to_vec();
    Ok(Response { status, body })
}

fn handle_server_data(shared: &Arc<Shared>, session: &Arc<Session>, frame: Frame) {
    let reply_stream = frame.header.stream_id;
    let parsed = match parse_rpc_request(&frame.payload) {
        Ok(parsed) => parsed,
        Err(_) => {
            send_rpc_response(
                shared,
                session,
                reply_stream,
                Response::status_only(Status::InvalidRequest),
            );
            return;
        }
    };

    let Some(handler) = rpc::find_handler(parsed.request.interface_id) else {
        send_rpc_response(
            shared,
            session,
            reply_stream,
            Response::status_only(Status::NotFound),
        );
        return;
    };

    let request = Arc::new(parsed.request);
    let weak_session = Arc::downgrade(session);
    let responder_shared = shared.clone();
    let stream_id = reply_stream;
    let responder: rpc::Responder = Box::new(move |response| {
        if let Some(session) = Weak::upgrade(&weak_session) {
            send_rpc_response(&responder_shared, &session, stream_id, response);
        }
    });

    handler(request, responder);
}

fn send_rpc_response(
    shared: &Shared,
    session: &Arc<Session>,
    stream_id: u64,
    response: Response,
) {
    let mut reply = Frame::new(FrameType::Data);
    reply.header.flags = FLAG_END_STREAM;
    reply.header.stream_id = stream_id;
    reply.payload = build_response_payload(response.status, &response.body);
    if let Err(err) = session.send(reply) {
        handle_session_error(shared, session, &err);
    }
}

// -- Client data path --

fn handle_client_data(shared: &Arc<Shared>, frame: Frame) {
    let stream_id = frame.header.stream_id;
    let response = match parse_rpc_response(&frame.payload) {
        Ok(response) => response,
        Err(err) => {
            shared.dispatcher.close_stream(stream_id);
            error!(stream = stream_id, "failed to decode response: {err}");
            return;
        }
    };

    let Some(handler) = shared.dispatcher.take_response_handler(stream_id) else {
        warn!(stream = stream_id, "no response handler for stream");
        return;
    };

    let executor = shared
        .executor
        .read()
        .map(|executor| executor.clone())
        .ok();
    match executor {
        Some(executor) => {
            executor.schedule(Box::new(move || handler(response)));
        }
        None => handler(response),
    }
}

#[cfg(test)]
#[path = "../tests/t_context.rs"]
mod tests;
