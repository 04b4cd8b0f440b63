//! UNIX domain socket transport.
//!
//! Frames are written and read in full; `Interrupted` reads and writes are
//! retried. `close()` shuts the stream down in both directions, which
//! wakes a receiver blocked in `read` so it can report `Cancelled` instead
//! of hanging.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::runtime::channel::Channel;
use crate::runtime::error::{Result, RuntimeError};
use crate::runtime::frame::{decode_header, encode_header, Frame, FRAME_HEADER_SIZE};

pub struct UdsChannel {
    stream: UnixStream,
    closed: AtomicBool,
    send_lock: Mutex<()>,
    recv_lock: Mutex<()>,
}

impl UdsChannel {
    fn new(stream: UnixStream) -> Self {
        UdsChannel {
            stream,
            closed: AtomicBool::new(false),
            send_lock: Mutex::new(()),
            recv_lock: Mutex::new(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn write_full(&self, data: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < data.len() {
            match (&self.stream).write(&data[written..]) {
                Ok(0) => return Err(RuntimeError::transport("write returned zero bytes")),
                Ok(n) => written += n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    if self.is_closed() {
                        return Err(RuntimeError::cancelled("Channel closed"));
                    }
                    return Err(RuntimeError::transport(format!("write: {err}")));
                }
            }
        }
        Ok(())
    }

    fn read_full(&self, buffer: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buffer.len() {
            match (&self.stream).read(&mut buffer[filled..]) {
                Ok(0) => {
                    if self.is_closed() {
                        return Err(RuntimeError::cancelled("Channel closed"));
                    }
                    return Err(RuntimeError::transport("peer closed connection"));
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    if self.is_closed() {
                        return Err(RuntimeError::cancelled("Channel closed"));
                    }
                    return Err(RuntimeError::transport(format!("read: {err}")));
                }
            }
        }
        Ok(())
    }
}

impl Channel for UdsChannel {
    fn send(&self, mut frame: Frame) -> Result<()> {
        if self.is_closed() {
            return Err(RuntimeError::transport("channel closed"));
        }
        if frame.payload.len() > u32::MAX as usize {
            return Err(RuntimeError::transport("frame payload too large"));
        }
        frame.header.length = frame.payload.len() as u32;
        let header = encode_header(&frame.header);

        let _guard = self
            .send_lock
            .lock()
            .map_err(|_| RuntimeError::internal("send lock poisoned"))?;
        self.write_full(&header)?;
        if !frame.payload.is_empty() {
            self.write_full(&frame.payload)?;
        }
        Ok(())
    }

    fn receive(&self) -> Result<Frame> {
        let _guard = self
            .recv_lock
            .lock()
            .map_err(|_| RuntimeError::internal("receive lock poisoned"))?;

        let mut header_buffer = [0u8; FRAME_HEADER_SIZE];
        self.read_full(&mut header_buffer)?;
        let header = decode_header(&header_buffer)?;

        let mut payload = vec![0u8; header.length as usize];
        if header.length > 0 {
            self.read_full(&mut payload)?;
        }
        Ok(Frame { header, payload })
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Drop for UdsChannel {
    fn drop(&mut self) {
        self.close();
    }
}

// -- Server --

pub struct UdsServer {
    listener: UnixListener,
    path: PathBuf,
    closed: AtomicBool,
}

impl UdsServer {
    /// Accepts one connection. Returns an error once the server has been
    /// closed; `close()` wakes a blocked accept.
    pub fn accept(&self) -> Result<Arc<dyn Channel>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RuntimeError::transport("server socket closed"));
        }
        match self.listener.accept() {
            Ok((stream, _addr)) => {
                if self.closed.load(Ordering::Acquire) {
                    return Err(RuntimeError::transport("server socket closed"));
                }
                Ok(Arc::new(UdsChannel::new(stream)))
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => self.accept(),
            Err(err) => {
                if self.closed.load(Ordering::Acquire) {
                    return Err(RuntimeError::transport("server socket closed"));
                }
                Err(RuntimeError::transport(format!("accept: {err}")))
            }
        }
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Nudge a blocked accept awake with a throwaway connection.
        let _ = UnixStream::connect(&self.path);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UdsServer {
    fn drop(&mut self) {
        self.close();
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Binds a listening socket at `path`, replacing any stale socket file.
pub fn listen(path: impl AsRef<Path>) -> Result<Arc<UdsServer>> {
    let path = path.as_ref().to_path_buf();
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)
        .map_err(|err| RuntimeError::transport(format!("bind {}: {err}", path.display())))?;
    Ok(Arc::new(UdsServer {
        listener,
        path,
        closed: AtomicBool::new(false),
    }))
}

pub fn connect(path: impl AsRef<Path>) -> Result<Arc<dyn Channel>> {
    let path = path.as_ref();
    let stream = UnixStream::connect(path)
        .map_err(|err| RuntimeError::transport(format!("connect {}: {err}", path.display())))?;
    Ok(Arc::new(UdsChannel::new(stream)))
}

/// A pair of connected in-process channels, handy for tests and embedders.
pub fn socket_pair() -> Result<(Arc<dyn Channel>, Arc<dyn Channel>)> {
    let (first, second) = UnixStream::pair()
        .map_err(|err| RuntimeError::transport(format!("socketpair: {err}")))?;
    Ok((
        Arc::new(UdsChannel::new(first)),
        Arc::new(UdsChannel::new(second)),
    ))
}
