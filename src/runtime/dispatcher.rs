//! Client-side stream table: monotonic stream ids and the response
//! continuation registered for each open stream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::runtime::rpc::Responder;

pub struct Dispatcher {
    next_stream_id: AtomicU64,
    handlers: Mutex<HashMap<u64, Responder>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            next_stream_id: AtomicU64::new(1),
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the next stream id. No continuation is registered yet.
    pub fn open_stream(&self) -> u64 {
        self.next_stream_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn set_response_handler(&self, stream_id: u64, handler: Responder) {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.insert(stream_id, handler);
        }
    }

    /// Atomically removes and returns the continuation for `stream_id`.
    pub fn take_response_handler(&self, stream_id: u64) -> Option<Responder> {
        self.handlers.lock().ok()?.remove(&stream_id)
    }

    /// Drops any registered continuation without invoking it.
    pub fn close_stream(&self, stream_id: u64) {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.remove(&stream_id);
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/t_dispatcher.rs"]
mod tests;
