//! Raw client call machinery used by generated client stubs.
//!
//! A call opens a stream on the shared dispatcher, registers the response
//! continuation, and sends a DATA frame whose payload is the varint
//! routing prefix followed by the HB1-encoded request body.

use std::sync::mpsc;
use std::sync::Arc;

use crate::runtime::channel::Channel;
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::encoding::Encoding;
use crate::runtime::error::{Result, RuntimeError};
use crate::runtime::frame::{Frame, FrameType};
use crate::runtime::hb1::write_varint;
use crate::runtime::rpc::{Responder, Response, Status};

/// Routing ids for one method, baked into generated stubs.
#[derive(Debug, Clone, Copy)]
pub struct MethodIds {
    pub module_id: u64,
    pub interface_id: u64,
    pub method_id: u64,
}

/// Sends one request and registers `on_response` for its reply. Returns
/// the stream id. On a send failure the continuation is dropped without
/// being invoked and the error is returned to the caller.
pub fn call(
    channel: &Arc<dyn Channel>,
    dispatcher: &Arc<Dispatcher>,
    ids: MethodIds,
    body: &[u8],
    on_response: Responder,
) -> Result<u64> {
    let stream_id = dispatcher.open_stream();
    dispatcher.set_response_handler(stream_id, on_response);

    let mut payload = Vec::with_capacity(body.len() + 32);
    write_varint(&mut payload, ids.module_id);
    write_varint(&mut payload, ids.interface_id);
    write_varint(&mut payload, ids.method_id);
    write_varint(&mut payload, Encoding::Hb1 as u64);
    write_varint(&mut payload, stream_id);
    payload.extend_from_slice(body);

    let mut frame = Frame::new(FrameType::Data);
    frame.header.stream_id = stream_id;
    frame.payload = payload;

    if let Err(err) = channel.send(frame) {
        dispatcher.close_stream(stream_id);
        return Err(err);
    }
    Ok(stream_id)
}

/// Like [`call`], but delivers the outcome through a single callback that
/// fires exactly once: with the response when one arrives, or with the
/// send error when the request never left.
pub fn call_checked(
    channel: &Arc<dyn Channel>,
    dispatcher: &Arc<Dispatcher>,
    ids: MethodIds,
    body: &[u8],
    on_outcome: impl FnOnce(Result<Response>) + Send + 'static,
) {
    use std::sync::Mutex;

    let slot = Arc::new(Mutex::new(Some(on_outcome)));
    let response_slot = slot.clone();
    let responder: Responder = Box::new(move |response| {
        let callback = response_slot.lock().ok().and_then(|mut held| held.take());
        if let Some(callback) = callback {
            callback(Ok(response));
        }
    });

    if let Err(err) = call(channel, dispatcher, ids, body, responder) {
        let callback = slot.lock().ok().and_then(|mut held| held.take());
        if let Some(callback) = callback {
            callback(Err(err));
        }
    }
}

/// Client-visible error for a non-OK response status.
pub fn status_error(status: Status) -> RuntimeError {
    RuntimeError::internal(format!("rpc failed with status {status:?}"))
}

/// One-shot reply slot behind the `_async` call shape: fulfilled exactly
/// once by the response continuation, waited on by the caller.
pub struct PendingReply<T> {
    receiver: mpsc::Receiver<Result<T>>,
}

pub struct ReplySlot<T> {
    sender: mpsc::Sender<Result<T>>,
}

impl<T> ReplySlot<T> {
    pub fn fulfill(self, value: Result<T>) {
        let _ = self.sender.send(value);
    }
}

impl<T> PendingReply<T> {
    pub fn channel() -> (ReplySlot<T>, PendingReply<T>) {
        let (sender, receiver) = mpsc::channel();
        (ReplySlot { sender }, PendingReply { receiver })
    }

    /// Blocks until the reply arrives. If the slot is dropped unfulfilled
    /// (session torn down), the wait resolves to `Cancelled`.
    pub fn wait(self) -> Result<T> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(RuntimeError::cancelled("reply abandoned")),
        }
    }
}

#[cfg(test)]
#[path = "../tests/t_client.rs"]
mod tests;
