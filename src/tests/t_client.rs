use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::*;
use crate::runtime::channel::Channel;
use crate::runtime::error::{Result, RuntimeError};
use crate::runtime::frame::{Frame, FrameType};
use crate::runtime::hb1::Reader;

/// Captures sent frames; `receive` is unused by the call path.
struct CaptureChannel {
    sent: Mutex<Vec<Frame>>,
    fail_sends: AtomicBool,
}

impl CaptureChannel {
    fn new() -> Arc<Self> {
        Arc::new(CaptureChannel {
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
        })
    }

    fn sent_frames(&self) -> Vec<Frame> {
        self.sent.lock().expect("lock should not be poisoned").clone()
    }
}

impl Channel for CaptureChannel {
    fn send(&self, frame: Frame) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(RuntimeError::transport("simulated send failure"));
        }
        self.sent
            .lock()
            .expect("lock should not be poisoned")
            .push(frame);
        Ok(())
    }

    fn receive(&self) -> Result<Frame> {
        Err(RuntimeError::transport("capture channel cannot receive"))
    }

    fn close(&self) {}
}

const IDS: MethodIds = MethodIds {
    module_id: 101,
    interface_id: 202,
    method_id: 303,
};

#[test]
fn test_call_builds_routing_prefix_and_registers_handler() {
    let capture = CaptureChannel::new();
    let channel: Arc<dyn Channel> = capture.clone();
    let dispatcher = Arc::new(Dispatcher::new());

    let stream_id = call(&channel, &dispatcher, IDS, b"body-bytes", Box::new(|_| {}))
        .expect("call should succeed");
    assert_eq!(stream_id, 1);

    let frames = capture.sent_frames();
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.header.frame_type, FrameType::Data);
    assert_eq!(frame.header.stream_id, stream_id);

    // Payload: module | interface | method | encoding | stream id | body.
    let mut reader = Reader::new(&frame.payload);
    assert_eq!(reader.read_varint().unwrap(), 101);
    assert_eq!(reader.read_varint().unwrap(), 202);
    assert_eq!(reader.read_varint().unwrap(), 303);
    assert_eq!(reader.read_varint().unwrap(), 0);
    assert_eq!(reader.read_varint().unwrap(), stream_id);
    assert_eq!(reader.read_exact(reader.remaining()).unwrap(), b"body-bytes");

    // The continuation is registered under the stream id.
    assert!(dispatcher.take_response_handler(stream_id).is_some());
}

#[test]
fn test_send_failure_unregisters_continuation() {
    let capture = CaptureChannel::new();
    capture.fail_sends.store(true, Ordering::SeqCst);
    let channel: Arc<dyn Channel> = capture.clone();
    let dispatcher = Arc::new(Dispatcher::new());

    let err = call(&channel, &dispatcher, IDS, b"", Box::new(|_| {}))
        .expect_err("send failure should propagate");
    assert!(err.message.contains("simulated send failure"));
    assert!(dispatcher.take_response_handler(1).is_none());
}

#[test]
fn test_call_checked_reports_send_failure_once() {
    let capture = CaptureChannel::new();
    capture.fail_sends.store(true, Ordering::SeqCst);
    let channel: Arc<dyn Channel> = capture.clone();
    let dispatcher = Arc::new(Dispatcher::new());

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let sink = outcomes.clone();
    call_checked(&channel, &dispatcher, IDS, b"", move |outcome| {
        sink.lock().expect("lock").push(outcome.map(|_| ()));
    });

    let outcomes = outcomes.lock().expect("lock");
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_err());
}

#[test]
fn test_pending_reply_fulfill_and_wait() {
    let (slot, reply) = PendingReply::channel();
    std::thread::spawn(move || {
        slot.fulfill(Ok(42u32));
    });
    assert_eq!(reply.wait().expect("reply should arrive"), 42);
}

#[test]
fn test_pending_reply_abandoned_slot_cancels() {
    let (slot, reply) = PendingReply::<u32>::channel();
    drop(slot);
    let err = reply.wait().expect_err("dropped slot should cancel");
    assert_eq!(err.kind(), crate::runtime::error::RuntimeErrorKind::Cancelled);
}
