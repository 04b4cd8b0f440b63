//! RPC request/response model and the process-wide handler registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::runtime::encoding::Encoding;

/// Status byte carried in every RPC response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0,
    ApplicationError = 1,
    InvalidRequest = 2,
    NotFound = 3,
    InternalError = 4,
}

impl Status {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Status::Ok),
            1 => Some(Status::ApplicationError),
            2 => Some(Status::InvalidRequest),
            3 => Some(Status::NotFound),
            4 => Some(Status::InternalError),
            _ => None,
        }
    }
}

/// A parsed server-bound request: routing ids plus the HB1 body.
#[derive(Debug, Clone)]
pub struct Request {
    pub module_id: u64,
    pub interface_id: u64,
    pub method_id: u64,
    pub encoding: Encoding,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub body: Vec<u8>,
}

impl Response {
    pub fn status_only(status: Status) -> Self {
        Response {
            status,
            body: Vec::new(),
        }
    }
}

/// One-shot continuation that finalizes an RPC. Server-side it sends the
/// reply frame; client-side it resumes the caller.
pub type Responder = Box<dyn FnOnce(Response) + Send + 'static>;

/// Server dispatch target for one interface. Must be callable
/// concurrently; the registry hands out clones.
pub type Handler = Arc<dyn Fn(Arc<Request>, Responder) + Send + Sync + 'static>;

fn registry() -> &'static Mutex<HashMap<u64, Handler>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u64, Handler>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Registers the handler for `interface_id`, replacing any prior one.
pub fn register_handler(interface_id: u64, handler: Handler) {
    if let Ok(mut handlers) = registry().lock() {
        handlers.insert(interface_id, handler);
    }
}

/// Returns a clone of the handler suitable for asynchronous invocation.
pub fn find_handler(interface_id: u64) -> Option<Handler> {
    registry().lock().ok()?.get(&interface_id).cloned()
}

pub fn unregister_handler(interface_id: u64) {
    if let Ok(mut handlers) = registry().lock() {
        handlers.remove(&interface_id);
    }
}

#[cfg(test)]
#[path = "../tests/t_rpc.rs"]
mod tests;
