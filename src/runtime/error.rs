//! Runtime error taxonomy shared by the codec, transport, and reactor.

use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Wire framing or codec failure, peer closed, invalid magic or CRC.
    Transport,
    /// Reserved for higher layers; the core never raises it.
    Timeout,
    /// Local close or stop interrupted the operation.
    Cancelled,
    /// Contract violation, e.g. wire-type mismatch at encode.
    Internal,
    /// Reserved features: capability wire type, unknown encodings.
    Unimplemented,
}

impl Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            RuntimeErrorKind::Transport => "transport error",
            RuntimeErrorKind::Timeout => "timeout",
            RuntimeErrorKind::Cancelled => "cancelled",
            RuntimeErrorKind::Internal => "internal error",
            RuntimeErrorKind::Unimplemented => "unimplemented",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Transport, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Cancelled, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Internal, message)
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Unimplemented, message)
    }

    pub fn kind(&self) -> RuntimeErrorKind {
        self.kind
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
