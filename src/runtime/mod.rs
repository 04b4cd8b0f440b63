//! HB1 RPC runtime: wire codec, frame layer, UNIX-domain transport,
//! stream dispatch, executors, and the reactor context that generated
//! bindings run on.

pub mod channel;
pub mod client;
pub mod context;
pub mod dispatcher;
pub mod encoding;
pub mod error;
pub mod executor;
pub mod frame;
pub mod hb1;
pub mod rpc;
pub mod uds;

pub use error::{Result, RuntimeError, RuntimeErrorKind};
