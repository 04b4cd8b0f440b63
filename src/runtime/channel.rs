use crate::runtime::encoding::Encoding;
use crate::runtime::error::Result;
use crate::runtime::frame::Frame;

/// A bidirectional, reliable, ordered, framed byte-stream endpoint.
///
/// `receive` blocks until a full frame arrives, the peer closes
/// (`Transport "peer closed connection"`), or a concurrent local `close`
/// cancels it (`Cancelled "Channel closed"`). Implementations must wake a
/// blocked receiver promptly on close.
pub trait Channel: Send + Sync {
    fn encoding(&self) -> Encoding {
        Encoding::Hb1
    }

    fn send(&self, frame: Frame) -> Result<()>;
    fn receive(&self) -> Result<Frame>;
    fn close(&self);
}
