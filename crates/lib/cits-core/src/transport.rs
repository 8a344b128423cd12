use std::io;

use crate::message::Frame;

/// The shared-medium substrate below the link layer. One instance per node;
/// every node on the same medium hears every broadcast, its own included,
/// which is why the application layer suppresses self-origin messages.
///
/// Realizations live outside the core: the node binary speaks UDP multicast,
/// tests wire nodes over an in-memory hub.
pub trait Transport: Send + Sync {
    /// Broadcasts one frame on the medium.
    fn send(&self, frame: &Frame) -> io::Result<()>;

    /// Blocks for the next frame. Malformed input on the medium is not an
    /// error and must be discarded inside the realization; an `Err` means
    /// the substrate itself is gone.
    fn recv(&self) -> io::Result<Frame>;
}
