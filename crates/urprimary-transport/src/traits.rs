use std::fmt;

use crate::error::Result;

/// Connection state of a [`Stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketState {
    /// Never connected, or explicitly disconnected.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// Connected and usable for reads and writes.
    Connected,
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SocketState::Disconnected => "disconnected",
            SocketState::Connecting => "connecting",
            SocketState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// A reconnectable byte stream to the robot controller.
///
/// This is the only I/O boundary of the driver. Implementations own their
/// socket and may replace it on every [`connect`](Stream::connect).
///
/// `read` reports how many bytes are currently available: `Ok(0)` means
/// "no data right now" (for example a read timeout elapsed), never end of
/// stream. A closed or reset connection is reported as an error.
pub trait Stream: Send + 'static {
    /// Open (or reopen) the connection.
    fn connect(&mut self) -> Result<()>;

    /// Close the connection. Disconnecting a closed stream is a no-op.
    fn disconnect(&mut self);

    /// Current connection state.
    fn state(&self) -> SocketState;

    /// Read whatever bytes are currently available into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write bytes, returning how many were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Whether the stream is currently connected.
    fn is_connected(&self) -> bool {
        self.state() == SocketState::Connected
    }
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }

    fn state(&self) -> SocketState {
        (**self).state()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }
}
