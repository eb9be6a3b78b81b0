use std::io::{self, ErrorKind, Read, Write};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Result, TransportError};
use crate::traits::{SocketState, Stream};

/// A [`Stream`] shared between the pipeline's reader thread, script writers
/// and the reconnect logic.
///
/// Every operation holds the lock only for one underlying call, so a reader
/// blocked in a timed read delays writers by at most one read timeout.
///
/// The `std::io` impls adapt the collaborator's conventions: "no data" maps
/// to `WouldBlock`, a closed connection maps to end of stream (`Ok(0)`).
pub struct SharedStream<S> {
    inner: Arc<Mutex<S>>,
}

impl<S: Stream> SharedStream<S> {
    /// Wrap a stream for shared use.
    pub fn new(stream: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stream)),
        }
    }

    /// Lock the stream for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock()
    }

    /// Connect the underlying stream.
    pub fn connect(&self) -> Result<()> {
        self.inner.lock().connect()
    }

    /// Disconnect the underlying stream.
    pub fn disconnect(&self) {
        self.inner.lock().disconnect()
    }

    /// Current connection state.
    pub fn state(&self) -> SocketState {
        self.inner.lock().state()
    }

    /// Drop any current connection and connect again, atomically with
    /// respect to other users of this handle.
    pub fn reconnect(&self) -> Result<()> {
        let mut stream = self.inner.lock();
        if stream.state() == SocketState::Connected {
            stream.disconnect();
        }
        stream.connect()
    }
}

impl<S> Clone for SharedStream<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Stream> Read for SharedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.lock().read(buf) {
            Ok(0) if !buf.is_empty() => Err(ErrorKind::WouldBlock.into()),
            Ok(n) => Ok(n),
            Err(TransportError::Closed) => Ok(0),
            Err(err) => Err(into_io_error(err)),
        }
    }
}

impl<S: Stream> Write for SharedStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.lock().write(buf) {
            Ok(0) if !buf.is_empty() => Err(ErrorKind::WouldBlock.into()),
            Ok(n) => Ok(n),
            Err(err) => Err(into_io_error(err)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S> std::fmt::Debug for SharedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStream")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

fn into_io_error(err: TransportError) -> io::Error {
    match err {
        TransportError::Io(io) => io,
        TransportError::Connect { source, .. } => source,
        TransportError::NotConnected => ErrorKind::NotConnected.into(),
        TransportError::Closed => ErrorKind::UnexpectedEof.into(),
        other => io::Error::other(other.to_string()),
    }
}
