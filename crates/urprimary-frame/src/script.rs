use std::io::{ErrorKind, Write};
use std::thread;
use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// How long a send may keep retrying writes that report "would block".
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Append the script to `dst` with exactly one trailing line terminator.
///
/// A script that already ends in `\n` is sent unchanged; otherwise `\n` is
/// appended.
pub fn encode_script(script: &str, dst: &mut BytesMut) {
    dst.reserve(script.len() + 1);
    dst.put_slice(script.as_bytes());
    if !script.ends_with('\n') {
        dst.put_u8(b'\n');
    }
}

/// Writes script source to any `Write` stream.
pub struct ScriptWriter<T> {
    inner: T,
    buf: BytesMut,
    send_timeout: Duration,
}

impl<T: Write> ScriptWriter<T> {
    /// Create a new script writer.
    pub fn new(inner: T) -> Self {
        Self::with_timeout(inner, DEFAULT_SEND_TIMEOUT)
    }

    /// Create a script writer that gives up on a stalled stream after
    /// `send_timeout`.
    pub fn with_timeout(inner: T, send_timeout: Duration) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            send_timeout,
        }
    }

    /// Encode and send one script (blocking). Returns the number of bytes
    /// written, terminator included.
    pub fn send(&mut self, script: &str) -> Result<usize> {
        self.buf.clear();
        encode_script(script, &mut self.buf);

        let deadline = Instant::now() + self.send_timeout;
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(FrameError::Io(ErrorKind::TimedOut.into()));
                    }
                    thread::yield_now();
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        debug!(len = offset, "script sent");
        Ok(offset)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
