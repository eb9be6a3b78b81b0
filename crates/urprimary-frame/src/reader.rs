use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::codec::{decode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::package::{decode_packages, Package};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Produces decoded packages from any `Read` stream.
///
/// Partial frames are buffered across calls. A frame is only decoded once
/// all of its declared bytes have arrived; a frame whose body fails to
/// decode is logged and dropped without losing sync with the stream.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    pending: VecDeque<Package>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            pending: VecDeque::new(),
            config,
        }
    }

    /// Produce the next package if one is available without waiting.
    ///
    /// Performs at most one read on the underlying stream. Returns
    /// `Ok(None)` when the stream has no data right now (`WouldBlock`,
    /// `TimedOut`) and no complete frame is buffered.
    ///
    /// Errors are framing faults (implausible length) or stream loss
    /// (`ConnectionClosed`, I/O errors).
    pub fn poll_package(&mut self) -> Result<Option<Package>> {
        let mut read_once = false;
        loop {
            if let Some(pkg) = self.pending.pop_front() {
                return Ok(Some(pkg));
            }
            if self.decode_buffered()? {
                continue;
            }
            if read_once {
                return Ok(None);
            }
            read_once = true;

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {
                    read_once = false;
                    continue;
                }
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(None);
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next package, waiting for data as needed.
    ///
    /// Only useful on blocking streams; on a stream that keeps reporting
    /// "no data" this keeps polling.
    pub fn read_package(&mut self) -> Result<Package> {
        loop {
            if let Some(pkg) = self.poll_package()? {
                return Ok(pkg);
            }
        }
    }

    /// Decode one complete buffered frame, if any. Returns whether a frame
    /// was consumed from the buffer.
    fn decode_buffered(&mut self) -> Result<bool> {
        let Some(frame) = decode_frame(&mut self.buf, self.config.max_frame_size)? else {
            return Ok(false);
        };

        let mut decoded = Vec::new();
        if let Err(err) = decode_packages(&frame, &mut decoded) {
            warn!(
                package_type = frame.package_type,
                message_type = ?frame.message_type,
                len = frame.wire_size(),
                error = %err,
                "dropping undecodable frame"
            );
        }
        debug!(
            package_type = frame.package_type,
            packages = decoded.len(),
            "decoded frame"
        );
        self.pending.extend(decoded);
        Ok(true)
    }

    /// Discard buffered bytes and undelivered packages.
    ///
    /// Call after a framing fault or when the underlying stream has been
    /// reconnected, so stale bytes are not mixed with the new stream.
    pub fn reset(&mut self) {
        if !self.buf.is_empty() || !self.pending.is_empty() {
            debug!(
                bytes = self.buf.len(),
                packages = self.pending.len(),
                "discarding buffered input"
            );
        }
        self.buf.clear();
        self.pending.clear();
    }

    /// Number of bytes buffered but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum frame size for subsequent decoding.
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.config.max_frame_size = max_frame_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T> std::fmt::Debug for FrameReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("buffered", &self.buf.len())
            .field("pending", &self.pending.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::{encode_frame, encode_sub_package};
    use crate::package::{TextMessage, JOINT_COUNT};

    fn text_frame(text: &str) -> Vec<u8> {
        let mut wire = BytesMut::new();
        encode_frame(20, Some(0), text.as_bytes(), &mut wire).unwrap();
        wire.to_vec()
    }

    fn text(pkg: &Package) -> &str {
        match pkg {
            Package::TextMessage(TextMessage { text }) => text,
            other => panic!("expected text message, got {other:?}"),
        }
    }

    /// Hands out queued chunks one per read, then reports `WouldBlock`.
    #[derive(Default)]
    struct ChunkedReader {
        chunks: VecDeque<Vec<u8>>,
        reads: usize,
        delivered: usize,
    }

    impl ChunkedReader {
        fn push(&mut self, bytes: &[u8]) {
            self.chunks.push_back(bytes.to_vec());
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            let Some(chunk) = self.chunks.pop_front() else {
                return Err(ErrorKind::WouldBlock.into());
            };
            buf[..chunk.len()].copy_from_slice(&chunk);
            self.delivered += chunk.len();
            Ok(chunk.len())
        }
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn nine_byte_text_frame() {
        let wire = [0, 0, 0, 9, 20, 0, b'a', b'b', b'c'];
        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));

        let pkg = reader.read_package().unwrap();
        assert_eq!(text(&pkg), "abc");
        assert_eq!(reader.buffered(), 0);
        assert_eq!(reader.get_ref().position(), 9);
    }

    #[test]
    fn read_multiple_frames() {
        let mut wire = text_frame("one");
        wire.extend(text_frame("two"));
        wire.extend(text_frame("three"));

        let mut reader = FrameReader::new(Cursor::new(wire));
        assert_eq!(text(&reader.read_package().unwrap()), "one");
        assert_eq!(text(&reader.read_package().unwrap()), "two");
        assert_eq!(text(&reader.read_package().unwrap()), "three");
        assert!(matches!(
            reader.read_package(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: text_frame("slow"),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);
        assert_eq!(text(&reader.read_package().unwrap()), "slow");
    }

    #[test]
    fn no_data_is_not_an_error() {
        let mut reader = FrameReader::new(ChunkedReader::default());
        assert!(reader.poll_package().unwrap().is_none());
        assert!(reader.poll_package().unwrap().is_none());
        assert_eq!(reader.get_ref().reads, 2);
    }

    #[test]
    fn truncated_frame_completes_after_more_bytes() {
        let wire = text_frame("hello world");

        for k in 1..wire.len() {
            let mut reader = FrameReader::new(ChunkedReader::default());
            reader.get_mut().push(&wire[..k]);

            assert!(reader.poll_package().unwrap().is_none(), "k = {k}");
            assert!(reader.poll_package().unwrap().is_none(), "k = {k}");
            assert_eq!(reader.get_ref().delivered, k);
            assert_eq!(reader.buffered(), k);

            reader.get_mut().push(&wire[k..]);
            let pkg = reader.poll_package().unwrap().expect("complete frame");
            assert_eq!(text(&pkg), "hello world");
            assert_eq!(reader.buffered(), 0);
            assert!(reader.poll_package().unwrap().is_none());
        }
    }

    #[test]
    fn one_read_per_poll() {
        let mut reader = FrameReader::new(ChunkedReader::default());
        let wire = text_frame("abc");
        reader.get_mut().push(&wire[..3]);
        reader.get_mut().push(&wire[3..]);

        assert!(reader.poll_package().unwrap().is_none());
        assert_eq!(reader.get_ref().reads, 1);
        assert!(reader.poll_package().unwrap().is_some());
        assert_eq!(reader.get_ref().reads, 2);
    }

    #[test]
    fn unknown_variant_does_not_stop_the_stream() {
        let mut wire = BytesMut::new();
        encode_frame(20, Some(77), b"mystery", &mut wire).unwrap();
        encode_frame(99, None, b"\x01\x02", &mut wire).unwrap();
        encode_frame(20, Some(0), b"after", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let first = reader.read_package().unwrap();
        let second = reader.read_package().unwrap();
        let third = reader.read_package().unwrap();

        assert!(matches!(first, Package::Undecoded(ref p) if p.sub_type == Some(77)));
        assert!(matches!(second, Package::Undecoded(ref p) if p.package_type == 99));
        assert_eq!(text(&third), "after");
    }

    #[test]
    fn undecodable_frame_is_dropped_and_sync_kept() {
        let mut wire = BytesMut::new();
        // runtime exception needs 8 bytes before its text
        encode_frame(20, Some(10), &[0, 0, 1], &mut wire).unwrap();
        encode_frame(20, Some(0), b"next", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        assert_eq!(text(&reader.read_package().unwrap()), "next");
    }

    #[test]
    fn state_frame_yields_packages_across_polls() {
        let mut body = BytesMut::new();
        for dexterity in [0.1, 0.2] {
            let mut sub = BytesMut::new();
            for _ in 0..JOINT_COUNT {
                sub.put_f64(0.0);
            }
            sub.put_f64(dexterity);
            encode_sub_package(7, &sub, &mut body);
        }
        let mut wire = BytesMut::new();
        encode_frame(16, None, &body, &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let kinds: Vec<_> = (0..2)
            .map(|_| reader.read_package().unwrap().kind())
            .collect();
        assert_eq!(kinds, ["force_mode_data", "force_mode_data"]);
    }

    #[test]
    fn oversized_frame_is_a_framing_fault() {
        let mut wire = BytesMut::new();
        wire.put_u32(1024);
        wire.put_u8(16);

        let cfg = FrameConfig { max_frame_size: 64 };
        let mut reader = FrameReader::with_config(Cursor::new(wire.to_vec()), cfg);
        let err = reader.read_package().unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { .. }));
        assert!(err.is_framing_fault());
    }

    #[test]
    fn reset_discards_partial_frame() {
        let mut reader = FrameReader::new(ChunkedReader::default());
        let wire = text_frame("stale");
        reader.get_mut().push(&wire[..4]);
        assert!(reader.poll_package().unwrap().is_none());
        assert_eq!(reader.buffered(), 4);

        reader.reset();
        assert_eq!(reader.buffered(), 0);

        reader.get_mut().push(&text_frame("fresh"));
        assert_eq!(text(&reader.poll_package().unwrap().unwrap()), "fresh");
    }

    #[test]
    fn connection_closed_mid_frame() {
        let wire = text_frame("cut");
        let mut reader = FrameReader::new(Cursor::new(wire[..7].to_vec()));
        let err = reader.read_package().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert!(err.is_stream_loss());
    }

    #[test]
    fn interrupted_read_retries() {
        struct InterruptedThenData {
            interrupted: bool,
            inner: Cursor<Vec<u8>>,
        }

        impl Read for InterruptedThenData {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(ErrorKind::Interrupted.into());
                }
                self.inner.read(buf)
            }
        }

        let mut reader = FrameReader::new(InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(text_frame("ok")),
        });
        assert_eq!(text(&reader.poll_package().unwrap().unwrap()), "ok");
    }

    #[test]
    fn io_error_is_stream_loss() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(ErrorKind::ConnectionReset.into())
            }
        }

        let mut reader = FrameReader::new(Broken);
        let err = reader.poll_package().unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::ConnectionReset));
        assert!(err.is_stream_loss());
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        reader.set_max_frame_size(128);
        assert_eq!(reader.config().max_frame_size, 128);
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }
}
