/// Errors raised while decoding fields out of a package body.
///
/// A parse error is local to one frame: the frame is dropped and the stream
/// stays in sync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Fewer bytes remain than the requested field needs.
    #[error("out of bounds: needed {needed} bytes, {remaining} remaining")]
    OutOfBounds { needed: usize, remaining: usize },

    /// A nested sub-package declares a length its parent cannot hold.
    #[error("sub-package length {declared} invalid ({available} bytes available)")]
    InvalidSubPackageLength { declared: usize, available: usize },
}

/// Errors that can occur while reading frames off a stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header declares a length below the minimum header size.
    #[error("frame length {len} shorter than its header ({min} bytes)")]
    LengthTooSmall { len: usize, min: usize },

    /// The header declares a length above the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed (possibly mid-frame).
    #[error("connection closed")]
    ConnectionClosed,

    /// No package arrived within the stall ceiling; the peer is presumed
    /// gone even though the socket still looks open.
    #[error("no package received for {idle:?}")]
    Stalled { idle: std::time::Duration },
}

impl FrameError {
    /// Whether the error is a framing fault (the byte stream itself is
    /// still readable, but frame boundaries are lost).
    pub fn is_framing_fault(&self) -> bool {
        matches!(
            self,
            FrameError::LengthTooSmall { .. } | FrameError::FrameTooLarge { .. }
        )
    }

    /// Whether the error means the underlying stream is gone.
    pub fn is_stream_loss(&self) -> bool {
        !self.is_framing_fault()
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
