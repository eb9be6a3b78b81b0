//! `tokio_util` codec for reading packages off an async byte stream.

use std::collections::VecDeque;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::warn;

use crate::codec::{decode_frame, FrameConfig};
use crate::error::FrameError;
use crate::package::{decode_packages, Package};

/// Decodes primary interface frames into [`Package`]s.
///
/// Use with `tokio_util::codec::FramedRead`. Robot state frames that carry
/// several sub-packages yield them one per `decode` call, in wire order.
#[derive(Debug, Default)]
pub struct PrimaryCodec {
    config: FrameConfig,
    pending: VecDeque<Package>,
}

impl PrimaryCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            config,
            pending: VecDeque::new(),
        }
    }
}

impl Decoder for PrimaryCodec {
    type Item = Package;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Package>, FrameError> {
        loop {
            if let Some(pkg) = self.pending.pop_front() {
                return Ok(Some(pkg));
            }
            let Some(frame) = decode_frame(src, self.config.max_frame_size)? else {
                return Ok(None);
            };
            let mut decoded = Vec::new();
            if let Err(err) = decode_packages(&frame, &mut decoded) {
                warn!(
                    package_type = frame.package_type,
                    error = %err,
                    "dropping undecodable frame"
                );
            }
            self.pending.extend(decoded);
        }
    }
}
