use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: total length (4) + package type (1) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Header of frames that carry a message type byte after the package type.
pub const MESSAGE_HEADER_SIZE: usize = HEADER_SIZE + 1;

/// Default maximum frame size (header included): 64 KiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Top-level package type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PackageType {
    /// Continuously streamed telemetry made of sub-packages.
    RobotState = 16,
    /// Discrete robot events; carries a message type byte.
    RobotMessage = 20,
    /// Program state events; carries a message type byte.
    ProgramState = 25,
}

impl PackageType {
    /// Map a wire code to a known package type.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            16 => Some(Self::RobotState),
            20 => Some(Self::RobotMessage),
            25 => Some(Self::ProgramState),
            _ => None,
        }
    }

    /// Wire code of this package type.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether frames of this type carry a message type byte.
    pub fn has_message_type(self) -> bool {
        matches!(self, Self::RobotMessage | Self::ProgramState)
    }

    /// Header size of frames of this type.
    pub fn header_size(self) -> usize {
        if self.has_message_type() {
            MESSAGE_HEADER_SIZE
        } else {
            HEADER_SIZE
        }
    }
}

/// One complete frame isolated from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Top-level package type code.
    pub package_type: u8,
    /// Message type byte, present for message-carrying package types.
    pub message_type: Option<u8>,
    /// Body bytes following the header.
    pub body: Bytes,
}

impl RawFrame {
    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + usize::from(self.message_type.is_some()) + self.body.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬────────────────┬──────────────────┐
/// │ Length (4B)  │ Type     │ Message type   │ Body             │
/// │ BE, total    │ (1B)     │ (1B, optional) │                  │
/// └──────────────┴──────────┴────────────────┴──────────────────┘
/// ```
pub fn encode_frame(
    package_type: u8,
    message_type: Option<u8>,
    body: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let total = HEADER_SIZE + usize::from(message_type.is_some()) + body.len();
    if total > u32::MAX as usize {
        return Err(FrameError::FrameTooLarge {
            size: total,
            max: u32::MAX as usize,
        });
    }
    dst.reserve(total);
    dst.put_u32(total as u32);
    dst.put_u8(package_type);
    if let Some(message_type) = message_type {
        dst.put_u8(message_type);
    }
    dst.put_slice(body);
    Ok(())
}

/// Encode a robot state sub-package (`length`, `state type`, body).
pub fn encode_sub_package(state_type: u8, body: &[u8], dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE + body.len());
    dst.put_u32((HEADER_SIZE + body.len()) as u32);
    dst.put_u8(state_type);
    dst.put_slice(body);
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly the frame's declared length.
pub fn decode_frame(src: &mut BytesMut, max_frame_size: usize) -> Result<Option<RawFrame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let total = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
    let package_type = src[4];
    let header_size = PackageType::from_code(package_type)
        .map(PackageType::header_size)
        .unwrap_or(HEADER_SIZE);

    if total < header_size {
        return Err(FrameError::LengthTooSmall {
            len: total,
            min: header_size,
        });
    }
    if total > max_frame_size {
        return Err(FrameError::FrameTooLarge {
            size: total,
            max: max_frame_size,
        });
    }

    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let message_type = if header_size == MESSAGE_HEADER_SIZE {
        Some(src.get_u8())
    } else {
        None
    };
    let body = src.split_to(total - header_size).freeze();

    Ok(Some(RawFrame {
        package_type,
        message_type,
        body,
    }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum frame size in bytes, header included. Default: 64 KiB.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_message_frame() {
        let mut buf = BytesMut::new();
        encode_frame(20, Some(0), b"abc", &mut buf).unwrap();

        assert_eq!(buf.as_ref(), &[0, 0, 0, 9, 20, 0, b'a', b'b', b'c']);

        let frame = decode_frame(&mut buf, DEFAULT_MAX_FRAME_SIZE)
            .unwrap()
            .unwrap();

        assert_eq!(frame.package_type, 20);
        assert_eq!(frame.message_type, Some(0));
        assert_eq!(frame.body.as_ref(), b"abc");
        assert_eq!(frame.wire_size(), 9);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_state_frame_has_no_message_type() {
        let mut buf = BytesMut::new();
        encode_frame(16, None, &[1, 2, 3], &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEFAULT_MAX_FRAME_SIZE)
            .unwrap()
            .unwrap();
        assert_eq!(frame.package_type, 16);
        assert_eq!(frame.message_type, None);
        assert_eq!(frame.body.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_FRAME_SIZE).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_incomplete_body() {
        let mut buf = BytesMut::new();
        encode_frame(20, Some(0), b"hello", &mut buf).unwrap();
        buf.truncate(MESSAGE_HEADER_SIZE + 2);

        let result = decode_frame(&mut buf, DEFAULT_MAX_FRAME_SIZE).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), MESSAGE_HEADER_SIZE + 2);
    }

    #[test]
    fn test_decode_length_below_header() {
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00, 0x03, 16][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_FRAME_SIZE);
        assert!(matches!(result, Err(FrameError::LengthTooSmall { len: 3, .. })));
    }

    #[test]
    fn test_message_frame_needs_message_type() {
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00, 0x05, 20][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_FRAME_SIZE);
        assert!(matches!(
            result,
            Err(FrameError::LengthTooSmall { len: 5, min: 6 })
        ));
    }

    #[test]
    fn test_decode_frame_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u32(1024 * 1024);
        buf.put_u8(16);

        let result = decode_frame(&mut buf, DEFAULT_MAX_FRAME_SIZE);
        assert!(matches!(result, Err(FrameError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(20, Some(0), b"first", &mut buf).unwrap();
        encode_frame(99, None, b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_FRAME_SIZE)
            .unwrap()
            .unwrap();
        assert_eq!(f1.body.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, DEFAULT_MAX_FRAME_SIZE)
            .unwrap()
            .unwrap();
        assert_eq!(f2.package_type, 99);
        assert_eq!(f2.body.as_ref(), b"second");

        assert!(buf.is_empty());
    }

    #[test]
    fn test_sub_package_encoding() {
        let mut buf = BytesMut::new();
        encode_sub_package(7, &[0xAA], &mut buf);
        assert_eq!(buf.as_ref(), &[0, 0, 0, 6, 7, 0xAA]);
    }

    #[test]
    fn test_package_type_codes() {
        assert_eq!(PackageType::from_code(16), Some(PackageType::RobotState));
        assert_eq!(PackageType::from_code(20), Some(PackageType::RobotMessage));
        assert_eq!(PackageType::from_code(25), Some(PackageType::ProgramState));
        assert_eq!(PackageType::from_code(5), None);
        assert_eq!(PackageType::RobotMessage.code(), 20);
        assert_eq!(PackageType::RobotState.header_size(), HEADER_SIZE);
    }
}
