//! Framing and typed packages for the robot controller's primary interface.
//!
//! Every frame starts with a big-endian header:
//! - a 4-byte total length (header included)
//! - a 1-byte package type
//! - for robot messages and program state, a 1-byte message type
//!
//! [`FrameReader`] turns a byte stream into [`Package`]s without ever
//! blocking on a partial frame, and [`PackageConsumer`] receives them.

pub mod bin_parser;
pub mod codec;
#[cfg(feature = "async")]
pub mod codec_async;
pub mod consumer;
pub mod error;
pub mod package;
pub mod reader;
pub mod script;

pub use bin_parser::{BinParser, WireValue};
pub use codec::{
    decode_frame, encode_frame, encode_sub_package, FrameConfig, PackageType, RawFrame,
    DEFAULT_MAX_FRAME_SIZE, HEADER_SIZE, MESSAGE_HEADER_SIZE,
};
#[cfg(feature = "async")]
pub use codec_async::PrimaryCodec;
pub use consumer::PackageConsumer;
pub use error::{FrameError, ParseError, Result};
pub use package::{decode_packages, Package, PackageBody, UndecodedPackage};
pub use reader::FrameReader;
pub use script::{encode_script, ScriptWriter, DEFAULT_SEND_TIMEOUT};
