//! Stream abstraction for the robot controller's TCP interfaces.
//!
//! This is the lowest layer of urprimary. It defines the [`Stream`]
//! collaborator every higher layer reads from and writes to:
//! - [`TcpTransport`], a reconnectable TCP client stream
//! - [`SharedStream`], a lock-guarded handle that lets one thread read
//!   while another writes or reconnects
//!
//! Everything else builds on top of these types.

pub mod error;
pub mod shared;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use shared::SharedStream;
pub use tcp::{TcpConfig, TcpTransport};
pub use traits::{SocketState, Stream};
