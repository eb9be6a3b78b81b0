//! Client for the robot controller's primary interface.
//!
//! urprimary decodes the controller's binary state and message stream,
//! dispatches typed packages to consumers, and uploads scripts while
//! tracking whether the robot is in local or remote control.
//!
//! # Crate Structure
//!
//! - [`transport`]: stream abstraction and TCP implementation
//! - [`frame`]: frame codec, typed packages and the consumer interface
//! - [`client`]: pipeline engine, primary client and dashboard collaborator

/// Re-export transport types.
pub mod transport {
    pub use urprimary_transport::*;
}

/// Re-export frame and package types.
pub mod frame {
    pub use urprimary_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use urprimary_client::*;
}

pub use urprimary_client::{connect, connect_with_config, ClientConfig, ClientError, PrimaryClient};
pub use urprimary_frame::{Package, PackageConsumer};
