//! Pipeline engine and primary client for the robot controller.
//!
//! [`Pipeline`] drives a [`Producer`] on a background thread and hands each
//! package to a [`PackageConsumer`](urprimary_frame::PackageConsumer).
//! [`PrimaryClient`] owns one pipeline over the primary stream, sends
//! scripts, and watches the control mode through the dashboard server so
//! it can reconnect the stream whenever the mode flips.
//!
//! ```no_run
//! let client = urprimary_client::connect("192.168.56.101")?;
//! client.send_script("textmsg(\"hello\")")?;
//! # Ok::<(), urprimary_client::ClientError>(())
//! ```

pub mod calibration;
pub mod client;
pub mod config;
pub mod connector;
pub mod consumer;
pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod pipeline;

pub use calibration::{calibration_hash, CalibrationChecker};
pub use client::{ControlMode, PrimaryClient};
pub use config::{ClientConfig, DEFAULT_PRIMARY_PORT};
pub use connector::{connect, connect_with_config, TcpPrimaryClient};
pub use consumer::{ErrorCodeCache, PrimaryConsumer, READ_ONLY_SOCKET_CODE};
pub use dashboard::{
    query_remote_control, DashboardClient, DashboardConnection, DEFAULT_DASHBOARD_PORT,
    REMOTE_CONTROL_QUERY, REMOTE_CONTROL_TOKEN,
};
pub use error::{ClientError, Result};
pub use handlers::{ErrorCodeLogger, KeyMessageLogger, LatestPackage, PackageHandler};
pub use pipeline::{Notifier, NullNotifier, Pipeline, PipelineConfig, Producer};
