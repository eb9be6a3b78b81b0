use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use urprimary_frame::{FrameConfig, DEFAULT_MAX_FRAME_SIZE};
use urprimary_transport::TcpConfig;

use crate::dashboard::DEFAULT_DASHBOARD_PORT;
use crate::error::Result;

/// Default primary interface port.
pub const DEFAULT_PRIMARY_PORT: u16 = 30001;

/// Configuration for a [`PrimaryClient`](crate::PrimaryClient).
///
/// Deserializes from JSON; every field is optional and falls back to its
/// default. Durations are in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Robot controller host name or address.
    pub host: String,
    /// Primary interface port. Default: 30001.
    pub primary_port: u16,
    /// Dashboard server port. Default: 29999.
    pub dashboard_port: u16,
    /// Control-mode polling interval. Default: 50 ms.
    pub poll_interval_ms: u64,
    /// Minimum time between reconnect attempts after stream loss.
    /// Default: 1000 ms.
    pub reconnect_backoff_ms: u64,
    /// TCP connect timeout. Default: 5000 ms.
    pub connect_timeout_ms: u64,
    /// Primary stream read timeout; bounds how long the pipeline thread
    /// holds the stream per read. Default: 20 ms.
    pub read_timeout_ms: u64,
    /// Dashboard response timeout. Default: 1000 ms.
    pub dashboard_timeout_ms: u64,
    /// Give up on a script whose writes keep stalling. Default: 2000 ms.
    pub send_timeout_ms: u64,
    /// Reconnect when the primary stream delivers no package for this long.
    /// The controller streams robot state continuously, so silence means a
    /// dead peer. 0 disables the check. Default: 5000 ms.
    pub stall_timeout_ms: u64,
    /// Maximum accepted frame size. Default: 64 KiB.
    pub max_frame_size: usize,
    /// Expected calibration fingerprint (`calib_...`). Checked against the
    /// first kinematics package when set.
    pub calibration_checksum: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            primary_port: DEFAULT_PRIMARY_PORT,
            dashboard_port: DEFAULT_DASHBOARD_PORT,
            poll_interval_ms: 50,
            reconnect_backoff_ms: 1000,
            connect_timeout_ms: 5000,
            read_timeout_ms: 20,
            dashboard_timeout_ms: 1000,
            send_timeout_ms: 2000,
            stall_timeout_ms: 5000,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            calibration_checksum: None,
        }
    }
}

impl ClientConfig {
    /// Default configuration for `host`.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }

    pub fn dashboard_timeout(&self) -> Duration {
        Duration::from_millis(self.dashboard_timeout_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Stall ceiling for the primary pipeline, `None` when disabled.
    pub fn stall_timeout(&self) -> Option<Duration> {
        (self.stall_timeout_ms > 0).then(|| Duration::from_millis(self.stall_timeout_ms))
    }

    /// Transport settings for the primary and dashboard streams.
    pub fn tcp_config(&self) -> TcpConfig {
        TcpConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms.max(1)),
            ..TcpConfig::default()
        }
    }

    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_frame_size: self.max_frame_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.primary_port, 30001);
        assert_eq!(config.dashboard_port, 29999);
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.frame_config().max_frame_size, 64 * 1024);
        assert!(config.calibration_checksum.is_none());
        assert_eq!(config.stall_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn zero_stall_timeout_disables_the_check() {
        let config = ClientConfig::from_json(r#"{"stall_timeout_ms": 0}"#).unwrap();
        assert_eq!(config.stall_timeout(), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ClientConfig::from_json(
            r#"{"host": "192.168.56.101", "poll_interval_ms": 10, "calibration_checksum": "calib_0123456789abcdef"}"#,
        )
        .unwrap();
        assert_eq!(config.host, "192.168.56.101");
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.primary_port, 30001);
        assert_eq!(
            config.calibration_checksum.as_deref(),
            Some("calib_0123456789abcdef")
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ClientConfig::from_json(r#"{"hots": "x"}"#).unwrap_err();
        assert!(matches!(err, crate::ClientError::Json(_)));
    }

    #[test]
    fn zero_read_timeout_is_clamped() {
        let config = ClientConfig {
            read_timeout_ms: 0,
            ..ClientConfig::for_host("robot")
        };
        assert_eq!(config.tcp_config().read_timeout, Duration::from_millis(1));
        assert_eq!(config.host, "robot");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ClientConfig::load("/nonexistent/urprimary.json").unwrap_err();
        assert!(matches!(err, crate::ClientError::Io(_)));
    }
}
