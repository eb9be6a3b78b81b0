//! Line-oriented dashboard server client, used to query the control mode.

use std::time::{Duration, Instant};

use tracing::{debug, info};
use urprimary_transport::{SocketState, Stream, TcpConfig, TcpTransport};

use crate::error::{ClientError, Result};

/// Default dashboard server port.
pub const DEFAULT_DASHBOARD_PORT: u16 = 29999;

/// Dashboard command that asks whether the robot is in remote control.
pub const REMOTE_CONTROL_QUERY: &str = "is in remote control";

/// Answer to [`REMOTE_CONTROL_QUERY`] meaning remote control.
pub const REMOTE_CONTROL_TOKEN: &str = "true";

/// The control-mode collaborator: a request/response line protocol.
pub trait DashboardConnection: Send + 'static {
    /// Open the connection, consuming any greeting.
    fn connect(&mut self) -> Result<()>;

    /// Close the connection. Safe to call when already closed.
    fn disconnect(&mut self);

    /// Current connection state.
    fn state(&self) -> SocketState;

    /// Send one command line and return the one-line response, without its
    /// line terminator.
    fn send_and_receive(&mut self, command: &str) -> Result<String>;
}

impl<D: DashboardConnection + ?Sized> DashboardConnection for Box<D> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }

    fn state(&self) -> SocketState {
        (**self).state()
    }

    fn send_and_receive(&mut self, command: &str) -> Result<String> {
        (**self).send_and_receive(command)
    }
}

/// Ask the dashboard whether the robot is in remote control.
pub fn query_remote_control<D: DashboardConnection + ?Sized>(dashboard: &mut D) -> Result<bool> {
    let response = dashboard.send_and_receive(REMOTE_CONTROL_QUERY)?;
    Ok(response.trim() == REMOTE_CONTROL_TOKEN)
}

/// Dashboard client over TCP.
pub struct DashboardClient {
    transport: TcpTransport,
    response_timeout: Duration,
    buf: Vec<u8>,
}

impl DashboardClient {
    /// Create a disconnected client for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(host, port, TcpConfig::default(), Duration::from_secs(1))
    }

    /// Create a disconnected client with explicit transport configuration
    /// and response timeout.
    pub fn with_config(
        host: impl Into<String>,
        port: u16,
        config: TcpConfig,
        response_timeout: Duration,
    ) -> Self {
        Self {
            transport: TcpTransport::with_config(host, port, config),
            response_timeout,
            buf: Vec::new(),
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');

        let deadline = Instant::now() + self.response_timeout;
        let mut offset = 0;
        while offset < data.len() {
            match self.transport.write(&data[offset..])? {
                0 if Instant::now() >= deadline => {
                    return Err(ClientError::Timeout(self.response_timeout))
                }
                n => offset += n,
            }
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.response_timeout;
        loop {
            if let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.buf.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line[..pos]);
                return Ok(text.trim_end_matches('\r').to_string());
            }
            if Instant::now() >= deadline {
                // A late reply would otherwise answer the next request.
                self.buf.clear();
                self.transport.disconnect();
                return Err(ClientError::Timeout(self.response_timeout));
            }

            let mut chunk = [0u8; 512];
            let n = self.transport.read(&mut chunk)?;
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

impl DashboardConnection for DashboardClient {
    fn connect(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            return Ok(());
        }
        self.buf.clear();
        self.transport.connect()?;
        match self.read_line() {
            Ok(banner) => {
                info!(banner = %banner, "dashboard connected");
                Ok(())
            }
            Err(err) => {
                self.transport.disconnect();
                Err(err)
            }
        }
    }

    fn disconnect(&mut self) {
        if self.transport.state() != SocketState::Disconnected {
            self.transport.disconnect();
            debug!("dashboard disconnected");
        }
        self.buf.clear();
    }

    fn state(&self) -> SocketState {
        self.transport.state()
    }

    fn send_and_receive(&mut self, command: &str) -> Result<String> {
        self.write_line(command)?;
        let response = self.read_line()?;
        debug!(command, response = %response, "dashboard exchange");
        Ok(response)
    }
}

impl std::fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardClient")
            .field("transport", &self.transport)
            .finish()
    }
}
