use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{SocketState, Stream};

/// Timeouts and socket options for [`TcpTransport`].
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Upper bound for a single connection attempt.
    pub connect_timeout: Duration,
    /// Read timeout. A read that times out reports "no data" (`Ok(0)`).
    pub read_timeout: Duration,
    /// Write timeout.
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm.
    pub nodelay: bool,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_millis(50),
            write_timeout: Some(Duration::from_secs(1)),
            nodelay: true,
        }
    }
}

/// TCP client stream to one host/port that can be connected repeatedly.
pub struct TcpTransport {
    host: String,
    port: u16,
    config: TcpConfig,
    socket: Option<TcpStream>,
    state: SocketState,
}

impl TcpTransport {
    /// Create a disconnected transport for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(host, port, TcpConfig::default())
    }

    /// Create a disconnected transport with explicit configuration.
    pub fn with_config(host: impl Into<String>, port: u16, config: TcpConfig) -> Self {
        Self {
            host: host.into(),
            port,
            config,
            socket: None,
            state: SocketState::Disconnected,
        }
    }

    /// Remote host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Transport configuration.
    pub fn config(&self) -> &TcpConfig {
        &self.config
    }

    fn addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Connect {
                addr: self.addr_string(),
                source,
            })?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::Resolve(self.addr_string()));
        }
        Ok(addrs)
    }

    fn open(&self, addrs: &[SocketAddr]) -> Result<TcpStream> {
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(addr, self.config.connect_timeout) {
                Ok(socket) => {
                    socket.set_read_timeout(Some(self.config.read_timeout))?;
                    socket.set_write_timeout(self.config.write_timeout)?;
                    socket.set_nodelay(self.config.nodelay)?;
                    return Ok(socket);
                }
                Err(err) => {
                    debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(TransportError::Connect {
            addr: self.addr_string(),
            source: last_err.unwrap_or_else(|| ErrorKind::NotFound.into()),
        })
    }

    fn drop_socket(&mut self) {
        if let Some(socket) = self.socket.take() {
            let _ = socket.shutdown(Shutdown::Both);
        }
        self.state = SocketState::Disconnected;
    }
}

impl Stream for TcpTransport {
    fn connect(&mut self) -> Result<()> {
        if self.state == SocketState::Connected {
            return Ok(());
        }
        self.state = SocketState::Connecting;
        let socket = match self.resolve().and_then(|addrs| self.open(&addrs)) {
            Ok(socket) => socket,
            Err(err) => {
                self.state = SocketState::Disconnected;
                return Err(err);
            }
        };
        info!(addr = %self.addr_string(), "connected");
        self.socket = Some(socket);
        self.state = SocketState::Connected;
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.socket.is_some() {
            debug!(addr = %self.addr_string(), "disconnecting");
        }
        self.drop_socket();
    }

    fn state(&self) -> SocketState {
        self.state
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotConnected)?;
        let result = loop {
            match socket.read(buf) {
                Ok(0) if !buf.is_empty() => break Err(TransportError::Closed),
                Ok(n) => break Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    break Ok(0);
                }
                Err(err) => break Err(TransportError::Io(err)),
            }
        };

        if let Err(err) = &result {
            warn!(addr = %self.addr_string(), error = %err, "primary stream lost");
            self.drop_socket();
        }
        result
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotConnected)?;
        let result = match socket.write(data) {
            Ok(n) => Ok(n),
            Err(err)
                if err.kind() == ErrorKind::Interrupted || err.kind() == ErrorKind::WouldBlock =>
            {
                Ok(0)
            }
            Err(err) => Err(TransportError::Io(err)),
        };

        if matches!(&result, Err(err) if err.is_connection_loss()) {
            self.drop_socket();
        }
        result
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state)
            .finish()
    }
}
