/// Errors that can occur in stream transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// The address could not be resolved to any socket address.
    #[error("could not resolve address {0}")]
    Resolve(String),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation required a connected stream.
    #[error("stream is not connected")]
    NotConnected,

    /// The remote end closed the connection.
    #[error("connection closed by peer")]
    Closed,
}

impl TransportError {
    /// Whether this error means the stream is gone and must be reconnected.
    pub fn is_connection_loss(&self) -> bool {
        match self {
            TransportError::NotConnected | TransportError::Closed => true,
            TransportError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::UnexpectedEof
            ),
            TransportError::Connect { .. } | TransportError::Resolve(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
