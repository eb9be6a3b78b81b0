/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] urprimary_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] urprimary_frame::FrameError),

    /// I/O error outside the streams (thread spawn, config file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The primary stream has never been established.
    #[error("primary stream has not been established; call start() first")]
    NotEstablished,

    /// The dashboard server answered with something unexpected.
    #[error("dashboard error: {0}")]
    Dashboard(String),

    /// An operation did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, ClientError>;
