//! Display distribution error types.

/// Errors that can occur while distributing decoded lines.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Remote display connection could not be established.
    #[error("cannot reach display server at {addr}: {detail}")]
    ConnectFailed { addr: String, detail: String },

    /// Malformed frame on the display connection.
    #[error("display protocol error: {detail}")]
    Protocol { detail: String },

    /// Peer closed the connection mid-stream.
    #[error("display connection closed by peer")]
    PeerClosed,

    /// Worker thread died with a panic.
    #[error("pipeline stage panicked: {stage}")]
    StagePanicked { stage: &'static str },

    /// I/O error on a sink or connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for display distribution.
pub type Result<T> = std::result::Result<T, EmitError>;
