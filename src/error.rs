//! Error types for the F/T receiver and sample logger.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read boundary produced something other than one full 36-byte record.
    /// Recoverable: the receiver skips to the next read.
    #[error("malformed packet: expected {expected} bytes, got {actual}")]
    MalformedPacket { expected: usize, actual: usize },

    /// Zero-length read or hard read error. Fatal to the session.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The durable sink rejected an append or flush. Fatal to the logger;
    /// swallowing it would mean silent data loss.
    #[error("sample log write failed: {0}")]
    SinkWrite(#[source] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid command-line configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
