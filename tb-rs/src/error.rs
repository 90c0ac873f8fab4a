//! Error types for the TigerBeetle client.
//!
//! All error types implement `std::error::Error` for compatibility
//! with error handling frameworks like `anyhow` and `thiserror`.

use crate::protocol::header::EvictionReason;
use std::error::Error;
use std::fmt;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Main error type for client operations.
#[derive(Debug)]
pub enum ClientError {
    /// Connection error (connect, send, recv failures).
    Connection(String),
    /// Protocol error (invalid message, checksum failure, etc.).
    Protocol(ProtocolError),
    /// Client was evicted by the server.
    Evicted(EvictionReason),
    /// Operation timed out.
    Timeout,
    /// Client is not registered.
    NotRegistered,
    /// Client is shutting down.
    Shutdown,
    /// Request was too large for the server's batch size limit.
    RequestTooLarge {
        /// The size of the request body in bytes.
        size: u32,
        /// The server's batch size limit in bytes.
        limit: u32,
    },
    /// Invalid operation for current state.
    InvalidOperation,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Connection(msg) => write!(f, "connection error: {}", msg),
            ClientError::Protocol(e) => write!(f, "protocol error: {}", e),
            ClientError::Evicted(reason) => write!(f, "client evicted: {:?}", reason),
            ClientError::Timeout => write!(f, "operation timed out"),
            ClientError::NotRegistered => write!(f, "client not registered"),
            ClientError::Shutdown => write!(f, "client is shutting down"),
            ClientError::RequestTooLarge { size, limit } => {
                write!(f, "request too large: {} bytes exceeds limit of {} bytes", size, limit)
            }
            ClientError::InvalidOperation => write!(f, "invalid operation for current state"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        ClientError::Protocol(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Connection(err.to_string())
    }
}

/// Protocol-level errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProtocolError {
    /// Invalid header checksum.
    InvalidHeaderChecksum,
    /// Invalid body checksum.
    InvalidBodyChecksum,
    /// Invalid header structure.
    InvalidHeader,
    /// Invalid operation.
    InvalidOperation,
    /// Unexpected reply (wrong request number or parent).
    UnexpectedReply,
    /// Version mismatch.
    VersionMismatch,
    /// Invalid message size.
    InvalidSize,
    /// Invalid command.
    InvalidCommand,
    /// A reply carried a result code the client does not know.
    InvalidResult,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidHeaderChecksum => write!(f, "invalid header checksum"),
            ProtocolError::InvalidBodyChecksum => write!(f, "invalid body checksum"),
            ProtocolError::InvalidHeader => write!(f, "invalid header structure"),
            ProtocolError::InvalidOperation => write!(f, "invalid operation"),
            ProtocolError::UnexpectedReply => write!(f, "unexpected reply"),
            ProtocolError::VersionMismatch => write!(f, "version mismatch"),
            ProtocolError::InvalidSize => write!(f, "invalid message size"),
            ProtocolError::InvalidCommand => write!(f, "invalid command"),
            ProtocolError::InvalidResult => write!(f, "invalid result code"),
        }
    }
}

impl Error for ProtocolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Timeout;
        assert_eq!(format!("{}", err), "operation timed out");
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::InvalidHeaderChecksum;
        assert_eq!(format!("{}", err), "invalid header checksum");
    }

    #[test]
    fn test_client_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let client_err: ClientError = io_err.into();
        assert!(matches!(client_err, ClientError::Connection(msg) if msg == "file not found"));
    }

    #[test]
    fn test_error_source_chain() {
        let protocol_err = ProtocolError::InvalidHeaderChecksum;
        let client_err = ClientError::Protocol(protocol_err);

        // Can get source
        let source = client_err.source().unwrap();
        assert!(source.is::<ProtocolError>());
    }
}
