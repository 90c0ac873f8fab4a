//! Error types for the Vortex driver.
//!
//! Every variant is fatal: the driver is a conformance harness component and
//! never recovers from a framing, protocol, transport or client failure.

use thiserror::Error;

use crate::operation::Operation;

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors raised while decoding, dispatching or encoding a request.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A read began while the previous read buffer still had unread bytes.
    #[error("existing read buffer has {remaining} bytes remaining")]
    ReadPending {
        /// Unread bytes left in the previous buffer.
        remaining: usize,
    },

    /// A write began while the previous write buffer was not filled.
    #[error("existing write buffer has {remaining} bytes remaining")]
    WritePending {
        /// Unwritten bytes left in the previous buffer.
        remaining: usize,
    },

    /// Flush was requested before the write buffer was filled.
    #[error("write buffer has {remaining} bytes remaining, refusing to flush")]
    FlushIncomplete {
        /// Unwritten bytes left in the buffer.
        remaining: usize,
    },

    /// A scalar or blob access ran past the end of the current buffer.
    #[error("{width}-byte access overruns buffer with {remaining} bytes remaining")]
    Overrun {
        /// Width of the attempted access in bytes.
        width: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// The declared batch does not fit in a single client request.
    #[error("{operation} batch of {count} events exceeds {limit} bytes")]
    BatchTooLarge {
        /// Requested operation.
        operation: Operation,
        /// Declared event count.
        count: u32,
        /// Maximum request body size in bytes.
        limit: u64,
    },

    /// The operation code has no registry entry.
    #[error("invalid operation: {0}")]
    UnknownOperation(u8),

    /// The operation is known but the driver does not support it.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(Operation),

    /// The input channel closed before the declared byte count arrived.
    #[error("end of stream: expected {expected} bytes, received {received}")]
    EndOfStream {
        /// Bytes requested.
        expected: usize,
        /// Bytes received before the channel closed.
        received: usize,
    },

    /// The input or output channel failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The ledger client failed to execute a batch.
    #[error("ledger client error: {0}")]
    Client(#[from] tb_rs::ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_pending_display() {
        let err = DriverError::ReadPending { remaining: 3 };
        assert_eq!(err.to_string(), "existing read buffer has 3 bytes remaining");
    }

    #[test]
    fn test_unsupported_operation_names_operation() {
        let err = DriverError::UnsupportedOperation(Operation::QueryTransfers);
        assert_eq!(err.to_string(), "unsupported operation: query_transfers");
    }

    #[test]
    fn test_unknown_operation_display() {
        let err = DriverError::UnknownOperation(0xFF);
        assert_eq!(err.to_string(), "invalid operation: 255");
    }

    #[test]
    fn test_client_error_from() {
        let err: DriverError = tb_rs::ClientError::Timeout.into();
        assert!(matches!(err, DriverError::Client(tb_rs::ClientError::Timeout)));
        assert_eq!(err.to_string(), "ledger client error: operation timed out");
    }
}
