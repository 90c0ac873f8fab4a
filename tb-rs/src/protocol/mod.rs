//! TigerBeetle protocol implementation.
//!
//! This module contains the wire format types and serialization logic
//! for communicating with TigerBeetle servers.

pub mod checksum;
pub mod header;
pub mod message;
pub mod multi_batch;
pub mod operation;
pub mod types;

// Re-export commonly used items
pub use checksum::checksum;
pub use header::{
    EvictionHeader, EvictionReason, Header, ReplyHeader, RequestHeader, HEADER_SIZE,
    PROTOCOL_VERSION,
};
pub use message::{Message, RequestBuilder, MESSAGE_BODY_SIZE_MAX, MESSAGE_SIZE_MAX};
pub use operation::{Command, Operation};
pub use types::{
    Account, AccountFlags, CreateAccountResult, CreateAccountsResult, CreateTransferResult,
    CreateTransfersResult, RegisterRequest, RegisterResult, Transfer, TransferFlags,
};
pub(crate) use types::FromReply;
