//! TigerBeetle message serialization.
//!
//! Messages consist of a fixed 256-byte header followed by a variable-length body.

use super::header::{Header, HEADER_SIZE};
use super::operation::{Command, Operation};

/// Maximum message size (1 MiB).
pub const MESSAGE_SIZE_MAX: u32 = 1024 * 1024;

/// Maximum body size.
pub const MESSAGE_BODY_SIZE_MAX: u32 = MESSAGE_SIZE_MAX - HEADER_SIZE;

/// A complete TigerBeetle message with header and body.
///
/// The header is kept as a decoded copy next to the wire bytes, so it is
/// never read in place from a byte buffer of unknown alignment.
#[derive(Clone, Debug)]
pub struct Message {
    header: Header,
    /// Header bytes followed by the body.
    data: Vec<u8>,
}

impl Message {
    /// Create a message from raw bytes.
    ///
    /// Returns None if the bytes are too short.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let header = Header::read_from(&bytes)?;
        Some(Self {
            header,
            data: bytes,
        })
    }

    /// Get the header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Get the body.
    pub fn body(&self) -> &[u8] {
        &self.data[HEADER_SIZE as usize..]
    }

    /// Get the entire message as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Builder for constructing request messages.
pub struct RequestBuilder {
    header: Header,
    data: Vec<u8>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(cluster: u128, client: u128) -> Self {
        let mut header = Header::new(cluster);
        header.set_command(Command::Request);
        header.as_request_mut().client = client;

        Self {
            header,
            data: vec![0u8; HEADER_SIZE as usize],
        }
    }

    /// Set the session number.
    pub fn session(mut self, session: u64) -> Self {
        self.header.as_request_mut().session = session;
        self
    }

    /// Set the request number.
    pub fn request(mut self, request: u32) -> Self {
        self.header.as_request_mut().request = request;
        self
    }

    /// Set the parent checksum.
    pub fn parent(mut self, parent: u128) -> Self {
        self.header.as_request_mut().parent = parent;
        self
    }

    /// Set the operation.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.header.as_request_mut().set_operation(operation);
        self
    }

    /// Set the view.
    pub fn view(mut self, view: u32) -> Self {
        self.header.view = view;
        self
    }

    /// Set the release version.
    pub fn release(mut self, release: u32) -> Self {
        self.header.release = release;
        self
    }

    /// Set the body data, replacing any earlier body.
    pub fn body(mut self, body: &[u8]) -> Self {
        self.data.truncate(HEADER_SIZE as usize);
        self.data.extend_from_slice(body);
        self
    }

    /// Fill in the size and checksums and build the message.
    ///
    /// The body checksum is computed first because the header checksum
    /// covers it.
    pub fn build(mut self) -> Message {
        let (head, body) = self.data.split_at_mut(HEADER_SIZE as usize);
        self.header.size = HEADER_SIZE + body.len() as u32;
        self.header.set_checksum_body(body);
        self.header.set_checksum();
        head.copy_from_slice(self.header.as_bytes());

        Message {
            header: self.header,
            data: self.data,
        }
    }
}
