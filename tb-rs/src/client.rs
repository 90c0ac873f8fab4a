//! TigerBeetle client.
//!
//! This module provides the main [`Client`] type for interacting with
//! TigerBeetle clusters.
//!
//! # Example
//!
//! ```ignore
//! use tb_rs::{Client, Account, AccountFlags};
//!
//! tokio_uring::start(async {
//!     let mut client = Client::connect(0, "127.0.0.1:3000").await?;
//!
//!     let account = Account {
//!         id: tb_rs::id(),
//!         ledger: 1,
//!         code: 1,
//!         ..Default::default()
//!     };
//!     client.create_accounts(&[account]).await?;
//!
//!     client.close().await;
//!     Ok::<_, tb_rs::ClientError>(())
//! });
//! ```

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use rand::Rng;
use zerocopy::{FromBytes, IntoBytes};

use crate::error::{ClientError, ProtocolError, Result};
use crate::internal::{BufferPool, Driver};
use crate::protocol::types::Event;
use crate::protocol::{
    Account, Command, CreateAccountsResult, CreateTransfersResult, FromReply, Header, Message,
    Operation, RegisterRequest, RegisterResult, RequestBuilder, Transfer, HEADER_SIZE,
    MESSAGE_SIZE_MAX,
};

/// Minimum client release version.
const CLIENT_RELEASE: u32 = 1;

/// First pause before resending after a connection failure.
const RETRY_DELAY_MIN: Duration = Duration::from_millis(10);

/// Client state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Disconnected,
    Registering,
    Ready,
    Shutdown,
}

/// TigerBeetle client.
///
/// Creates and looks up accounts and transfers in batches.
/// Uses io_uring for high-performance async I/O on Linux.
///
/// # Thread Safety
///
/// This client is `!Send` because io_uring submission queues are thread-local.
/// Create one client per thread if you need multi-threaded access.
///
/// # Example
///
/// ```ignore
/// use tb_rs::Client;
///
/// tokio_uring::start(async {
///     // Simple connection
///     let mut client = Client::connect(0, "127.0.0.1:3000").await?;
///
///     // Or with custom configuration
///     let mut client = Client::builder()
///         .cluster(0)
///         .addresses("127.0.0.1:3000,127.0.0.1:3001")?
///         .connect_timeout(Duration::from_secs(10))
///         .build()
///         .await?;
///
///     client.close().await;
///     Ok::<_, tb_rs::ClientError>(())
/// });
/// ```
pub struct Client {
    /// Unique client identifier (random).
    id: u128,
    /// Cluster identifier.
    cluster: u128,
    /// Number of replicas.
    replica_count: u8,
    /// I/O driver.
    driver: Driver,
    /// Client state.
    state: State,
    /// Current view (determines primary).
    view: u32,
    /// Replicas to step past the view's primary after failed attempts.
    replica_offset: usize,
    /// Session number.
    session: u64,
    /// Next request number.
    request_number: u32,
    /// Parent checksum for hash-chain.
    parent: u128,
    /// Batch size limit (from registration).
    batch_size_limit: Option<u32>,
    /// PRNG for hedging.
    rng: rand::rngs::StdRng,
    /// Send buffer.
    send_buffer: Vec<u8>,
    /// Buffer pool for receives.
    buffer_pool: BufferPool,
    /// Bytes received from the primary not yet framed into a message.
    recv_buffer: Vec<u8>,
    /// Replica whose bytes are in `recv_buffer`.
    recv_replica: usize,
    /// Request timeout.
    request_timeout: Duration,
    /// Maximum request timeout.
    request_timeout_max: Duration,
}

impl Client {
    /// Connect to a TigerBeetle cluster.
    ///
    /// This is the simplest way to create a client. It connects to the cluster
    /// and registers automatically.
    ///
    /// # Arguments
    ///
    /// * `cluster` - Cluster ID (must match the cluster configuration)
    /// * `addresses` - Comma-separated replica addresses (e.g., "127.0.0.1:3000")
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut client = Client::connect(0, "127.0.0.1:3000").await?;
    /// ```
    pub async fn connect(cluster: u128, addresses: &str) -> Result<Self> {
        Self::builder()
            .cluster(cluster)
            .addresses(addresses)?
            .build()
            .await
    }

    /// Create a client builder for custom configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = Client::builder()
    ///     .cluster(0)
    ///     .addresses("127.0.0.1:3000")?
    ///     .connect_timeout(Duration::from_secs(10))
    ///     .request_timeout(Duration::from_millis(100))
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the client ID.
    pub fn id(&self) -> u128 {
        self.id
    }

    /// Get the cluster ID.
    pub fn cluster(&self) -> u128 {
        self.cluster
    }

    /// Check if the client is ready for operations.
    pub fn is_ready(&self) -> bool {
        self.state == State::Ready
    }

    /// Get the batch size limit in bytes (available after registration).
    pub fn batch_size_limit(&self) -> Option<u32> {
        self.batch_size_limit
    }

    /// Create accounts.
    ///
    /// Returns errors for accounts that could not be created.
    /// An empty result means all accounts were created successfully.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let account = Account {
    ///     id: tb_rs::id(),
    ///     ledger: 1,
    ///     code: 1,
    ///     ..Default::default()
    /// };
    ///
    /// let errors = client.create_accounts(&[account]).await?;
    /// if errors.is_empty() {
    ///     println!("Account created!");
    /// }
    /// ```
    pub async fn create_accounts(
        &mut self,
        accounts: &[Account],
    ) -> Result<Vec<CreateAccountsResult>> {
        let response = self.request(Operation::CreateAccounts, accounts).await?;
        let payload = crate::protocol::multi_batch::decode(
            &response,
            std::mem::size_of::<CreateAccountsResult>() as u32,
        );
        parse_results(payload)
    }

    /// Create transfers.
    ///
    /// Returns errors for transfers that could not be created.
    /// An empty result means all transfers were created successfully.
    pub async fn create_transfers(
        &mut self,
        transfers: &[Transfer],
    ) -> Result<Vec<CreateTransfersResult>> {
        let response = self.request(Operation::CreateTransfers, transfers).await?;
        let payload = crate::protocol::multi_batch::decode(
            &response,
            std::mem::size_of::<CreateTransfersResult>() as u32,
        );
        parse_results(payload)
    }

    /// Lookup accounts by ID.
    pub async fn lookup_accounts(&mut self, ids: &[u128]) -> Result<Vec<Account>> {
        let response = self.request(Operation::LookupAccounts, ids).await?;
        let payload =
            crate::protocol::multi_batch::decode(&response, std::mem::size_of::<Account>() as u32);
        parse_results(payload)
    }

    /// Lookup transfers by ID.
    pub async fn lookup_transfers(&mut self, ids: &[u128]) -> Result<Vec<Transfer>> {
        let response = self.request(Operation::LookupTransfers, ids).await?;
        let payload =
            crate::protocol::multi_batch::decode(&response, std::mem::size_of::<Transfer>() as u32);
        parse_results(payload)
    }

    /// Close the client and release resources.
    pub async fn close(mut self) {
        self.state = State::Shutdown;
        self.driver.close().await;
        self.recv_buffer.clear();
    }

    // ========================================================================
    // Internal methods
    // ========================================================================

    /// Register with the cluster.
    async fn register(&mut self) -> Result<()> {
        if self.state != State::Disconnected {
            return Err(ClientError::InvalidOperation);
        }

        self.state = State::Registering;

        let body = RegisterRequest::default();
        let msg = RequestBuilder::new(self.cluster, self.id)
            .session(0)
            .request(0)
            .parent(0)
            .operation(Operation::Register)
            .release(CLIENT_RELEASE)
            .body(body.as_bytes())
            .build();

        self.parent = msg.header().checksum;

        // Send and wait for reply
        let reply = self.send_request_with_retry(msg).await?;

        let (result, _) = RegisterResult::read_from_prefix(reply.body())
            .map_err(|_| ClientError::Protocol(ProtocolError::InvalidSize))?;

        self.observe_view(reply.header().view);
        self.batch_size_limit = Some(result.batch_size_limit);
        self.session = reply.header().as_reply().commit;
        self.parent = reply.header().as_reply().context;
        self.request_number = 1;
        self.state = State::Ready;

        Ok(())
    }

    /// Send a request.
    async fn request<E: Event>(&mut self, operation: Operation, events: &[E]) -> Result<Vec<u8>> {
        if self.state != State::Ready {
            return Err(ClientError::NotRegistered);
        }

        // SAFETY: `Event` types have no padding, so every byte is initialized.
        let events_bytes = unsafe {
            std::slice::from_raw_parts(
                events.as_ptr() as *const u8,
                std::mem::size_of_val(events),
            )
        };

        // Apply multi-batch encoding if needed
        let body_slice: &[u8] = if operation.is_multi_batch() {
            let element_size = std::mem::size_of::<E>() as u32;
            let trailer_size = crate::protocol::multi_batch::trailer_total_size(element_size, 1);
            let total_size = events_bytes.len() as u32 + trailer_size;

            // Validate batch size before sending
            if let Some(limit) = self.batch_size_limit {
                if total_size > limit {
                    return Err(ClientError::RequestTooLarge {
                        size: total_size,
                        limit,
                    });
                }
            }
            let encoded_size = crate::protocol::multi_batch::encode(
                &mut self.send_buffer[..total_size as usize],
                events_bytes,
                element_size,
            );
            &self.send_buffer[..encoded_size as usize]
        } else {
            events_bytes
        };

        // Build request
        let msg = RequestBuilder::new(self.cluster, self.id)
            .session(self.session)
            .request(self.request_number)
            .parent(self.parent)
            .operation(operation)
            .release(CLIENT_RELEASE)
            .view(self.view)
            .body(body_slice)
            .build();

        self.parent = msg.header().checksum;
        self.request_number += 1;

        // Send with retry
        let reply = self.send_request_with_retry(msg).await?;

        // Update state
        let reply_header = reply.header().as_reply();
        self.parent = reply_header.context;

        self.observe_view(reply.header().view);

        Ok(reply.body().to_vec())
    }

    /// Send request with hedging and retry.
    ///
    /// Retries until a reply arrives. A timeout or a broken connection moves
    /// on to the next replica, which is the primary of the next view if the
    /// current one crashed. Eviction and corrupt replies end the request.
    async fn send_request_with_retry(&mut self, msg: Message) -> Result<Message> {
        let mut timeout = self.request_timeout;
        let mut delay = RETRY_DELAY_MIN;
        let expected_checksum = msg.header().checksum;

        loop {
            let attempt = match self.send_with_hedging(&msg).await {
                Ok(()) => self.wait_for_reply(expected_checksum, timeout).await,
                Err(e) => Err(e),
            };

            let err = match attempt {
                Ok(reply) => return Ok(reply),
                Err(e) if is_retryable(&e) => e,
                Err(e) => return Err(e),
            };

            // A read abandoned by a timeout may still consume bytes, so the
            // connection is never reused.
            let primary = self.primary();
            self.reset_primary(primary).await;
            self.replica_offset = (self.replica_offset + 1) % self.replica_count as usize;

            if let ClientError::Connection(_) = err {
                let jitter = self.rng.random_range(0..=delay.as_millis() as u64);
                tokio::time::sleep(delay + Duration::from_millis(jitter)).await;
                delay = std::cmp::min(delay * 2, self.request_timeout);
            }

            // Exponential backoff with jitter
            timeout = std::cmp::min(timeout * 2, self.request_timeout_max);
            let jitter = self.rng.random_range(0..=timeout.as_millis() as u64 / 4);
            timeout += Duration::from_millis(jitter);
        }
    }

    /// Replica currently treated as primary.
    fn primary(&self) -> usize {
        (self.view as usize + self.replica_offset) % self.replica_count as usize
    }

    /// Follow a newer view reported by the cluster.
    fn observe_view(&mut self, view: u32) {
        if view > self.view {
            self.view = view;
            self.replica_offset = 0;
        }
    }

    /// Send with hedging (primary + random backup).
    async fn send_with_hedging(&mut self, msg: &Message) -> Result<()> {
        let primary = self.primary();

        // Ensure primary connected
        self.ensure_connected(primary).await?;
        self.driver.send(primary, msg.as_bytes()).await?;

        // Send to backup (hedging)
        if self.replica_count > 1 {
            let backup_offset = self.rng.random_range(1..self.replica_count as usize);
            let backup = (primary + backup_offset) % self.replica_count as usize;

            if self.ensure_connected(backup).await.is_ok() {
                let _ = self.driver.send(backup, msg.as_bytes()).await;
            }
        }

        Ok(())
    }

    /// Ensure connected to a replica.
    async fn ensure_connected(&mut self, idx: usize) -> Result<()> {
        if !self.driver.is_connected(idx) {
            self.driver.connect(idx).await?;
        }
        Ok(())
    }

    /// Wait for a reply matching the expected checksum.
    ///
    /// Bytes from the primary accumulate in `recv_buffer` until a whole
    /// message is available, so replies split across reads (or several
    /// replies in one read) are framed by the header's `size`.
    async fn wait_for_reply(
        &mut self,
        expected_checksum: u128,
        timeout: Duration,
    ) -> Result<Message> {
        let start = Instant::now();
        let primary = self.primary();
        if self.recv_replica != primary {
            self.recv_buffer.clear();
            self.recv_replica = primary;
        }

        loop {
            while let Some(size) = self.buffered_frame(primary).await? {
                let frame: Vec<u8> = self.recv_buffer.drain(..size).collect();
                match self.try_parse_reply(&frame, expected_checksum) {
                    Ok(msg) => return Ok(msg),
                    Err(ParseError::WrongReply) => continue,
                    Err(ParseError::Evicted(reason)) => return Err(ClientError::Evicted(reason)),
                    Err(ParseError::Protocol(e)) => {
                        self.reset_primary(primary).await;
                        return Err(ClientError::Protocol(e));
                    }
                }
            }

            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(ClientError::Timeout);
            }

            let buf = self.buffer_pool.acquire();
            let received = tokio::time::timeout(remaining, self.driver.recv(primary, buf)).await;
            let buf = match received {
                Ok(Ok(b)) => b,
                Ok(Err(e)) => {
                    // Connection error - reconnect on the next send
                    self.reset_primary(primary).await;
                    return Err(e);
                }
                Err(_) => return Err(ClientError::Timeout),
            };

            self.recv_buffer.extend_from_slice(buf.as_slice());
            self.buffer_pool.release(buf);
        }
    }

    /// Size of the first complete message in `recv_buffer`, if any.
    async fn buffered_frame(&mut self, primary: usize) -> Result<Option<usize>> {
        match frame_size(&self.recv_buffer) {
            Ok(size) => Ok(size),
            Err(e) => {
                self.reset_primary(primary).await;
                Err(ClientError::Protocol(e))
            }
        }
    }

    /// Drop the connection to the primary along with any partial message.
    async fn reset_primary(&mut self, primary: usize) {
        self.recv_buffer.clear();
        self.driver.disconnect(primary).await;
    }

    /// Try to parse a reply from one complete message.
    fn try_parse_reply(
        &self,
        data: &[u8],
        expected_checksum: u128,
    ) -> std::result::Result<Message, ParseError> {
        let header =
            Header::read_from(data).ok_or(ParseError::Protocol(ProtocolError::InvalidHeader))?;

        if header.command != Command::Reply as u8 {
            if header.command == Command::Eviction as u8 {
                let reason = header.as_eviction().reason;
                return Err(ParseError::Evicted(
                    reason
                        .try_into()
                        .unwrap_or(crate::protocol::header::EvictionReason::NoSession),
                ));
            }
            return Err(ParseError::Protocol(ProtocolError::UnexpectedReply));
        }

        let reply_header = header.as_reply();
        if reply_header.request_checksum != expected_checksum {
            return Err(ParseError::WrongReply);
        }
        if reply_header.client != self.id {
            return Err(ParseError::WrongReply);
        }

        let body_data = &data[HEADER_SIZE as usize..];
        if !header.valid_checksum_body(body_data) {
            return Err(ParseError::Protocol(ProtocolError::InvalidBodyChecksum));
        }

        Message::from_bytes(data.to_vec()).ok_or(ParseError::Protocol(ProtocolError::InvalidHeader))
    }
}

/// Reply parsing errors.
enum ParseError {
    WrongReply,
    Evicted(crate::protocol::header::EvictionReason),
    Protocol(ProtocolError),
}

/// Whether a failed attempt is worth sending again.
///
/// Replicas crash and restart, so timeouts and connection failures are
/// transient. Eviction, protocol corruption and local misuse are final.
fn is_retryable(err: &ClientError) -> bool {
    matches!(err, ClientError::Timeout | ClientError::Connection(_))
}

/// Size of the first complete message in `data`.
///
/// Returns `None` while the header or body is still incomplete. The header
/// checksum is verified before its `size` field is trusted.
fn frame_size(data: &[u8]) -> std::result::Result<Option<usize>, ProtocolError> {
    let Some(header) = Header::read_from(data) else {
        return Ok(None);
    };

    if !header.valid_checksum() {
        return Err(ProtocolError::InvalidHeaderChecksum);
    }
    if header.size < HEADER_SIZE || header.size > MESSAGE_SIZE_MAX {
        return Err(ProtocolError::InvalidSize);
    }

    let size = header.size as usize;
    Ok((data.len() >= size).then_some(size))
}

/// Decode a reply body into records.
///
/// The body is a byte buffer of arbitrary alignment, so each record is
/// copied out rather than viewed in place.
fn parse_results<R: FromReply>(data: &[u8]) -> Result<Vec<R>> {
    let size = std::mem::size_of::<R>();
    if data.len() % size != 0 {
        return Err(ClientError::Protocol(ProtocolError::InvalidSize));
    }
    data.chunks_exact(size)
        .map(|record| R::from_reply(record).map_err(ClientError::Protocol))
        .collect()
}

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for creating a [`Client`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// let client = Client::builder()
///     .cluster(0)
///     .addresses("127.0.0.1:3000,127.0.0.1:3001")?
///     .connect_timeout(Duration::from_secs(10))
///     .build()
///     .await?;
/// ```
pub struct ClientBuilder {
    cluster: u128,
    addresses: Vec<SocketAddr>,
    connect_timeout: Duration,
    request_timeout: Duration,
    request_timeout_max: Duration,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            cluster: 0,
            addresses: Vec::new(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_millis(500),
            request_timeout_max: Duration::from_secs(30),
        }
    }

    /// Set the cluster ID.
    pub fn cluster(mut self, id: u128) -> Self {
        self.cluster = id;
        self
    }

    /// Set replica addresses from a comma-separated string.
    pub fn addresses(mut self, addrs: &str) -> Result<Self> {
        if addrs.trim().is_empty() {
            return Err(ClientError::Connection("no addresses provided".into()));
        }

        self.addresses = addrs
            .split(',')
            .map(|s| {
                s.trim().parse().map_err(|e| {
                    ClientError::Connection(format!("invalid address '{}': {}", s.trim(), e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self)
    }

    /// Set replica addresses from a vector.
    pub fn addresses_vec(mut self, addrs: Vec<SocketAddr>) -> Self {
        self.addresses = addrs;
        self
    }

    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set initial request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set maximum request timeout (for backoff).
    pub fn request_timeout_max(mut self, timeout: Duration) -> Self {
        self.request_timeout_max = timeout;
        self
    }

    /// Build the client.
    ///
    /// This connects to the cluster and registers the client.
    pub async fn build(self) -> Result<Client> {
        use rand::SeedableRng;

        if self.addresses.is_empty() {
            return Err(ClientError::Connection("no addresses provided".into()));
        }

        let id: u128 = rand::random();
        if id == 0 {
            return Err(ClientError::Protocol(ProtocolError::InvalidHeader));
        }

        let replica_count = self.addresses.len() as u8;
        let driver = Driver::new(self.addresses, self.connect_timeout);

        let buffer_count = replica_count as usize + 2;
        let buffer_pool = BufferPool::new(buffer_count, MESSAGE_SIZE_MAX as usize);

        let mut client = Client {
            id,
            cluster: self.cluster,
            replica_count,
            driver,
            state: State::Disconnected,
            view: 0,
            replica_offset: 0,
            session: 0,
            request_number: 0,
            parent: 0,
            batch_size_limit: None,
            rng: rand::rngs::StdRng::from_os_rng(),
            send_buffer: vec![0u8; MESSAGE_SIZE_MAX as usize],
            buffer_pool,
            recv_buffer: Vec::with_capacity(MESSAGE_SIZE_MAX as usize),
            recv_replica: 0,
            request_timeout: self.request_timeout,
            request_timeout_max: self.request_timeout_max,
        };

        // Register with cluster
        client.register().await?;

        Ok(client)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
