//! Request dispatcher.
//!
//! The [`Driver`] reads one request from the input channel, executes it
//! against the ledger, and writes the results back to the output channel.
//!
//! ```text
//! request:  [operation: u8][count: u32][count × event]
//! response: [count: u32][count × result]
//! ```
//!
//! Create operations only report events that did not succeed, as
//! `(index, result)` pairs. Lookups report one record per ID found, in the
//! order returned by the client.

use std::io::{Read, Write};

use tracing::debug;

use crate::codec::{Reader, Writer};
use crate::error::{DriverError, Result};
use crate::layout::{REQUEST_HEADER, RESPONSE_HEADER};
use crate::ledger::Ledger;
use crate::operation::Operation;
use crate::record;

/// Outcome of processing one request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    /// A request was processed; more may follow.
    Continue,
    /// The input channel closed cleanly between requests.
    Exhausted,
}

/// Runs Vortex requests against a ledger.
pub struct Driver<L, R, W> {
    ledger: L,
    reader: Reader<R>,
    writer: Writer<W>,
}

impl<L: Ledger, R: Read, W: Write> Driver<L, R, W> {
    /// Create a driver reading requests from `input` and writing responses
    /// to `output`.
    pub fn new(ledger: L, input: R, output: W) -> Self {
        Self {
            ledger,
            reader: Reader::new(input),
            writer: Writer::new(output),
        }
    }

    /// Process requests until the input is exhausted or an error occurs.
    pub async fn run(&mut self) -> Result<()> {
        let mut requests: u64 = 0;
        while self.next().await? == Flow::Continue {
            requests += 1;
        }
        debug!(requests, "input exhausted");
        Ok(())
    }

    /// Read the next request, run it, and write its response.
    pub async fn next(&mut self) -> Result<Flow> {
        if !self.reader.try_begin(REQUEST_HEADER.size())? {
            return Ok(Flow::Exhausted);
        }
        let operation = Operation::try_from(self.reader.read_u8()?)?;
        let count = self.reader.read_u32()?;

        debug!(%operation, count, "request");

        match operation {
            Operation::CreateAccounts => self.create_accounts(count).await?,
            Operation::CreateTransfers => self.create_transfers(count).await?,
            Operation::LookupAccounts => self.lookup_accounts(count).await?,
            Operation::LookupTransfers => self.lookup_transfers(count).await?,
            // The Vortex workload does not request these (yet).
            Operation::GetAccountTransfers
            | Operation::GetAccountBalances
            | Operation::QueryAccounts
            | Operation::QueryTransfers => {
                return Err(DriverError::UnsupportedOperation(operation));
            }
        }

        Ok(Flow::Continue)
    }

    /// Consume the driver, returning the ledger and the output channel.
    pub fn into_parts(self) -> (L, W) {
        (self.ledger, self.writer.into_inner())
    }

    async fn create_accounts(&mut self, count: u32) -> Result<()> {
        let operation = Operation::CreateAccounts;
        self.read_events(operation, count)?;
        let accounts = (0..count)
            .map(|_| record::decode_account(&mut self.reader))
            .collect::<Result<Vec<_>>>()?;

        let results = self.ledger.create_accounts(&accounts).await?;
        debug!(%operation, failed = results.len(), "executed");

        self.write_results(operation, results.len())?;
        for result in &results {
            record::encode_create_result(&mut self.writer, result.index, result.result as u32)?;
        }
        self.writer.flush()
    }

    async fn create_transfers(&mut self, count: u32) -> Result<()> {
        let operation = Operation::CreateTransfers;
        self.read_events(operation, count)?;
        let transfers = (0..count)
            .map(|_| record::decode_transfer(&mut self.reader))
            .collect::<Result<Vec<_>>>()?;

        let results = self.ledger.create_transfers(&transfers).await?;
        debug!(%operation, failed = results.len(), "executed");

        self.write_results(operation, results.len())?;
        for result in &results {
            record::encode_create_result(&mut self.writer, result.index, result.result as u32)?;
        }
        self.writer.flush()
    }

    async fn lookup_accounts(&mut self, count: u32) -> Result<()> {
        let operation = Operation::LookupAccounts;
        let ids = self.read_ids(operation, count)?;

        let accounts = self.ledger.lookup_accounts(&ids).await?;
        debug!(%operation, found = accounts.len(), "executed");

        self.write_results(operation, accounts.len())?;
        for account in &accounts {
            record::encode_account(&mut self.writer, account)?;
        }
        self.writer.flush()
    }

    async fn lookup_transfers(&mut self, count: u32) -> Result<()> {
        let operation = Operation::LookupTransfers;
        let ids = self.read_ids(operation, count)?;

        let transfers = self.ledger.lookup_transfers(&ids).await?;
        debug!(%operation, found = transfers.len(), "executed");

        self.write_results(operation, transfers.len())?;
        for transfer in &transfers {
            record::encode_transfer(&mut self.writer, transfer)?;
        }
        self.writer.flush()
    }

    fn read_ids(&mut self, operation: Operation, count: u32) -> Result<Vec<u128>> {
        self.read_events(operation, count)?;
        (0..count)
            .map(|_| record::decode_id(&mut self.reader))
            .collect()
    }

    /// Read the body of a request holding `count` events.
    ///
    /// Bodies larger than a single client message are rejected before any of
    /// their bytes are read.
    fn read_events(&mut self, operation: Operation, count: u32) -> Result<()> {
        let limit = u64::from(tb_rs::protocol::MESSAGE_BODY_SIZE_MAX);
        let size = (operation.event_size()? as u64).saturating_mul(u64::from(count));
        if size > limit {
            return Err(DriverError::BatchTooLarge {
                operation,
                count,
                limit,
            });
        }
        self.reader.begin(size as usize)
    }

    /// Allocate the response and write its header.
    fn write_results(&mut self, operation: Operation, count: usize) -> Result<()> {
        let size = RESPONSE_HEADER.size() + operation.result_size()? * count;
        self.writer.begin(size)?;
        // Results are bounded by the request's u32 event count.
        self.writer.write_u32(count as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use tb_rs::{
        Account, ClientError, CreateAccountResult, CreateAccountsResult, CreateTransferResult,
        CreateTransfersResult, Transfer,
    };

    /// Ledger returning canned results and recording what it was sent.
    #[derive(Default)]
    struct Scripted {
        accounts: Vec<Account>,
        transfers: Vec<Transfer>,
        ids: Vec<u128>,
        account_results: Vec<CreateAccountsResult>,
        transfer_results: Vec<CreateTransfersResult>,
        found_accounts: Vec<Account>,
        found_transfers: Vec<Transfer>,
        calls: usize,
        fail: bool,
    }

    impl Scripted {
        fn check(&mut self) -> std::result::Result<(), ClientError> {
            self.calls += 1;
            if self.fail {
                return Err(ClientError::Timeout);
            }
            Ok(())
        }
    }

    impl Ledger for Scripted {
        async fn create_accounts(
            &mut self,
            accounts: &[Account],
        ) -> std::result::Result<Vec<CreateAccountsResult>, ClientError> {
            self.check()?;
            self.accounts = accounts.to_vec();
            Ok(self.account_results.clone())
        }

        async fn create_transfers(
            &mut self,
            transfers: &[Transfer],
        ) -> std::result::Result<Vec<CreateTransfersResult>, ClientError> {
            self.check()?;
            self.transfers = transfers.to_vec();
            Ok(self.transfer_results.clone())
        }

        async fn lookup_accounts(
            &mut self,
            ids: &[u128],
        ) -> std::result::Result<Vec<Account>, ClientError> {
            self.check()?;
            self.ids = ids.to_vec();
            Ok(self.found_accounts.clone())
        }

        async fn lookup_transfers(
            &mut self,
            ids: &[u128],
        ) -> std::result::Result<Vec<Transfer>, ClientError> {
            self.check()?;
            self.ids = ids.to_vec();
            Ok(self.found_transfers.clone())
        }
    }

    fn request(operation: u8, count: u32, body: &[u8]) -> Vec<u8> {
        let mut bytes = vec![operation];
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    /// Run a single request, returning the ledger, the output and the outcome.
    fn run_one(ledger: Scripted, input: Vec<u8>) -> (Scripted, Vec<u8>, Result<Flow>) {
        let mut driver = Driver::new(ledger, &input[..], Vec::new());
        let result = block_on(driver.next());
        let (ledger, output) = driver.into_parts();
        (ledger, output, result)
    }

    fn account_event(id: u8, ledger: u32, code: u16) -> Vec<u8> {
        let mut event = vec![0u8; 128];
        event[..16].copy_from_slice(&[id; 16]);
        event[112..116].copy_from_slice(&ledger.to_le_bytes());
        event[116..118].copy_from_slice(&code.to_le_bytes());
        event
    }

    #[test]
    fn test_exhausted_on_empty_input() {
        let (ledger, output, result) = run_one(Scripted::default(), Vec::new());
        assert_eq!(result.unwrap(), Flow::Exhausted);
        assert_eq!(ledger.calls, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_create_account_success() {
        let input = request(129, 1, &account_event(0x01, 1, 1));
        let (ledger, output, result) = run_one(Scripted::default(), input);

        assert_eq!(result.unwrap(), Flow::Continue);
        assert_eq!(output, vec![0, 0, 0, 0]);
        assert_eq!(ledger.accounts.len(), 1);
        assert_eq!(ledger.accounts[0].id, u128::from_le_bytes([0x01; 16]));
        assert_eq!(ledger.accounts[0].ledger, 1);
        assert_eq!(ledger.accounts[0].code, 1);
    }

    #[test]
    fn test_create_account_failure_is_reported() {
        let ledger = Scripted {
            account_results: vec![CreateAccountsResult {
                index: 0,
                result: CreateAccountResult::Exists,
            }],
            ..Default::default()
        };
        let input = request(129, 1, &account_event(0x02, 1, 1));
        let (_, output, result) = run_one(ledger, input);

        result.unwrap();
        assert_eq!(output, vec![1, 0, 0, 0, 0, 0, 0, 0, 21, 0, 0, 0]);
    }

    #[test]
    fn test_create_transfers_sparse_results() {
        let ledger = Scripted {
            transfer_results: vec![CreateTransfersResult {
                index: 1,
                result: CreateTransferResult::DebitAccountNotFound,
            }],
            ..Default::default()
        };
        let input = request(130, 2, &[0u8; 256]);
        let (ledger, output, result) = run_one(ledger, input);

        result.unwrap();
        assert_eq!(ledger.transfers.len(), 2);
        assert_eq!(output, vec![1, 0, 0, 0, 1, 0, 0, 0, 21, 0, 0, 0]);
    }

    #[test]
    fn test_lookup_accounts_encodes_found_records() {
        let found = Account {
            id: 7,
            credits_posted: 100,
            ledger: 1,
            code: 2,
            timestamp: 99,
            ..Default::default()
        };
        let ledger = Scripted {
            found_accounts: vec![found],
            ..Default::default()
        };
        let mut body = 7u128.to_le_bytes().to_vec();
        body.extend_from_slice(&8u128.to_le_bytes());
        let (ledger, output, result) = run_one(ledger, request(131, 2, &body));

        result.unwrap();
        assert_eq!(ledger.ids, vec![7, 8]);
        assert_eq!(output.len(), 4 + 128);
        assert_eq!(&output[..4], &1u32.to_le_bytes());
        assert_eq!(&output[4..20], &7u128.to_le_bytes());
        assert_eq!(&output[68..84], &100u128.to_le_bytes());
        assert_eq!(&output[124..], &99u64.to_le_bytes());
    }

    #[test]
    fn test_lookup_transfers_missing() {
        let input = request(132, 1, &[0xAA; 16]);
        let (ledger, output, result) = run_one(Scripted::default(), input);

        result.unwrap();
        assert_eq!(ledger.ids, vec![u128::from_le_bytes([0xAA; 16])]);
        assert_eq!(output, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_operation() {
        let (ledger, output, result) = run_one(Scripted::default(), request(0xFF, 0, &[]));
        assert!(matches!(result, Err(DriverError::UnknownOperation(0xFF))));
        assert_eq!(ledger.calls, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_unsupported_operations() {
        for code in 133..=136u8 {
            let (ledger, output, result) = run_one(Scripted::default(), request(code, 1, &[]));
            let err = result.unwrap_err();
            assert!(matches!(err, DriverError::UnsupportedOperation(op) if op as u8 == code));
            assert!(err.to_string().starts_with("unsupported operation: "));
            assert_eq!(ledger.calls, 0);
            assert!(output.is_empty());
        }
    }

    #[test]
    fn test_truncated_body() {
        let input = request(129, 2, &account_event(0x01, 1, 1));
        let (ledger, output, result) = run_one(Scripted::default(), input);

        assert!(matches!(
            result,
            Err(DriverError::EndOfStream {
                expected: 256,
                received: 128
            })
        ));
        assert_eq!(ledger.calls, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_truncated_header() {
        let (_, output, result) = run_one(Scripted::default(), vec![129, 1]);
        assert!(matches!(
            result,
            Err(DriverError::EndOfStream {
                expected: 5,
                received: 2
            })
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn test_batch_too_large() {
        let (ledger, _, result) = run_one(Scripted::default(), request(130, u32::MAX, &[]));
        assert!(matches!(
            result,
            Err(DriverError::BatchTooLarge {
                operation: Operation::CreateTransfers,
                count: u32::MAX,
                ..
            })
        ));
        assert_eq!(ledger.calls, 0);
    }

    #[test]
    fn test_client_error_writes_nothing() {
        let ledger = Scripted {
            fail: true,
            ..Default::default()
        };
        let input = request(131, 1, &[1; 16]);
        let (ledger, output, result) = run_one(ledger, input);

        assert!(matches!(
            result,
            Err(DriverError::Client(ClientError::Timeout))
        ));
        assert_eq!(ledger.calls, 1);
        assert!(output.is_empty());
    }

    #[test]
    fn test_empty_batch() {
        let (ledger, output, result) = run_one(Scripted::default(), request(131, 0, &[]));
        result.unwrap();
        assert_eq!(ledger.calls, 1);
        assert!(ledger.ids.is_empty());
        assert_eq!(output, vec![0, 0, 0, 0]);
    }
}
