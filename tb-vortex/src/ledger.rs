//! The ledger client seen by the driver.
//!
//! [`Ledger`] is the batch surface the dispatcher needs from a TigerBeetle
//! client. It is implemented for [`tb_rs::Client`]; tests substitute an
//! in-memory ledger.

use tb_rs::{Account, Client, ClientError, CreateAccountsResult, CreateTransfersResult, Transfer};

/// Batch operations executed against the cluster.
///
/// Calls are awaited one at a time: the driver never has two batches in
/// flight. Futures need not be `Send`, since tb-rs runs on a thread-local
/// io_uring runtime.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// Create accounts, returning the results of events that did not succeed.
    async fn create_accounts(
        &mut self,
        accounts: &[Account],
    ) -> Result<Vec<CreateAccountsResult>, ClientError>;

    /// Create transfers, returning the results of events that did not succeed.
    async fn create_transfers(
        &mut self,
        transfers: &[Transfer],
    ) -> Result<Vec<CreateTransfersResult>, ClientError>;

    /// Look up accounts by ID. Missing IDs produce no record.
    async fn lookup_accounts(&mut self, ids: &[u128]) -> Result<Vec<Account>, ClientError>;

    /// Look up transfers by ID. Missing IDs produce no record.
    async fn lookup_transfers(&mut self, ids: &[u128]) -> Result<Vec<Transfer>, ClientError>;
}

impl Ledger for Client {
    async fn create_accounts(
        &mut self,
        accounts: &[Account],
    ) -> Result<Vec<CreateAccountsResult>, ClientError> {
        Client::create_accounts(self, accounts).await
    }

    async fn create_transfers(
        &mut self,
        transfers: &[Transfer],
    ) -> Result<Vec<CreateTransfersResult>, ClientError> {
        Client::create_transfers(self, transfers).await
    }

    async fn lookup_accounts(&mut self, ids: &[u128]) -> Result<Vec<Account>, ClientError> {
        Client::lookup_accounts(self, ids).await
    }

    async fn lookup_transfers(&mut self, ids: &[u128]) -> Result<Vec<Transfer>, ClientError> {
        Client::lookup_transfers(self, ids).await
    }
}
