//! Vortex driver operations.
//!
//! Operation codes follow `Operation` in TigerBeetle's `state_machine.zig` as
//! spoken by the Vortex workload. They differ from the VSR operation codes
//! used on the client/server wire (see [`tb_rs::protocol::Operation`]).

use std::fmt;

use crate::error::{DriverError, Result};
use crate::layout::{ACCOUNT, CREATE_RESULT, ID, TRANSFER};

/// Operations a Vortex request may carry.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    /// Create accounts (batch).
    CreateAccounts = 129,
    /// Create transfers (batch).
    CreateTransfers = 130,
    /// Lookup accounts by ID (batch).
    LookupAccounts = 131,
    /// Lookup transfers by ID (batch).
    LookupTransfers = 132,
    /// Get transfers for an account. Not supported.
    GetAccountTransfers = 133,
    /// Get balance history for an account. Not supported.
    GetAccountBalances = 134,
    /// Query accounts. Not supported.
    QueryAccounts = 135,
    /// Query transfers. Not supported.
    QueryTransfers = 136,
}

impl Operation {
    /// Protocol name of the operation.
    pub fn name(self) -> &'static str {
        match self {
            Operation::CreateAccounts => "create_accounts",
            Operation::CreateTransfers => "create_transfers",
            Operation::LookupAccounts => "lookup_accounts",
            Operation::LookupTransfers => "lookup_transfers",
            Operation::GetAccountTransfers => "get_account_transfers",
            Operation::GetAccountBalances => "get_account_balances",
            Operation::QueryAccounts => "query_accounts",
            Operation::QueryTransfers => "query_transfers",
        }
    }

    /// Returns true if the driver can dispatch this operation.
    ///
    /// The Vortex workload does not request the query operations yet, so they
    /// are recognized but rejected.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Operation::CreateAccounts
                | Operation::CreateTransfers
                | Operation::LookupAccounts
                | Operation::LookupTransfers
        )
    }

    /// Size in bytes of one request event.
    pub fn event_size(self) -> Result<usize> {
        match self {
            Operation::CreateAccounts => Ok(ACCOUNT.size()),
            Operation::CreateTransfers => Ok(TRANSFER.size()),
            Operation::LookupAccounts | Operation::LookupTransfers => Ok(ID.size()),
            _ => Err(DriverError::UnsupportedOperation(self)),
        }
    }

    /// Size in bytes of one response result.
    pub fn result_size(self) -> Result<usize> {
        match self {
            Operation::CreateAccounts | Operation::CreateTransfers => Ok(CREATE_RESULT.size()),
            Operation::LookupAccounts => Ok(ACCOUNT.size()),
            Operation::LookupTransfers => Ok(TRANSFER.size()),
            _ => Err(DriverError::UnsupportedOperation(self)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Operation {
    type Error = DriverError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            129 => Ok(Operation::CreateAccounts),
            130 => Ok(Operation::CreateTransfers),
            131 => Ok(Operation::LookupAccounts),
            132 => Ok(Operation::LookupTransfers),
            133 => Ok(Operation::GetAccountTransfers),
            134 => Ok(Operation::GetAccountBalances),
            135 => Ok(Operation::QueryAccounts),
            136 => Ok(Operation::QueryTransfers),
            _ => Err(DriverError::UnknownOperation(value)),
        }
    }
}
