//! Integration tests for tb-rs.
//!
//! These tests require a running TigerBeetle server.
//! Set the TB_ADDR environment variable to the server address (e.g., "127.0.0.1:3001").
//!
//! Run with: TB_ADDR=127.0.0.1:3001 cargo test -p tb-rs --test integration_test

use std::net::SocketAddr;
use tb_rs::{
    Account, AccountFlags, Client, CreateAccountResult, CreateTransferResult, Transfer,
    TransferFlags,
};

/// Get the TigerBeetle address from environment variable.
fn get_tb_addr() -> Option<SocketAddr> {
    std::env::var("TB_ADDR").ok().and_then(|s| s.parse().ok())
}

/// Create a client connected to TigerBeetle.
async fn create_client() -> Option<Client> {
    let addr = get_tb_addr()?;
    eprintln!("Connecting to TigerBeetle at {}...", addr);

    match Client::connect(0, &addr.to_string()).await {
        Ok(client) => {
            eprintln!("Connected! Client ID: {:032x}", client.id());
            Some(client)
        }
        Err(e) => {
            eprintln!("Failed to connect: {:?}", e);
            None
        }
    }
}

/// Run a test inside tokio_uring runtime.
macro_rules! uring_test {
    ($name:ident, $body:expr) => {
        #[test]
        fn $name() {
            tokio_uring::start(async { $body.await });
        }
    };
}

fn account(ledger: u32, code: u16) -> Account {
    Account {
        id: tb_rs::id(),
        ledger,
        code,
        ..Default::default()
    }
}

uring_test!(test_create_and_lookup_accounts, async {
    let Some(mut client) = create_client().await else {
        eprintln!("Skipping test: TB_ADDR not set or connection failed");
        return;
    };

    let account_id = tb_rs::id();
    let account = Account {
        id: account_id,
        ledger: 42,
        code: 999,
        flags: AccountFlags::HISTORY,
        user_data_128: 0xDEADBEEF,
        ..Default::default()
    };

    let results = client.create_accounts(&[account]).await.unwrap();
    assert!(results.is_empty(), "Account creation failed: {:?}", results);

    let found = client.lookup_accounts(&[account_id]).await.unwrap();
    assert_eq!(found.len(), 1, "Account not found");

    let found_account = &found[0];
    assert_eq!(found_account.id, account_id);
    assert_eq!(found_account.ledger, 42);
    assert_eq!(found_account.code, 999);
    assert_eq!(found_account.flags, AccountFlags::HISTORY);
    assert_eq!(found_account.user_data_128, 0xDEADBEEF);
    assert!(found_account.timestamp > 0, "Timestamp should be set");

    client.close().await;
});

uring_test!(test_create_accounts_reports_failures_only, async {
    let Some(mut client) = create_client().await else {
        eprintln!("Skipping test: TB_ADDR not set or connection failed");
        return;
    };

    let existing = account(1, 1);
    let results = client.create_accounts(&[existing]).await.unwrap();
    assert!(results.is_empty());

    let batch = [account(1, 1), existing, account(0, 1)];
    let results = client.create_accounts(&batch).await.unwrap();

    assert_eq!(results.len(), 2, "results: {:?}", results);
    assert_eq!(results[0].index, 1);
    assert_eq!(results[0].result, CreateAccountResult::Exists);
    assert_eq!(results[1].index, 2);
    assert_eq!(results[1].result, CreateAccountResult::LedgerMustNotBeZero);

    client.close().await;
});

uring_test!(test_create_and_lookup_transfers, async {
    let Some(mut client) = create_client().await else {
        eprintln!("Skipping test: TB_ADDR not set or connection failed");
        return;
    };

    let debit = account(7, 1);
    let credit = account(7, 1);
    let results = client.create_accounts(&[debit, credit]).await.unwrap();
    assert!(results.is_empty());

    let posted = Transfer {
        id: tb_rs::id(),
        debit_account_id: debit.id,
        credit_account_id: credit.id,
        amount: u128::from(u64::MAX) + 1,
        ledger: 7,
        code: 1,
        ..Default::default()
    };
    let pending = Transfer {
        id: tb_rs::id(),
        amount: 5,
        flags: TransferFlags::PENDING,
        ..posted
    };
    let unknown_debit = Transfer {
        id: tb_rs::id(),
        debit_account_id: tb_rs::id(),
        ..posted
    };

    let results = client
        .create_transfers(&[posted, pending, unknown_debit])
        .await
        .unwrap();
    assert_eq!(results.len(), 1, "results: {:?}", results);
    assert_eq!(results[0].index, 2);
    assert_eq!(results[0].result, CreateTransferResult::DebitAccountNotFound);

    let found = client
        .lookup_transfers(&[posted.id, unknown_debit.id, pending.id])
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].id, posted.id);
    assert_eq!(found[0].amount, u128::from(u64::MAX) + 1);
    assert_eq!(found[1].id, pending.id);
    assert!(found[1].flags.contains(TransferFlags::PENDING));

    let accounts = client.lookup_accounts(&[debit.id, credit.id]).await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].debits_posted, u128::from(u64::MAX) + 1);
    assert_eq!(accounts[0].debits_pending, 5);
    assert_eq!(accounts[1].credits_posted, u128::from(u64::MAX) + 1);
    assert_eq!(accounts[1].credits_pending, 5);

    client.close().await;
});

uring_test!(test_lookup_missing, async {
    let Some(mut client) = create_client().await else {
        eprintln!("Skipping test: TB_ADDR not set or connection failed");
        return;
    };

    let accounts = client.lookup_accounts(&[tb_rs::id()]).await.unwrap();
    assert!(accounts.is_empty());

    let transfers = client.lookup_transfers(&[tb_rs::id()]).await.unwrap();
    assert!(transfers.is_empty());

    client.close().await;
});
