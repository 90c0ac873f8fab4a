//! Vortex driver for the tb-rs TigerBeetle client.
//!
//! [Vortex](https://github.com/tigerbeetle/tigerbeetle/tree/main/src/testing/vortex)
//! exercises TigerBeetle clients through a small binary protocol spoken over
//! the driver's stdin and stdout. This crate implements that protocol on top
//! of [`tb_rs::Client`].
//!
//! # Protocol
//!
//! All integers are little-endian. Each request is answered by exactly one
//! response:
//!
//! ```text
//! request:  [operation: u8][count: u32][count × event]
//! response: [count: u32][count × result]
//! ```
//!
//! | operation            | code | event | result |
//! |----------------------|------|-------|--------|
//! | `create_accounts`    | 129  | 128   | 8      |
//! | `create_transfers`   | 130  | 128   | 8      |
//! | `lookup_accounts`    | 131  | 16    | 128    |
//! | `lookup_transfers`   | 132  | 16    | 128    |
//!
//! Codes 133 to 136 (the query operations) are recognized but not supported.
//! Any error is fatal: the driver stops and the process exits.
//!
//! # Example
//!
//! ```ignore
//! use tb_vortex::Driver;
//!
//! tokio_uring::start(async {
//!     let client = tb_rs::Client::connect(0, "127.0.0.1:3000").await?;
//!     let mut driver = Driver::new(client, std::io::stdin().lock(), std::io::stdout().lock());
//!     driver.run().await?;
//!
//!     let (client, _) = driver.into_parts();
//!     client.close().await;
//!     Ok::<_, tb_vortex::DriverError>(())
//! });
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod config;
mod driver;
mod error;
pub mod layout;
mod ledger;
pub mod operation;
pub mod record;

pub use codec::{Reader, Writer};
pub use config::{Args, Config, ConfigError};
pub use driver::{Driver, Flow};
pub use error::{DriverError, Result};
pub use ledger::Ledger;
pub use operation::Operation;
