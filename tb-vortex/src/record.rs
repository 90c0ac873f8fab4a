//! Record codec between the driver protocol and tb-rs types.
//!
//! Fields are read and written in the order given by [`crate::layout`].
//! 128-bit fields travel as opaque little-endian byte blobs and are only
//! converted to `u128` at this boundary.

use std::io::{Read, Write};

use tb_rs::{Account, AccountFlags, Transfer, TransferFlags};

use crate::codec::{Reader, Writer};
use crate::error::Result;

fn read_u128<R: Read>(reader: &mut Reader<R>) -> Result<u128> {
    Ok(u128::from_le_bytes(reader.read_bytes16()?))
}

fn write_u128<W: Write>(writer: &mut Writer<W>, value: u128) -> Result<()> {
    writer.write_bytes16(value.to_le_bytes())
}

/// Decode an account to create.
///
/// Balances, `reserved` and `timestamp` are owned by the cluster: whatever the
/// request carries is skipped and the forwarded account holds zero.
pub fn decode_account<R: Read>(reader: &mut Reader<R>) -> Result<Account> {
    let id = read_u128(reader)?;
    reader.read_bytes16()?; // debits_pending
    reader.read_bytes16()?; // debits_posted
    reader.read_bytes16()?; // credits_pending
    reader.read_bytes16()?; // credits_posted
    let user_data_128 = read_u128(reader)?;
    let user_data_64 = reader.read_u64()?;
    let user_data_32 = reader.read_u32()?;
    reader.read_u32()?; // reserved
    let ledger = reader.read_u32()?;
    let code = reader.read_u16()?;
    let flags = AccountFlags::from_bits_retain(reader.read_u16()?);
    reader.read_u64()?; // timestamp

    Ok(Account {
        id,
        user_data_128,
        user_data_64,
        user_data_32,
        ledger,
        code,
        flags,
        ..Default::default()
    })
}

/// Encode an account returned by the cluster.
pub fn encode_account<W: Write>(writer: &mut Writer<W>, account: &Account) -> Result<()> {
    write_u128(writer, account.id)?;
    write_u128(writer, account.debits_pending)?;
    write_u128(writer, account.debits_posted)?;
    write_u128(writer, account.credits_pending)?;
    write_u128(writer, account.credits_posted)?;
    write_u128(writer, account.user_data_128)?;
    writer.write_u64(account.user_data_64)?;
    writer.write_u32(account.user_data_32)?;
    writer.write_u32(0)?; // reserved
    writer.write_u32(account.ledger)?;
    writer.write_u16(account.code)?;
    writer.write_u16(account.flags.bits())?;
    writer.write_u64(account.timestamp)
}

/// Decode a transfer to create. Unlike accounts, the timestamp is forwarded.
pub fn decode_transfer<R: Read>(reader: &mut Reader<R>) -> Result<Transfer> {
    let id = read_u128(reader)?;
    let debit_account_id = read_u128(reader)?;
    let credit_account_id = read_u128(reader)?;
    let amount_lo = reader.read_u64()?;
    let amount_hi = reader.read_u64()?;
    let pending_id = read_u128(reader)?;
    let user_data_128 = read_u128(reader)?;
    let user_data_64 = reader.read_u64()?;
    let user_data_32 = reader.read_u32()?;
    let timeout = reader.read_u32()?;
    let ledger = reader.read_u32()?;
    let code = reader.read_u16()?;
    let flags = TransferFlags::from_bits_retain(reader.read_u16()?);
    let timestamp = reader.read_u64()?;

    Ok(Transfer {
        id,
        debit_account_id,
        credit_account_id,
        amount: ((amount_hi as u128) << 64) | amount_lo as u128,
        pending_id,
        user_data_128,
        user_data_64,
        user_data_32,
        timeout,
        ledger,
        code,
        flags,
        timestamp,
    })
}

/// Encode a transfer returned by the cluster.
pub fn encode_transfer<W: Write>(writer: &mut Writer<W>, transfer: &Transfer) -> Result<()> {
    write_u128(writer, transfer.id)?;
    write_u128(writer, transfer.debit_account_id)?;
    write_u128(writer, transfer.credit_account_id)?;
    write_u128(writer, transfer.amount)?;
    write_u128(writer, transfer.pending_id)?;
    write_u128(writer, transfer.user_data_128)?;
    writer.write_u64(transfer.user_data_64)?;
    writer.write_u32(transfer.user_data_32)?;
    writer.write_u32(transfer.timeout)?;
    writer.write_u32(transfer.ledger)?;
    writer.write_u16(transfer.code)?;
    writer.write_u16(transfer.flags.bits())?;
    writer.write_u64(transfer.timestamp)
}

/// Decode a lookup identifier.
pub fn decode_id<R: Read>(reader: &mut Reader<R>) -> Result<u128> {
    read_u128(reader)
}

/// Encode the outcome of one failed create event.
pub fn encode_create_result<W: Write>(
    writer: &mut Writer<W>,
    index: u32,
    result: u32,
) -> Result<()> {
    writer.write_u32(index)?;
    writer.write_u32(result)
}
