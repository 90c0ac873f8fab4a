//! Fixed record layouts of the Vortex driver protocol.
//!
//! Each layout lists its fields in wire order. Record sizes used by the
//! operation registry are derived from these tables, and the record codec
//! reads and writes fields in exactly this order. All scalars are
//! little-endian; 16-byte fields are opaque byte blobs.

/// One field of a fixed-size record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field {
    /// Field name, matching TigerBeetle's `Account`/`Transfer` naming.
    pub name: &'static str,
    /// Width in bytes.
    pub width: usize,
}

/// A fixed-size record layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    /// Layout name, for diagnostics.
    pub name: &'static str,
    /// Fields in wire order.
    pub fields: &'static [Field],
}

impl Layout {
    /// Total record size in bytes.
    pub const fn size(&self) -> usize {
        let mut size = 0;
        let mut i = 0;
        while i < self.fields.len() {
            size += self.fields[i].width;
            i += 1;
        }
        size
    }

    /// Byte offset of the named field, if present.
    #[cfg(test)]
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for field in self.fields {
            if field.name == name {
                return Some(offset);
            }
            offset += field.width;
        }
        None
    }

    /// Width of the named field, if present.
    #[cfg(test)]
    pub fn width_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.width)
    }
}

const fn field(name: &'static str, width: usize) -> Field {
    Field { name, width }
}

/// Request header: operation code and event count.
pub const REQUEST_HEADER: Layout = Layout {
    name: "request_header",
    fields: &[field("operation", 1), field("count", 4)],
};

/// Response envelope preceding the result records.
pub const RESPONSE_HEADER: Layout = Layout {
    name: "response_header",
    fields: &[field("count", 4)],
};

/// Account record, used for create input and lookup output.
pub const ACCOUNT: Layout = Layout {
    name: "account",
    fields: &[
        field("id", 16),
        field("debits_pending", 16),
        field("debits_posted", 16),
        field("credits_pending", 16),
        field("credits_posted", 16),
        field("user_data_128", 16),
        field("user_data_64", 8),
        field("user_data_32", 4),
        field("reserved", 4),
        field("ledger", 4),
        field("code", 2),
        field("flags", 2),
        field("timestamp", 8),
    ],
};

/// Transfer record, used for create input and lookup output.
pub const TRANSFER: Layout = Layout {
    name: "transfer",
    fields: &[
        field("id", 16),
        field("debit_account_id", 16),
        field("credit_account_id", 16),
        // Two u64 words, low word first.
        field("amount", 16),
        field("pending_id", 16),
        field("user_data_128", 16),
        field("user_data_64", 8),
        field("user_data_32", 4),
        field("timeout", 4),
        field("ledger", 4),
        field("code", 2),
        field("flags", 2),
        field("timestamp", 8),
    ],
};

/// Identifier record, used for account and transfer lookups.
pub const ID: Layout = Layout {
    name: "id",
    fields: &[field("id", 16)],
};

/// Outcome of one failed create event.
pub const CREATE_RESULT: Layout = Layout {
    name: "create_result",
    fields: &[field("index", 4), field("result", 4)],
};

const _: () = assert!(REQUEST_HEADER.size() == 5);
const _: () = assert!(RESPONSE_HEADER.size() == 4);
const _: () = assert!(ACCOUNT.size() == 128);
const _: () = assert!(TRANSFER.size() == 128);
const _: () = assert!(ID.size() == 16);
const _: () = assert!(CREATE_RESULT.size() == 8);

// The driver forwards records field by field into the client's types, so the
// client's in-memory records must agree with the wire sizes.
const _: () = assert!(std::mem::size_of::<tb_rs::Account>() == ACCOUNT.size());
const _: () = assert!(std::mem::size_of::<tb_rs::Transfer>() == TRANSFER.size());
