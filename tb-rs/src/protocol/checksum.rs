//! TigerBeetle checksum implementation using Aegis128L.
//!
//! TigerBeetle uses Aegis128L AEAD with a zero key/nonce for fast, hardware-accelerated
//! checksumming. The authentication tag serves as the checksum, providing strong
//! integrity guarantees while being extremely fast on modern CPUs with AES-NI support.

use aegis::aegis128l::Aegis128L;

/// Zero key used for checksum (TigerBeetle convention).
const ZERO_KEY: [u8; 16] = [0u8; 16];

/// Zero nonce used for checksum (TigerBeetle convention).
const ZERO_NONCE: [u8; 16] = [0u8; 16];

/// Compute the TigerBeetle checksum for the given data.
///
/// This uses Aegis128L AEAD with a zero key and nonce, computing the
/// authentication tag which serves as a fast, hardware-accelerated checksum.
/// The data to checksum is passed as Associated Data (AD), with an empty message.
/// This matches TigerBeetle's MAC mode usage: "in mac mode, message to sign is
/// treated as AD, not as a secret message."
pub fn checksum(data: &[u8]) -> u128 {
    let cipher = Aegis128L::<16>::new(&ZERO_KEY, &ZERO_NONCE);
    // Data is passed as Associated Data (AD), not as message
    let (_, tag) = cipher.encrypt(&[], data);
    u128::from_le_bytes(tag)
}
