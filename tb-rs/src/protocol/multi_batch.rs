//! Multi-batch encoding for TigerBeetle operations.
//!
//! Multi-batching allows submitting multiple independent batches of work within
//! a single VSR message. This module handles encoding the batches with the
//! required trailer format.
//!
//! Trailer format (written from end of buffer toward beginning):
//! - Postamble (u16): batch_count
//! - TrailerItems (u16 each): element_count for each batch (in reverse order)
//! - Padding (0xFF bytes): to align to element_size

/// Calculate the trailer size for multi-batch encoding.
///
/// The trailer is aligned to the element_size.
pub fn trailer_total_size(element_size: u32, batch_count: u16) -> u32 {
    assert!(batch_count > 0);

    // Unpadded size: batch_count * 2 (TrailerItems) + 2 (Postamble)
    let trailer_unpadded_size = (batch_count as u32 * 2) + 2;

    if element_size == 0 {
        return trailer_unpadded_size;
    }

    // Round up to multiple of element_size
    trailer_unpadded_size.div_ceil(element_size) * element_size
}

/// Encode events with multi-batch format.
///
/// Returns the total encoded size (payload + trailer).
pub fn encode(buffer: &mut [u8], events: &[u8], element_size: u32) -> u32 {
    let events_len = events.len() as u32;
    let element_count = if element_size == 0 {
        0
    } else {
        (events_len / element_size) as u16
    };
    let batch_count: u16 = 1;

    let trailer_size = trailer_total_size(element_size, batch_count);
    let total_size = events_len + trailer_size;

    assert!((buffer.len() as u32) >= total_size);

    // Copy payload
    buffer[..events_len as usize].copy_from_slice(events);

    // Fill trailer with padding (0xFF)
    for byte in &mut buffer[events_len as usize..total_size as usize] {
        *byte = 0xFF;
    }

    // Write postamble (batch_count) at the very end
    let postamble_offset = (total_size - 2) as usize;
    buffer[postamble_offset..postamble_offset + 2].copy_from_slice(&batch_count.to_le_bytes());

    // Write TrailerItem (element_count) just before postamble
    let trailer_item_offset = postamble_offset - 2;
    buffer[trailer_item_offset..trailer_item_offset + 2]
        .copy_from_slice(&element_count.to_le_bytes());

    total_size
}

/// Decode a multi-batch message and return only the payload.
///
/// Returns the payload slice (excluding the trailer).
/// Returns an empty slice if the message is malformed.
pub fn decode(data: &[u8], element_size: u32) -> &[u8] {
    let data_len = data.len() as u32;
    if data_len < 2 {
        return &[];
    }

    // Read batch_count from last 2 bytes
    let batch_count =
        u16::from_le_bytes([data[(data_len - 2) as usize], data[(data_len - 1) as usize]]);
    if batch_count == 0 {
        return &[];
    }

    // Calculate trailer size
    let trailer_size = trailer_total_size(element_size, batch_count);
    if data_len < trailer_size {
        return &[];
    }

    // Return payload (everything before trailer)
    &data[..(data_len - trailer_size) as usize]
}
