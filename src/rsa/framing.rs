// Block Framing
// Length-prefixed plaintext blocks: [1-byte length][payload]

use crate::error::{Error, Result};

/// Framed block structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedBlock {
    pub data: Vec<u8>,
    pub expected_size: usize,
}

/// Largest payload a block of `key_bytes` can carry.
///
/// One byte goes to the length prefix and one more keeps the framed value
/// below the modulus. The prefix is a single byte, so the payload is also
/// capped at 255.
pub fn max_payload(key_bytes: usize) -> usize {
    key_bytes.saturating_sub(2).min(usize::from(u8::MAX))
}

/// Frame a payload for a key of `key_bytes` bytes
/// Format: len || payload, read as a little-endian integer (len is byte 0)
pub fn frame_block(payload: &[u8], key_bytes: usize) -> Result<FramedBlock> {
    let max = max_payload(key_bytes);
    if payload.len() > max {
        return Err(Error::MessageTooLarge {
            len: payload.len(),
            max,
        });
    }

    let mut data = Vec::with_capacity(payload.len() + 1);
    data.push(payload.len() as u8);
    data.extend_from_slice(payload);

    Ok(FramedBlock {
        data,
        expected_size: key_bytes,
    })
}

/// Recover the payload from a decrypted block.
///
/// `block.data` holds the decrypted integer's bytes, least significant
/// first; byte 0 is the payload length.
pub fn unframe_block(block: FramedBlock) -> Result<Vec<u8>> {
    let data = block.data;

    let Some(&len) = data.first() else {
        return Err(Error::MalformedBlock("empty block".to_string()));
    };
    let len = usize::from(len);

    let max = max_payload(block.expected_size);
    if len > max {
        return Err(Error::MalformedBlock(format!(
            "length prefix {} exceeds the block payload limit {}",
            len, max
        )));
    }
    if len + 1 > data.len() {
        return Err(Error::MalformedBlock(format!(
            "length prefix {} runs past the {}-byte block",
            len,
            data.len()
        )));
    }

    Ok(data[1..=len].to_vec())
}
