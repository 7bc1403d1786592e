//! Cascade Wire Format
//!
//! Serializes a cascade to `"0x"` followed by the lowercase hex encoding
//! of a fixed byte layout:
//!
//! ```text
//! [salt:32][layer 0][layer 1]...[layer n-1]
//! ```
//!
//! Each layer:
//!
//! ```text
//! [num_bits:4 BE][word:4 LE] * ceil(num_bits / 32)
//! ```
//!
//! The layer size is big-endian while the filter words are little-endian;
//! writer and reader must agree on both or queries diverge silently.
//! An all-zero tail after the last layer is tolerated: a zero `num_bits`
//! terminates parsing without producing a layer, which accommodates
//! zero-padded transport envelopes.

use super::{Cascade, CascadeError};
use crate::bloom::BloomFilter;

/// Prefix of every serialized cascade.
pub const HEX_PREFIX: &str = "0x";

/// Size of the salt on the wire.
pub const SALT_SIZE: usize = 32;

/// Size of a layer header (num_bits as big-endian u32).
pub const LAYER_HEADER_SIZE: usize = 4;

impl Cascade {
    /// Serialize to the `0x`-prefixed hex wire format.
    pub fn to_hex(&self) -> String {
        let body_len: usize = self
            .layers
            .iter()
            .map(|l| LAYER_HEADER_SIZE + l.num_words() * 4)
            .sum();
        let mut bytes = Vec::with_capacity(SALT_SIZE + body_len);

        bytes.extend_from_slice(&hex::decode(&self.salt).expect("salt is valid hex"));
        for layer in &self.layers {
            bytes.extend_from_slice(&layer.num_bits().to_be_bytes());
            for word in layer.words() {
                bytes.extend_from_slice(&word.to_le_bytes());
            }
        }

        format!("{}{}", HEX_PREFIX, hex::encode(bytes))
    }

    /// Reconstruct a cascade from its hex wire format.
    ///
    /// Accepts exactly the output of [`Cascade::to_hex`], optionally
    /// followed by zero padding.
    pub fn from_hex(serialized: &str) -> Result<Self, CascadeError> {
        let payload = serialized
            .strip_prefix(HEX_PREFIX)
            .ok_or(CascadeError::MissingPrefix)?;
        let bytes = hex::decode(payload)?;

        if bytes.len() < SALT_SIZE {
            return Err(CascadeError::TruncatedSalt(bytes.len()));
        }
        let salt = hex::encode(&bytes[..SALT_SIZE]);

        let mut layers = Vec::new();
        let mut offset = SALT_SIZE;
        while offset < bytes.len() {
            let remaining = &bytes[offset..];
            let level = layers.len() + 1;

            if remaining.len() < LAYER_HEADER_SIZE {
                if remaining.iter().all(|&b| b == 0) {
                    break;
                }
                return Err(CascadeError::TruncatedLayer {
                    level,
                    needed: LAYER_HEADER_SIZE,
                    available: remaining.len(),
                });
            }

            let num_bits = u32::from_be_bytes(remaining[..4].try_into().unwrap());
            if num_bits == 0 {
                break;
            }

            let num_words = num_bits.div_ceil(32) as usize;
            let body_len = num_words * 4;
            let body = &remaining[LAYER_HEADER_SIZE..];
            if body.len() < body_len {
                return Err(CascadeError::TruncatedLayer {
                    level,
                    needed: body_len,
                    available: body.len(),
                });
            }

            let words = body[..body_len]
                .chunks_exact(4)
                .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
                .collect();
            layers.push(BloomFilter::from_words(num_bits, words, 1)?);

            offset += LAYER_HEADER_SIZE + body_len;
        }

        Ok(Self { layers, salt })
    }
}
