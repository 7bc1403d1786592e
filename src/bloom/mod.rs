//! Single-Hash Bloom Filter
//!
//! Bloom filters used as cascade layers. Each layer is sized from its
//! member count at construction time and probed with exactly one hash
//! position derived from a SHA-256 digest, so a layer at target rate p
//! needs `-n * ln(p) / (ln 2)^2` bits.
//!
//! Storage is a dense array of 32-bit words. The word array is exposed
//! raw because the cascade wire format carries it verbatim (one
//! little-endian word at a time).

mod filter;

use thiserror::Error;

pub use filter::BloomFilter;

/// Offsets into the SHA-256 digest wrap at this modulus when deriving
/// the i-th hash position.
///
/// Wrapping at 29 rather than 28 makes the 4-byte windows overlap for
/// i >= 7. Kept for compatibility with existing serialized cascades;
/// with a single hash function only offset 0 is ever used.
pub const DIGEST_WINDOW_MOD: usize = 29;

/// Errors related to Bloom filter operations.
#[derive(Debug, Error)]
pub enum BloomError {
    #[error("filter must have at least one bit")]
    ZeroSize,

    #[error("hash count must be positive")]
    ZeroHashCount,

    #[error("word count mismatch: {num_bits} bits need {expected} words, got {got}")]
    WordCountMismatch {
        num_bits: u32,
        expected: usize,
        got: usize,
    },
}
