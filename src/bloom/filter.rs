//! Generic Bloom filter data structure.

use std::fmt;

use sha2::{Digest, Sha256};

use super::{BloomError, DIGEST_WINDOW_MOD};

/// A Bloom filter for probabilistic set membership.
///
/// Used as one layer of a filter cascade. Bit positions are derived
/// from a single SHA-256 digest of the input: position i is the
/// big-endian u32 read at digest offset `(i * 4) mod 29`, reduced
/// mod the filter size.
#[derive(Clone)]
pub struct BloomFilter {
    /// Bit array storage (packed as 32-bit words, LSB first).
    words: Vec<u32>,
    /// Number of logical bits in the filter.
    num_bits: u32,
    /// Number of hash positions per element.
    hash_count: u8,
}

impl BloomFilter {
    /// Create an empty Bloom filter with the given size and hash count.
    pub fn with_params(num_bits: u32, hash_count: u8) -> Result<Self, BloomError> {
        if num_bits == 0 {
            return Err(BloomError::ZeroSize);
        }
        if hash_count == 0 {
            return Err(BloomError::ZeroHashCount);
        }

        let num_words = num_bits.div_ceil(32) as usize;
        Ok(Self {
            words: vec![0u32; num_words],
            num_bits,
            hash_count,
        })
    }

    /// Restore a filter from its raw word array.
    ///
    /// The word count must match `ceil(num_bits / 32)` exactly.
    pub fn from_words(num_bits: u32, words: Vec<u32>, hash_count: u8) -> Result<Self, BloomError> {
        if num_bits == 0 {
            return Err(BloomError::ZeroSize);
        }
        if hash_count == 0 {
            return Err(BloomError::ZeroHashCount);
        }

        let expected = num_bits.div_ceil(32) as usize;
        if words.len() != expected {
            return Err(BloomError::WordCountMismatch {
                num_bits,
                expected,
                got: words.len(),
            });
        }

        Ok(Self {
            words,
            num_bits,
            hash_count,
        })
    }

    /// Insert raw bytes into the filter.
    pub fn insert(&mut self, data: &[u8]) {
        let digest = Sha256::digest(data);
        for i in 0..self.hash_count {
            let bit_index = self.position(&digest, i);
            self.set_bit(bit_index);
        }
    }

    /// Check if the filter might contain raw bytes.
    ///
    /// Returns `true` if the item might be in the set (possible false
    /// positive). Returns `false` if the item is definitely not in the set.
    pub fn contains(&self, data: &[u8]) -> bool {
        let digest = Sha256::digest(data);
        for i in 0..self.hash_count {
            let bit_index = self.position(&digest, i);
            if !self.get_bit(bit_index) {
                return false;
            }
        }
        true
    }

    /// Count the number of set bits (population count).
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Estimate the fill ratio (set bits / total bits).
    pub fn fill_ratio(&self) -> f64 {
        self.count_ones() as f64 / self.num_bits as f64
    }

    /// Check if the filter is empty.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Get the raw word array.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Get the filter size in bits.
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// Get the filter size in words.
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Get the number of hash positions per element.
    pub fn hash_count(&self) -> u8 {
        self.hash_count
    }

    /// Compute the i-th bit position from a SHA-256 digest.
    ///
    /// Reads a big-endian u32 window at offset `(i * 4) mod 29`; windows
    /// overlap for i >= 7 (see [`DIGEST_WINDOW_MOD`]).
    fn position(&self, digest: &[u8], i: u8) -> u32 {
        let offset = (i as usize * 4) % DIGEST_WINDOW_MOD;
        let window = u32::from_be_bytes(digest[offset..offset + 4].try_into().unwrap());
        window % self.num_bits
    }

    fn set_bit(&mut self, index: u32) {
        let word_index = (index / 32) as usize;
        let bit_offset = index % 32;
        self.words[word_index] |= 1 << bit_offset;
    }

    fn get_bit(&self, index: u32) -> bool {
        let word_index = (index / 32) as usize;
        let bit_offset = index % 32;
        (self.words[word_index] >> bit_offset) & 1 == 1
    }
}

impl PartialEq for BloomFilter {
    fn eq(&self, other: &Self) -> bool {
        self.num_bits == other.num_bits
            && self.hash_count == other.hash_count
            && self.words == other.words
    }
}

impl Eq for BloomFilter {}

impl fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bits", &self.num_bits)
            .field("hash_count", &self.hash_count)
            .field("fill_ratio", &format!("{:.2}%", self.fill_ratio() * 100.0))
            .finish()
    }
}
