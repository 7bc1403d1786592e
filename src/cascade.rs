//! Padded Bloom Filter Cascade
//!
//! An ordered sequence of single-hash Bloom filters encoding a partition
//! of identifiers into a valid set and a revoked set. Layer 1 holds the
//! valid set; every identifier of the revoked set that layer 1 falsely
//! reports present is inserted into layer 2, and so on with the roles
//! swapped at each level until no false positives remain. A query walks
//! the layers and decides by the parity of the first level that reports
//! the identifier absent.
//!
//! Both input sets are padded with random identifiers to fixed sizes
//! (r_hat valid, 2 * r_hat revoked) before the salt is drawn and any
//! layer is built, so the published cascade does not leak the true set
//! sizes.
//!
//! ## Level keys
//!
//! Every hashed input at 1-based level L is the ASCII concatenation
//!
//! ```text
//! id || binary8(L) || salt_hex
//! ```
//!
//! where `binary8(L)` is the base-2 representation of L left-padded with
//! '0' to eight characters, and `salt_hex` is the 64-char hex rendering
//! of the 32-byte salt. The concatenation is a byte-string contract:
//! changing it breaks compatibility with every published cascade.

mod wire;

use std::collections::HashSet;
use std::f64::consts::{FRAC_1_SQRT_2, LN_2};
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::bloom::{BloomError, BloomFilter};
use crate::ids::{pad_with_unique_ids, random_256_bit_hex};

/// Target false-positive rate for the first layer (`sqrt(0.5) / 2`).
pub const FIRST_LAYER_FP_RATE: f64 = FRAC_1_SQRT_2 / 2.0;

/// Target false-positive rate for every layer after the first.
pub const DEEPER_LAYER_FP_RATE: f64 = 0.5;

/// Construction fails if a cascade exceeds this depth.
///
/// Each layer shrinks the carried set by its target rate, so the
/// expected depth is logarithmic in the padded set size; reaching the
/// cap means the false-positive elimination is not converging.
pub const MAX_DEPTH: usize = 64;

/// Errors related to cascade construction and deserialization.
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error(
        "set sizes exceed padding target {r_hat}: valid={valid} (max {r_hat}), revoked={revoked} (max {})",
        .r_hat * 2
    )]
    CapacityExceeded {
        valid: usize,
        revoked: usize,
        r_hat: usize,
    },

    #[error("cascade did not converge within {0} layers")]
    TooManyLayers(usize),

    #[error("serialized cascade missing 0x prefix")]
    MissingPrefix,

    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("input too short for 32-byte salt: got {0} bytes")]
    TruncatedSalt(usize),

    #[error("layer {level} needs {needed} more bytes, only {available} remain")]
    TruncatedLayer {
        level: usize,
        needed: usize,
        available: usize,
    },

    #[error(transparent)]
    Bloom(#[from] BloomError),
}

/// An immutable padded Bloom filter cascade.
///
/// Built once from a valid/revoked partition, then queried and
/// serialized. Answers are exact for every identifier supplied at
/// construction time (padding included); for anything else the answer
/// is an arbitrary function of the salt and must not be relied on.
#[derive(Clone, PartialEq, Eq)]
pub struct Cascade {
    /// Filter layers, outermost first. Empty iff the padded valid set
    /// was empty.
    layers: Vec<BloomFilter>,
    /// 64-char lowercase hex rendering of the 32-byte salt.
    salt: String,
}

impl Cascade {
    /// Build a cascade from disjoint valid and revoked identifier sets.
    ///
    /// Pads the valid set to `r_hat` members and the revoked set to
    /// `2 * r_hat` with fresh random identifiers, draws a salt, and runs
    /// layered false-positive elimination until every padded valid
    /// identifier is accepted and every padded revoked one rejected.
    ///
    /// Fails with [`CascadeError::CapacityExceeded`] if either input set
    /// is already larger than its padding target.
    pub fn from_sets(
        valid: &HashSet<String>,
        revoked: &HashSet<String>,
        r_hat: usize,
    ) -> Result<Self, CascadeError> {
        if valid.len() > r_hat || revoked.len() > 2 * r_hat {
            return Err(CascadeError::CapacityExceeded {
                valid: valid.len(),
                revoked: revoked.len(),
                r_hat,
            });
        }

        // Padding must happen before the salt is drawn and before any
        // layer is sized, or the output would leak the true set sizes.
        let mut padded_valid = valid.clone();
        let mut padded_revoked = revoked.clone();
        pad_with_unique_ids(&mut padded_valid, &padded_revoked, r_hat);
        pad_with_unique_ids(&mut padded_revoked, &padded_valid, 2 * r_hat);

        let salt = random_256_bit_hex();

        Self::build(padded_valid, padded_revoked, salt)
    }

    /// Run layered construction over already padded sets with a fixed salt.
    ///
    /// The result is fully determined by the inputs: same sets and salt
    /// reproduce identical layers.
    pub(crate) fn build(
        valid: HashSet<String>,
        revoked: HashSet<String>,
        salt: String,
    ) -> Result<Self, CascadeError> {
        let mut included = valid;
        let mut excluded = revoked;
        let mut layers = Vec::new();

        while !included.is_empty() {
            let level = layers.len() + 1;
            if level > MAX_DEPTH {
                return Err(CascadeError::TooManyLayers(MAX_DEPTH));
            }

            let rate = if level == 1 {
                FIRST_LAYER_FP_RATE
            } else {
                DEEPER_LAYER_FP_RATE
            };
            let num_bits = optimal_num_bits(included.len(), rate);
            let mut filter = BloomFilter::with_params(num_bits, 1)?;

            for id in &included {
                filter.insert(level_key(id, level, &salt).as_bytes());
            }

            let false_positives: HashSet<String> = excluded
                .iter()
                .filter(|id| filter.contains(level_key(id, level, &salt).as_bytes()))
                .cloned()
                .collect();

            debug!(
                "layer {}: {} members, {} bits, {} false positives",
                level,
                included.len(),
                num_bits,
                false_positives.len()
            );

            layers.push(filter);
            excluded = std::mem::replace(&mut included, false_positives);
        }

        Ok(Self { layers, salt })
    }

    /// Query membership of an identifier.
    ///
    /// The first layer that reports the identifier absent decides by the
    /// parity of its level: an odd-level miss means valid, an even-level
    /// miss means revoked. If every layer reports present, the parity of
    /// the final level decides.
    pub fn has(&self, id: &str) -> bool {
        for (index, layer) in self.layers.iter().enumerate() {
            let level = index + 1;
            if !layer.contains(level_key(id, level, &self.salt).as_bytes()) {
                return level % 2 == 0;
            }
        }
        self.layers.len() % 2 == 1
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Read-only view of the filter layers, outermost first.
    pub fn layers(&self) -> &[BloomFilter] {
        &self.layers
    }

    /// The salt as a 64-char lowercase hex string.
    pub fn salt(&self) -> &str {
        &self.salt
    }
}

impl fmt::Debug for Cascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_bits: u64 = self.layers.iter().map(|l| l.num_bits() as u64).sum();
        f.debug_struct("Cascade")
            .field("depth", &self.layers.len())
            .field("total_bits", &total_bits)
            .finish()
    }
}

/// Optimal size in bits for a single-hash filter holding `count`
/// members at target false-positive rate `rate`.
fn optimal_num_bits(count: usize, rate: f64) -> u32 {
    (-(count as f64) * rate.ln() / (LN_2 * LN_2)).ceil() as u32
}

/// Key an identifier with its 1-based level and the cascade salt.
///
/// The level renders as eight ASCII '0'/'1' characters; levels of 256
/// and above render at their natural width, matching the serialized
/// artifacts already in circulation.
fn level_key(id: &str, level: usize, salt: &str) -> String {
    format!("{}{:08b}{}", id, level, salt)
}

#[cfg(test)]
mod tests;
