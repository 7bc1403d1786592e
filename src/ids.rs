//! Identifier generation and padding helpers.

use std::collections::HashSet;

use rand::RngCore;

/// Generate a random 256-bit identifier as a 64-char lowercase hex string.
///
/// Draws from the thread-local CSPRNG; used both for padding identifiers
/// and for cascade salts.
pub fn random_256_bit_hex() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Grow `set` to `target` members with fresh random identifiers.
///
/// Every inserted identifier is absent from both `set` and `disjoint_from`,
/// so the padded set stays disjoint from its counterpart.
pub(crate) fn pad_with_unique_ids(
    set: &mut HashSet<String>,
    disjoint_from: &HashSet<String>,
    target: usize,
) {
    while set.len() < target {
        let id = random_256_bit_hex();
        if disjoint_from.contains(&id) {
            continue;
        }
        set.insert(id);
    }
}
