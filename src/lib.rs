//! Padded Bloom filter cascade for credential revocation.
//!
//! A cascade is an ordered sequence of single-hash Bloom filters that
//! encodes a partition of 256-bit identifiers into a *valid* set and a
//! *revoked* set with zero error on the identifiers it was built from.
//! An issuer pads both sets to fixed sizes, builds the cascade, and
//! publishes its hex serialization; a verifier reconstructs the cascade
//! and asks [`Cascade::has`] for a single identifier.
//!
//! Padding both sets to fixed targets before construction keeps the
//! published artifact from leaking how many credentials are valid or
//! revoked.

pub mod bloom;
pub mod cascade;
pub mod ids;

pub use bloom::{BloomError, BloomFilter};
pub use cascade::{Cascade, CascadeError};
pub use ids::random_256_bit_hex;
