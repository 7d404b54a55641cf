//! Utility functions and helpers
//!
//! Hashing and encoding primitives used for transaction ids and addresses,
//! plus the bincode helpers the durable store is built on.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, checksum, current_timestamp, hash160, sha256_digest,
};

pub use serialization::{deserialize, serialize};
