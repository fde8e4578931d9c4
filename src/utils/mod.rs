//! Utility functions and helpers
//!
//! Key handling, encodings and the canonical serializer used for hashing.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest,
};

pub use serialization::{deserialize, serialize};
